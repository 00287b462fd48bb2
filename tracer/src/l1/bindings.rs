#![allow(clippy::too_many_arguments)]

use alloy::sol;

sol!(
    #[derive(Debug)]
    contract Rollup {
        struct GlobalState {
            bytes32[2] bytes32Vals;
            uint64[2] u64Vals;
        }

        enum MachineStatus {
            RUNNING,
            FINISHED,
            ERRORED,
            TOO_FAR
        }

        struct ExecutionState {
            GlobalState globalState;
            MachineStatus machineStatus;
        }

        struct Assertion {
            ExecutionState beforeState;
            ExecutionState afterState;
            uint64 numBlocks;
        }

        struct Node {
            bytes32 stateHash;
            bytes32 challengeHash;
            bytes32 confirmData;
            uint64 prevNum;
            uint64 deadlineBlock;
            uint64 noChildConfirmedBeforeBlock;
            uint64 stakerCount;
            uint64 childStakerCount;
            uint64 firstChildBlock;
            uint64 latestChildNumber;
            uint64 createdAtBlock;
            bytes32 nodeHash;
        }

        event NodeCreated(
            uint64 indexed nodeNum,
            bytes32 indexed parentNodeHash,
            bytes32 indexed nodeHash,
            bytes32 executionHash,
            Assertion assertion,
            bytes32 afterInboxBatchAcc,
            bytes32 wasmModuleRoot,
            uint256 inboxMaxCount
        );

        event NodeConfirmed(uint64 indexed nodeNum, bytes32 blockHash, bytes32 sendRoot);

        function latestConfirmed() external view returns (uint64);

        function latestNodeCreated() external view returns (uint64);

        function getNode(uint64 nodeNum) external view returns (Node memory);
    }
);

sol!(
    #[derive(Debug)]
    contract Outbox {
        event OutBoxTransactionExecuted(
            address indexed to,
            address indexed l2Sender,
            uint256 indexed zero,
            uint256 transactionIndex
        );

        function isSpent(uint256 index) external view returns (bool);
    }
);

sol!(
    #[derive(Debug)]
    contract Bridge {
        event MessageDelivered(
            uint256 indexed messageIndex,
            bytes32 indexed beforeInboxAcc,
            address inbox,
            uint8 kind,
            address sender,
            bytes32 messageDataHash,
            uint256 baseFeeL1,
            uint64 timestamp
        );
    }
);

sol!(
    #[derive(Debug)]
    contract Inbox {
        event InboxMessageDelivered(uint256 indexed messageNum, bytes data);
    }
);

sol!(
    #[derive(Debug)]
    contract SequencerInbox {
        struct TimeBounds {
            uint64 minTimestamp;
            uint64 maxTimestamp;
            uint64 minBlockNumber;
            uint64 maxBlockNumber;
        }

        enum BatchDataLocation {
            TxInput,
            SeparateBatchEvent,
            NoData,
            Blob
        }

        event SequencerBatchDelivered(
            uint256 indexed batchSequenceNumber,
            bytes32 indexed beforeAcc,
            bytes32 indexed afterAcc,
            bytes32 delayedAcc,
            uint256 afterDelayedMessagesRead,
            TimeBounds timeBounds,
            BatchDataLocation dataLocation
        );
    }
);
