use alloy::sol;

sol!(
    #[derive(Debug)]
    contract ArbSys {
        event L2ToL1Tx(
            address caller,
            address indexed destination,
            uint256 indexed hash,
            uint256 indexed position,
            uint256 arbBlockNum,
            uint256 ethBlockNum,
            uint256 timestamp,
            uint256 callvalue,
            bytes data
        );

        event SendMerkleUpdate(uint256 indexed reserved, bytes32 indexed hash, uint256 indexed position);
    }
);

sol!(
    #[derive(Debug)]
    contract ArbRetryableTx {
        event TicketCreated(bytes32 indexed ticketId);

        event RedeemScheduled(
            bytes32 indexed ticketId,
            bytes32 indexed retryTxHash,
            uint64 indexed sequenceNum,
            uint64 donatedGas,
            address gasDonor,
            uint256 maxRefund,
            uint256 submissionFeeRefund
        );
    }
);

sol!(
    #[derive(Debug)]
    contract NodeInterface {
        function findBatchContainingBlock(uint64 blockNum) external view returns (uint64 batch);

        function getL1Confirmations(bytes32 blockHash) external view returns (uint64 confirmations);
    }
);
