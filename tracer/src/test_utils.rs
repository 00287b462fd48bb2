use crate::{
    l1::bindings::{Bridge, Inbox, Rollup, SequencerInbox},
    l2::{
        ARB_RETRYABLE_TX_ADDRESS, NODE_INTERFACE_ADDRESS,
        bindings::{ArbRetryableTx, NodeInterface},
    },
    utils::config::{ContractAddresses, TracerConfig},
};
use alloy::{
    primitives::{Address, B256, Bytes, LogData, U256},
    rpc::types::Log,
    sol_types::{SolCall, SolEvent},
};
use anyhow::Error;
use common::chain::{BlockRef, ChainDataPort, EventCriteria, TxReceipt};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

/// In-memory chain: blocks, receipts, logs and canned `eth_call` answers.
/// Records every `eth_getLogs` range it serves.
pub struct MockChain {
    chain_id: u64,
    head: u64,
    blocks: Vec<Value>,
    receipts: HashMap<B256, TxReceipt>,
    logs: Vec<Log>,
    calls: HashMap<(Address, Bytes), Bytes>,
    log_queries: Mutex<Vec<(u64, u64)>>,
    transport_down: AtomicBool,
}

impl MockChain {
    pub fn new(chain_id: u64, head: u64) -> Self {
        Self {
            chain_id,
            head,
            blocks: Vec::new(),
            receipts: HashMap::new(),
            logs: Vec::new(),
            calls: HashMap::new(),
            log_queries: Mutex::new(Vec::new()),
            transport_down: AtomicBool::new(false),
        }
    }

    pub fn with_block(mut self, block: Value) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn with_simple_block(self, number: u64, timestamp: u64) -> Self {
        self.with_block(block_json(number, timestamp, json!({})))
    }

    pub fn with_receipt(mut self, receipt: TxReceipt) -> Self {
        self.receipts.insert(receipt.transaction_hash, receipt);
        self
    }

    pub fn with_log(mut self, log: Log) -> Self {
        self.logs.push(log);
        self
    }

    pub fn with_call(mut self, to: Address, calldata: Vec<u8>, output: Vec<u8>) -> Self {
        self.calls.insert((to, calldata.into()), output.into());
        self
    }

    pub fn set_transport_down(&self) {
        self.transport_down.store(true, Ordering::SeqCst);
    }

    pub fn log_queries(&self) -> Vec<(u64, u64)> {
        self.log_queries.lock().unwrap().clone()
    }

    fn check_transport(&self) -> Result<(), Error> {
        if self.transport_down.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("[chain_id: {}] connection refused", self.chain_id));
        }
        Ok(())
    }
}

impl ChainDataPort for MockChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn get_block_number(&self) -> Result<u64, Error> {
        self.check_transport()?;
        Ok(self.head)
    }

    async fn get_raw_block(&self, block: BlockRef) -> Result<Option<Value>, Error> {
        self.check_transport()?;
        let number = match block {
            BlockRef::Latest => Some(format!("{:#x}", self.head)),
            BlockRef::Number(number) => Some(format!("{number:#x}")),
            BlockRef::Hash(_) => None,
        };
        Ok(self
            .blocks
            .iter()
            .find(|raw| match (block, &number) {
                (BlockRef::Hash(hash), _) => raw["hash"] == json!(hash),
                (_, Some(number)) => raw["number"] == json!(number),
                _ => false,
            })
            .cloned())
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, Error> {
        self.check_transport()?;
        Ok(self.receipts.get(&hash).cloned())
    }

    async fn get_logs(
        &self,
        criteria: &EventCriteria,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>, Error> {
        self.check_transport()?;
        self.log_queries.lock().unwrap().push((from_block, to_block));
        Ok(self
            .logs
            .iter()
            .filter(|log| {
                log.block_number
                    .is_some_and(|n| n >= from_block && n <= to_block)
                    && criteria.matches(log)
            })
            .cloned()
            .collect())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, Error> {
        self.check_transport()?;
        self.calls
            .get(&(to, data))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("execution reverted"))
    }
}

pub fn hash(byte: u8) -> B256 {
    B256::repeat_byte(byte)
}

/// Raw block JSON carrying the rollup extension fields in `extra`.
pub fn block_json(number: u64, timestamp: u64, extra: Value) -> Value {
    let mut block = json!({
        "hash": block_hash(number),
        "parentHash": block_hash(number.saturating_sub(1)),
        "number": format!("{number:#x}"),
        "timestamp": format!("{timestamp:#x}"),
    });
    if let (Some(block), Some(extra)) = (block.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            block.insert(key.clone(), value.clone());
        }
    }
    block
}

pub fn block_hash(number: u64) -> B256 {
    let mut bytes = [0xbbu8; 32];
    bytes[24..].copy_from_slice(&number.to_be_bytes());
    B256::from(bytes)
}

pub fn rpc_log(
    address: Address,
    data: LogData,
    block_number: u64,
    log_index: u64,
    tx_hash: B256,
) -> Log {
    Log {
        inner: alloy::primitives::Log { address, data },
        block_hash: Some(block_hash(block_number)),
        block_number: Some(block_number),
        transaction_hash: Some(tx_hash),
        log_index: Some(log_index),
        ..Default::default()
    }
}

pub fn receipt(
    tx_hash: B256,
    block_number: u64,
    tx_type: u64,
    success: bool,
    logs: Vec<Log>,
) -> TxReceipt {
    TxReceipt {
        transaction_hash: tx_hash,
        block_hash: block_hash(block_number),
        block_number,
        status: Some(u64::from(success)),
        tx_type,
        from: Address::repeat_byte(0x11),
        to: None,
        logs,
    }
}

/// A rollup node whose after state points at L2 block `after_l2_block`.
pub struct NodeFixture {
    pub id: u64,
    pub created_at: u64,
    pub before_l2_block: u64,
    pub after_l2_block: u64,
    pub after_block_hash: B256,
    pub send_root: B256,
    pub creation_tx: B256,
}

/// Confirmation period of the Arbitrum One rollup, in L1 blocks.
pub const CONFIRM_PERIOD_BLOCKS: u64 = 45_818;

impl NodeFixture {
    pub fn new(id: u64, created_at: u64, after_l2_block: u64) -> Self {
        Self {
            id,
            created_at,
            before_l2_block: after_l2_block.saturating_sub(10),
            after_l2_block,
            after_block_hash: block_hash(after_l2_block),
            send_root: B256::repeat_byte(0x5e),
            creation_tx: B256::from(U256::from(0xc0de_0000 + id)),
        }
    }

    fn global_state(block_hash: B256, inbox_position: u64, send_root: B256) -> Rollup::GlobalState {
        Rollup::GlobalState {
            bytes32Vals: [block_hash, send_root],
            u64Vals: [inbox_position, 0],
        }
    }

    fn execution_state(block_hash: B256, inbox_position: u64, send_root: B256) -> Rollup::ExecutionState {
        Rollup::ExecutionState {
            globalState: Self::global_state(block_hash, inbox_position, send_root),
            machineStatus: Rollup::MachineStatus::FINISHED,
        }
    }

    pub fn stored(&self) -> Rollup::Node {
        let after = Self::global_state(self.after_block_hash, self.after_l2_block, self.send_root);
        let confirm_data = crate::rollup::GlobalState::from(&after).confirm_data();
        Rollup::Node {
            stateHash: B256::repeat_byte(0x01),
            challengeHash: B256::repeat_byte(0x02),
            confirmData: confirm_data,
            prevNum: self.id.saturating_sub(1),
            deadlineBlock: self.created_at + CONFIRM_PERIOD_BLOCKS,
            noChildConfirmedBeforeBlock: 0,
            stakerCount: 1,
            childStakerCount: 0,
            firstChildBlock: 0,
            latestChildNumber: 0,
            createdAtBlock: self.created_at,
            nodeHash: B256::from(U256::from(0xa000 + self.id)),
        }
    }

    pub fn created_event(&self) -> Rollup::NodeCreated {
        Rollup::NodeCreated {
            nodeNum: self.id,
            parentNodeHash: B256::repeat_byte(0x03),
            nodeHash: B256::from(U256::from(0xa000 + self.id)),
            executionHash: B256::repeat_byte(0x04),
            assertion: Rollup::Assertion {
                beforeState: Self::execution_state(
                    block_hash(self.before_l2_block),
                    self.before_l2_block,
                    B256::repeat_byte(0x5d),
                ),
                afterState: Self::execution_state(
                    self.after_block_hash,
                    self.after_l2_block,
                    self.send_root,
                ),
                numBlocks: self.after_l2_block - self.before_l2_block,
            },
            afterInboxBatchAcc: B256::repeat_byte(0x05),
            wasmModuleRoot: B256::repeat_byte(0x06),
            inboxMaxCount: U256::from(self.after_l2_block),
        }
    }
}

pub fn zeroed_node() -> Rollup::Node {
    Rollup::Node {
        stateHash: B256::ZERO,
        challengeHash: B256::ZERO,
        confirmData: B256::ZERO,
        prevNum: 0,
        deadlineBlock: 0,
        noChildConfirmedBeforeBlock: 0,
        stakerCount: 0,
        childStakerCount: 0,
        firstChildBlock: 0,
        latestChildNumber: 0,
        createdAtBlock: 0,
        nodeHash: B256::ZERO,
    }
}

/// Registers the stored node behind `getNode` and its `NodeCreated` log.
pub fn with_node(chain: MockChain, config: &TracerConfig, fixture: &NodeFixture) -> MockChain {
    let rollup = config.contract_addresses.rollup;
    chain
        .with_call(
            rollup,
            Rollup::getNodeCall { nodeNum: fixture.id }.abi_encode(),
            Rollup::getNodeCall::abi_encode_returns(&fixture.stored()),
        )
        .with_log(rpc_log(
            rollup,
            fixture.created_event().encode_log_data(),
            fixture.created_at,
            0,
            fixture.creation_tx,
        ))
}

pub fn with_latest_nodes(
    chain: MockChain,
    config: &TracerConfig,
    confirmed: u64,
    created: u64,
) -> MockChain {
    let rollup = config.contract_addresses.rollup;
    chain
        .with_call(
            rollup,
            Rollup::latestConfirmedCall {}.abi_encode(),
            Rollup::latestConfirmedCall::abi_encode_returns(&confirmed),
        )
        .with_call(
            rollup,
            Rollup::latestNodeCreatedCall {}.abi_encode(),
            Rollup::latestNodeCreatedCall::abi_encode_returns(&created),
        )
}

/// `findBatchContainingBlock(l2_block) == batch` on L2 and the batch's
/// `SequencerBatchDelivered` at `l1_block` on L1.
pub fn with_batch(
    l1: MockChain,
    l2: MockChain,
    config: &TracerConfig,
    l2_block: u64,
    batch: u64,
    l1_block: u64,
) -> (MockChain, MockChain) {
    let delivered = SequencerInbox::SequencerBatchDelivered {
        batchSequenceNumber: U256::from(batch),
        beforeAcc: B256::repeat_byte(0x0a),
        afterAcc: B256::repeat_byte(0x0b),
        delayedAcc: B256::repeat_byte(0x0c),
        afterDelayedMessagesRead: U256::from(batch * 3),
        timeBounds: SequencerInbox::TimeBounds {
            minTimestamp: 0,
            maxTimestamp: u64::MAX,
            minBlockNumber: 0,
            maxBlockNumber: u64::MAX,
        },
        dataLocation: SequencerInbox::BatchDataLocation::TxInput,
    };
    let l1 = l1.with_log(rpc_log(
        config.contract_addresses.sequencer_inbox,
        delivered.encode_log_data(),
        l1_block,
        0,
        B256::from(U256::from(0xba7c_0000 + batch)),
    ));
    let l2 = l2.with_call(
        NODE_INTERFACE_ADDRESS,
        NodeInterface::findBatchContainingBlockCall { blockNum: l2_block }.abi_encode(),
        NodeInterface::findBatchContainingBlockCall::abi_encode_returns(&batch),
    );
    (l1, l2)
}

/// `MessageDelivered` followed by `InboxMessageDelivered`, as one L1 transaction emits them.
pub fn delivery_logs(
    contracts: &ContractAddresses,
    message_number: U256,
    kind: u8,
    sender: Address,
    payload: &[u8],
    l1_block: u64,
    l1_tx: B256,
) -> Vec<Log> {
    let delivered = Bridge::MessageDelivered {
        messageIndex: message_number,
        beforeInboxAcc: B256::repeat_byte(0x1a),
        inbox: contracts.inbox,
        kind,
        sender,
        messageDataHash: alloy::primitives::keccak256(payload),
        baseFeeL1: U256::from(30_000_000_000u64),
        timestamp: 1_700_000_000,
    };
    let inbox = Inbox::InboxMessageDelivered {
        messageNum: message_number,
        data: Bytes::copy_from_slice(payload),
    };
    vec![
        rpc_log(contracts.bridge, delivered.encode_log_data(), l1_block, 0, l1_tx),
        rpc_log(contracts.inbox, inbox.encode_log_data(), l1_block, 1, l1_tx),
    ]
}

/// Registers `logs` both in the receipt of `tx` and in the chain's log index.
pub fn with_tx(
    chain: MockChain,
    tx: B256,
    block: u64,
    tx_type: u64,
    success: bool,
    logs: Vec<Log>,
) -> MockChain {
    let chain = logs.iter().cloned().fold(chain, MockChain::with_log);
    chain.with_receipt(receipt(tx, block, tx_type, success, logs))
}

pub fn redeem_scheduled_log(ticket: B256, retry_tx: B256, block: u64, log_index: u64, tx: B256) -> Log {
    let event = ArbRetryableTx::RedeemScheduled {
        ticketId: ticket,
        retryTxHash: retry_tx,
        sequenceNum: 0,
        donatedGas: 100_000,
        gasDonor: Address::repeat_byte(0xd0),
        maxRefund: U256::from(1_000_000u64),
        submissionFeeRefund: U256::ZERO,
    };
    rpc_log(ARB_RETRYABLE_TX_ADDRESS, event.encode_log_data(), block, log_index, tx)
}
