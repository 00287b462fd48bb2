//! Locating the sequencer batch that carried an L2 block to L1.

use crate::{
    error::{TraceError, TraceResult},
    l1::bindings::SequencerInbox,
    l2::{NODE_INTERFACE_ADDRESS, bindings::NodeInterface},
    scanner::decode_or_skip,
    utils::{
        calls::{is_revert, view_call},
        config::TracerConfig,
    },
};
use alloy::{
    primitives::{B256, U256},
    rpc::types::Log,
    sol_types::SolEvent,
};
use common::chain::{ChainDataPort, EventCriteria};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BatchInclusion {
    NotYetPosted,
    /// Posted, the L1 block holding it has no confirmations yet.
    Posted,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub l2_tx_hash: B256,
    pub l2_block: u64,
    pub l2_block_hash: B256,
    pub batch: Option<u64>,
    pub l1_tx_hash: Option<B256>,
    pub l1_block: Option<u64>,
    pub confirmations: u64,
    pub inclusion: BatchInclusion,
}

pub struct BatchLocator<'a, L1: ChainDataPort, L2: ChainDataPort> {
    l1: &'a L1,
    l2: &'a L2,
    config: &'a TracerConfig,
}

impl<'a, L1: ChainDataPort, L2: ChainDataPort> BatchLocator<'a, L1, L2> {
    pub fn new(l1: &'a L1, l2: &'a L2, config: &'a TracerConfig) -> Self {
        Self { l1, l2, config }
    }

    /// Batch sequence number, `None` while the block has not been posted.
    pub async fn batch_containing_block(&self, l2_block: u64) -> TraceResult<Option<u64>> {
        let call = NodeInterface::findBatchContainingBlockCall { blockNum: l2_block };
        match view_call(self.l2, NODE_INTERFACE_ADDRESS, call).await {
            Ok(batch) => Ok(Some(batch)),
            Err(TraceError::Transport(e)) if is_revert(&e) => {
                debug!("No batch contains L2 block {} yet: {}", l2_block, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Single lookup over the whole rollup history, not windowed.
    pub async fn find_batch_delivery(&self, batch: u64) -> TraceResult<Option<Log>> {
        let head = self.l1.get_block_number().await?;
        let criteria = EventCriteria::new(
            self.config.contract_addresses.sequencer_inbox,
            SequencerInbox::SequencerBatchDelivered::SIGNATURE_HASH,
        )
        .with_indexed(0, B256::from(U256::from(batch)));
        let logs = self
            .l1
            .get_logs(&criteria, self.config.rollup_deploy_l1_block, head)
            .await?;
        Ok(logs
            .into_iter()
            .find(|log| decode_or_skip::<SequencerInbox::SequencerBatchDelivered>(log).is_some()))
    }

    /// L1 block of the batch posting that carried `l2_block`.
    pub async fn batch_delivery_block(&self, l2_block: u64) -> TraceResult<Option<u64>> {
        let Some(batch) = self.batch_containing_block(l2_block).await? else {
            return Ok(None);
        };
        Ok(self
            .find_batch_delivery(batch)
            .await?
            .and_then(|log| log.block_number))
    }

    pub async fn l1_confirmations(&self, l2_block_hash: B256) -> TraceResult<u64> {
        let call = NodeInterface::getL1ConfirmationsCall {
            blockHash: l2_block_hash,
        };
        match view_call(self.l2, NODE_INTERFACE_ADDRESS, call).await {
            Ok(confirmations) => Ok(confirmations),
            Err(TraceError::Transport(e)) if is_revert(&e) => Ok(0),
            Err(e) => Err(e),
        }
    }

    pub async fn find_l1_batch(&self, l2_tx_hash: B256) -> TraceResult<BatchReport> {
        let receipt = self
            .l2
            .get_transaction_receipt(l2_tx_hash)
            .await?
            .ok_or_else(|| TraceError::transaction_not_found(l2_tx_hash))?;

        let batch = self.batch_containing_block(receipt.block_number).await?;
        let delivery = match batch {
            Some(batch) => self.find_batch_delivery(batch).await?,
            None => None,
        };
        let confirmations = if delivery.is_some() {
            self.l1_confirmations(receipt.block_hash).await?
        } else {
            0
        };
        let inclusion = match (&delivery, confirmations) {
            (None, _) => BatchInclusion::NotYetPosted,
            (Some(_), 0) => BatchInclusion::Posted,
            (Some(_), _) => BatchInclusion::Confirmed,
        };
        info!(
            "L2 tx {} in block {}: batch {:?}, {}",
            l2_tx_hash, receipt.block_number, batch, inclusion
        );

        Ok(BatchReport {
            l2_tx_hash,
            l2_block: receipt.block_number,
            l2_block_hash: receipt.block_hash,
            batch,
            l1_tx_hash: delivery.as_ref().and_then(|log| log.transaction_hash),
            l1_block: delivery.as_ref().and_then(|log| log.block_number),
            confirmations,
            inclusion,
        })
    }
}
