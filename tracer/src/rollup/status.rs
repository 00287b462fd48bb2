use super::{
    finality::{L1FinalityTier, classify_finality},
    node::GlobalState,
    reader::RollupStateReader,
};
use crate::error::{TraceError, TraceResult};
use alloy::primitives::B256;
use chrono::{DateTime, Utc};
use common::chain::{BlockRef, ChainDataPort};
use serde::Serialize;
use tracing::{info, warn};

/// Whether an L2 block has been asserted on L1, and how far that assertion got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum L2BlockStatus {
    NotProcessed {
        l2_block: u64,
    },
    PendingConfirmation {
        l2_block: u64,
        node: u64,
        latest_confirmed: u64,
        estimated_confirmation: DateTime<Utc>,
    },
    Confirmed {
        l2_block: u64,
        node: u64,
        confirmed_at_l1_block: u64,
        latest_l1_block: u64,
        finality: L1FinalityTier,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStateReport {
    pub node_id: u64,
    pub latest_created: bool,
    pub creation_tx_hash: Option<B256>,
    pub num_blocks: u64,
    pub before_state: GlobalState,
    pub before_l2_block: Option<u64>,
    pub after_state: GlobalState,
    pub after_l2_block: Option<u64>,
    pub stored_confirm_data: B256,
    pub after_state_confirm_data: B256,
    /// After state hashes to the confirm data stored for the node.
    pub confirm_data_matches: bool,
    /// Header of the after-state L2 block hashes to the asserted block hash.
    pub block_hash_matches: bool,
}

impl<L1: ChainDataPort, L2: ChainDataPort> RollupStateReader<'_, L1, L2> {
    pub async fn l2_block_status(&self, l2_block: u64) -> TraceResult<L2BlockStatus> {
        let Some(node) = self.node_containing_l2_block(l2_block).await? else {
            return Ok(L2BlockStatus::NotProcessed { l2_block });
        };
        info!(
            "L2 block {} was processed on node {} at L1 block {}",
            l2_block, node.id, node.created_at_l1_block
        );

        let latest_confirmed = self.latest_confirmed_id().await?;
        if latest_confirmed < node.id {
            let estimated_confirmation = self.estimate_confirmation_date(&node).await?;
            return Ok(L2BlockStatus::PendingConfirmation {
                l2_block,
                node: node.id,
                latest_confirmed,
                estimated_confirmation,
            });
        }

        let confirmed_at_l1_block = self
            .find_node_confirmed_block(node.id, node.created_at_l1_block)
            .await?;
        let latest_l1_block = self.l1_head().await?;
        let finality = classify_finality(
            latest_l1_block,
            confirmed_at_l1_block,
            self.config().l1_slots_per_epoch,
        );
        Ok(L2BlockStatus::Confirmed {
            l2_block,
            node: node.id,
            confirmed_at_l1_block,
            latest_l1_block,
            finality,
        })
    }

    /// Re-derives the latest confirmed (or created) node's commitments from chain data.
    pub async fn verify_node(&self, latest_created: bool) -> TraceResult<NodeStateReport> {
        let node = if latest_created {
            self.latest_created_node().await?
        } else {
            self.latest_confirmed_node().await?
        };

        let before_l2_block = self.optional_l2_block_number(&node.before_state).await?;
        let after_l2_block = self.optional_l2_block_number(&node.after_state).await?;

        let after_state_confirm_data = node.after_state.confirm_data();
        let block_hash_matches = match self
            .l2_raw_block(node.after_state.l2_block_hash)
            .await?
        {
            Some(raw) => match header_hash(raw) {
                Ok(hash) => hash == node.after_state.l2_block_hash,
                Err(e) => {
                    warn!("Cannot recompute hash of L2 block {}: {}", node.after_state.l2_block_hash, e);
                    false
                }
            },
            None => false,
        };

        Ok(NodeStateReport {
            node_id: node.id,
            latest_created,
            creation_tx_hash: node.creation_tx_hash,
            num_blocks: node.num_blocks,
            before_state: node.before_state,
            before_l2_block,
            after_l2_block,
            confirm_data_matches: after_state_confirm_data == node.confirm_data,
            stored_confirm_data: node.confirm_data,
            after_state_confirm_data,
            after_state: node.after_state,
            block_hash_matches,
        })
    }

    async fn optional_l2_block_number(&self, state: &GlobalState) -> TraceResult<Option<u64>> {
        match self.l2_block_number_of(state).await {
            Ok(number) => Ok(Some(number)),
            Err(e) if e.is_absence() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Ethereum header hash of a raw `eth_getBlockBy*` response.
pub(crate) fn header_hash(raw: serde_json::Value) -> TraceResult<B256> {
    let header: alloy::rpc::types::Header = serde_json::from_value(raw)
        .map_err(|e| TraceError::Decode(format!("block header: {e}")))?;
    Ok(header.inner.hash_slow())
}
