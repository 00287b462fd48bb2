use super::{
    finality::{L1FinalityTier, classify_finality},
    node::{GlobalState, RollupNode},
};
use crate::{
    error::{TraceError, TraceResult},
    l1::bindings::Rollup,
    scanner::decode_or_skip,
    utils::{calls::view_call, config::TracerConfig},
};
use alloy::{primitives::B256, rpc::types::Log, sol_types::SolEvent};
use chrono::{DateTime, Utc};
use common::chain::{BlockRef, ChainDataPort, EventCriteria};
use tracing::{debug, warn};

/// Read-only view of the rollup contract on L1, resolving assertion state
/// against L2 blocks where needed.
pub struct RollupStateReader<'a, L1: ChainDataPort, L2: ChainDataPort> {
    l1: &'a L1,
    l2: &'a L2,
    config: &'a TracerConfig,
}

impl<'a, L1: ChainDataPort, L2: ChainDataPort> RollupStateReader<'a, L1, L2> {
    pub fn new(l1: &'a L1, l2: &'a L2, config: &'a TracerConfig) -> Self {
        Self { l1, l2, config }
    }

    pub(super) fn config(&self) -> &TracerConfig {
        self.config
    }

    pub(super) async fn l1_head(&self) -> TraceResult<u64> {
        Ok(self.l1.get_block_number().await?)
    }

    pub(super) async fn l2_raw_block(&self, hash: B256) -> TraceResult<Option<serde_json::Value>> {
        Ok(self.l2.get_raw_block(BlockRef::Hash(hash)).await?)
    }

    pub async fn latest_confirmed_id(&self) -> TraceResult<u64> {
        view_call(
            self.l1,
            self.config.contract_addresses.rollup,
            Rollup::latestConfirmedCall {},
        )
        .await
    }

    pub async fn latest_created_id(&self) -> TraceResult<u64> {
        view_call(
            self.l1,
            self.config.contract_addresses.rollup,
            Rollup::latestNodeCreatedCall {},
        )
        .await
    }

    pub async fn latest_confirmed_node(&self) -> TraceResult<RollupNode> {
        let id = self.latest_confirmed_id().await?;
        self.get_node(id).await
    }

    pub async fn latest_created_node(&self) -> TraceResult<RollupNode> {
        let id = self.latest_created_id().await?;
        self.get_node(id).await
    }

    /// Stored node plus its creation event. A zeroed storage slot means the
    /// node was never created or has been deleted.
    pub async fn get_node(&self, id: u64) -> TraceResult<RollupNode> {
        let stored = view_call(
            self.l1,
            self.config.contract_addresses.rollup,
            Rollup::getNodeCall { nodeNum: id },
        )
        .await?;
        if stored.nodeHash == B256::ZERO && stored.createdAtBlock == 0 {
            return Err(TraceError::not_found(format!("node {id}")));
        }

        let (created, log) = match self
            .node_created_between(id, stored.createdAtBlock, stored.createdAtBlock)
            .await?
        {
            Some(found) => found,
            None => {
                debug!(
                    "NodeCreated of node {} not at L1 block {}, searching the rollup history",
                    id, stored.createdAtBlock
                );
                self.find_node_created_event(id).await?
            }
        };
        Ok(RollupNode::new(id, &stored, &created, log.transaction_hash))
    }

    /// Single lookup over the whole rollup history, not windowed.
    pub async fn find_node_created_event(
        &self,
        id: u64,
    ) -> TraceResult<(Rollup::NodeCreated, Log)> {
        let head = self.l1.get_block_number().await?;
        self.node_created_between(id, self.config.rollup_deploy_l1_block, head)
            .await?
            .ok_or_else(|| TraceError::not_found(format!("NodeCreated event of node {id}")))
    }

    async fn node_created_between(
        &self,
        id: u64,
        from_block: u64,
        to_block: u64,
    ) -> TraceResult<Option<(Rollup::NodeCreated, Log)>> {
        let criteria = EventCriteria::new(
            self.config.contract_addresses.rollup,
            Rollup::NodeCreated::SIGNATURE_HASH,
        )
        .with_indexed(0, B256::from(alloy::primitives::U256::from(id)));
        let logs = self.l1.get_logs(&criteria, from_block, to_block).await?;
        Ok(logs.into_iter().find_map(|log| {
            decode_or_skip::<Rollup::NodeCreated>(&log).map(|event| (event, log))
        }))
    }

    /// L1 block of the `NodeConfirmed` event of `id`, searched from `from_block` to the head.
    pub async fn find_node_confirmed_block(&self, id: u64, from_block: u64) -> TraceResult<u64> {
        let head = self.l1.get_block_number().await?;
        let criteria = EventCriteria::new(
            self.config.contract_addresses.rollup,
            Rollup::NodeConfirmed::SIGNATURE_HASH,
        )
        .with_indexed(0, B256::from(alloy::primitives::U256::from(id)));
        let logs = self.l1.get_logs(&criteria, from_block, head).await?;
        logs.iter()
            .filter(|log| decode_or_skip::<Rollup::NodeConfirmed>(log).is_some())
            .find_map(|log| log.block_number)
            .ok_or_else(|| TraceError::not_found(format!("NodeConfirmed event of node {id}")))
    }

    pub async fn classify_finality(&self, l1_block: u64) -> TraceResult<L1FinalityTier> {
        let latest = self.l1.get_block_number().await?;
        Ok(classify_finality(
            latest,
            l1_block,
            self.config.l1_slots_per_epoch,
        ))
    }

    /// L2 block number a global state points at.
    pub async fn l2_block_number_of(&self, state: &GlobalState) -> TraceResult<u64> {
        self.l2
            .get_block(BlockRef::Hash(state.l2_block_hash))
            .await?
            .map(|block| block.number)
            .ok_or_else(|| TraceError::not_found(format!("L2 block {}", state.l2_block_hash)))
    }

    /// First node, in creation order, whose after state reaches `l2_block`.
    ///
    /// Only `NodeCreated` events between the L1 block the L2 block refers to and
    /// `node_lookback_secs` of L1 blocks later are considered. Nodes come
    /// roughly hourly, so the window usually holds one or two of them, but a
    /// slow period can leave the covering node outside it and yield `None`.
    pub async fn node_containing_l2_block(&self, l2_block: u64) -> TraceResult<Option<RollupNode>> {
        let block = self
            .l2
            .get_block(BlockRef::Number(l2_block))
            .await?
            .ok_or_else(|| TraceError::not_found(format!("L2 block {l2_block}")))?;
        let l1_from = block.l1_block_number.ok_or_else(|| {
            TraceError::Decode(format!("L2 block {l2_block} carries no l1BlockNumber"))
        })?;
        let l1_to = l1_from.saturating_add(self.config.node_lookback_blocks());

        let criteria = EventCriteria::new(
            self.config.contract_addresses.rollup,
            Rollup::NodeCreated::SIGNATURE_HASH,
        );
        let mut logs = self.l1.get_logs(&criteria, l1_from, l1_to).await?;
        logs.sort_by_key(|log| (log.block_number, log.log_index));
        debug!(
            "{} NodeCreated events in L1 blocks {}..={} for L2 block {}",
            logs.len(),
            l1_from,
            l1_to,
            l2_block
        );

        for log in &logs {
            let Some(created) = decode_or_skip::<Rollup::NodeCreated>(log) else {
                continue;
            };
            let after_state = GlobalState::from(&created.assertion.afterState.globalState);
            let after_block = match self.l2_block_number_of(&after_state).await {
                Ok(number) => number,
                Err(TraceError::NotFound(what)) => {
                    debug!("Skipping node {}: {} not found", created.nodeNum, what);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if after_block >= l2_block {
                return self.get_node(created.nodeNum).await.map(Some);
            }
        }

        warn!(
            "No node covering L2 block {} in L1 blocks {}..={}",
            l2_block, l1_from, l1_to
        );
        Ok(None)
    }

    /// Creation time plus the dispute period at the configured average L1 block time.
    pub async fn estimate_confirmation_date(&self, node: &RollupNode) -> TraceResult<DateTime<Utc>> {
        let created = self
            .l1
            .get_block(BlockRef::Number(node.created_at_l1_block))
            .await?
            .ok_or_else(|| {
                TraceError::not_found(format!("L1 block {}", node.created_at_l1_block))
            })?;
        let dispute_blocks = node
            .deadline_l1_block
            .saturating_sub(node.created_at_l1_block);
        let dispute_secs = dispute_blocks.saturating_mul(self.config.l1_block_time_ms) / 1000;
        let eta = created.timestamp.saturating_add(dispute_secs);
        i64::try_from(eta)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .ok_or_else(|| TraceError::Decode(format!("timestamp {eta} out of range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        MockChain, NodeFixture, block_hash, block_json, rpc_log, with_latest_nodes, with_node,
        zeroed_node,
    };
    use serde_json::json;

    fn l2_with_blocks(blocks: &[(u64, u64)]) -> MockChain {
        blocks.iter().fold(MockChain::new(42161, 10_000), |chain, (number, l1)| {
            chain.with_block(block_json(*number, 1_700_000_000, json!({ "l1BlockNumber": format!("{l1:#x}") })))
        })
    }

    #[tokio::test]
    async fn test_get_node_merges_storage_and_event() {
        let config = TracerConfig::default();
        let fixture = NodeFixture::new(7, 1_000, 100);
        let l1 = with_node(MockChain::new(1, 2_000), &config, &fixture);
        let l2 = l2_with_blocks(&[]);
        let reader = RollupStateReader::new(&l1, &l2, &config);

        let node = reader.get_node(7).await.unwrap();

        assert_eq!(node.id, 7);
        assert_eq!(node.parent_id, 6);
        assert_eq!(node.created_at_l1_block, 1_000);
        assert_eq!(node.after_state.l2_block_hash, block_hash(100));
        assert_eq!(node.confirm_data, node.after_state.confirm_data());
        assert_eq!(node.creation_tx_hash, Some(fixture.creation_tx));
    }

    /// Node 7 stored as created at L1 block 1000 while its event sits at `event_block`.
    fn node_with_event_at(config: &TracerConfig, event_block: u64) -> MockChain {
        let stored = NodeFixture::new(7, 1_000, 100);
        let emitted = NodeFixture::new(7, event_block, 100);
        let chain = MockChain::new(1, 5_000)
            .with_call(
                config.contract_addresses.rollup,
                alloy::sol_types::SolCall::abi_encode(&Rollup::getNodeCall { nodeNum: 7 }),
                <Rollup::getNodeCall as alloy::sol_types::SolCall>::abi_encode_returns(
                    &stored.stored(),
                ),
            );
        chain.with_log(rpc_log(
            config.contract_addresses.rollup,
            emitted.created_event().encode_log_data(),
            event_block,
            0,
            emitted.creation_tx,
        ))
    }

    #[tokio::test]
    async fn test_find_node_created_event_over_history() {
        let mut config = TracerConfig::default();
        config.rollup_deploy_l1_block = 500;
        let l1 = node_with_event_at(&config, 3_217);
        let l2 = l2_with_blocks(&[]);
        let reader = RollupStateReader::new(&l1, &l2, &config);

        let (event, log) = reader.find_node_created_event(7).await.unwrap();
        let err = reader.find_node_created_event(8).await.unwrap_err();

        assert_eq!(event.nodeNum, 7);
        assert_eq!(log.block_number, Some(3_217));
        assert_eq!(l1.log_queries(), vec![(500, 5_000), (500, 5_000)]);
        assert!(matches!(err, TraceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_node_falls_back_to_history_search() {
        let config = TracerConfig::default();
        let l1 = node_with_event_at(&config, 1_450);
        let l2 = l2_with_blocks(&[]);
        let reader = RollupStateReader::new(&l1, &l2, &config);

        let node = reader.get_node(7).await.unwrap();

        assert_eq!(node.id, 7);
        assert_eq!(node.creation_tx_hash, Some(NodeFixture::new(7, 1_450, 100).creation_tx));
        assert_eq!(l1.log_queries(), vec![(1_000, 1_000), (0, 5_000)]);
    }

    #[tokio::test]
    async fn test_zeroed_node_is_not_found() {
        let config = TracerConfig::default();
        let l1 = MockChain::new(1, 2_000).with_call(
            config.contract_addresses.rollup,
            alloy::sol_types::SolCall::abi_encode(&Rollup::getNodeCall { nodeNum: 99 }),
            <Rollup::getNodeCall as alloy::sol_types::SolCall>::abi_encode_returns(&zeroed_node()),
        );
        let l2 = l2_with_blocks(&[]);
        let reader = RollupStateReader::new(&l1, &l2, &config);

        let err = reader.get_node(99).await.unwrap_err();

        assert!(matches!(err, TraceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_latest_nodes() {
        let config = TracerConfig::default();
        let l1 = with_latest_nodes(
            with_node(MockChain::new(1, 2_000), &config, &NodeFixture::new(5, 900, 80)),
            &config,
            5,
            6,
        );
        let l2 = l2_with_blocks(&[]);
        let reader = RollupStateReader::new(&l1, &l2, &config);

        assert_eq!(reader.latest_created_id().await.unwrap(), 6);
        assert_eq!(reader.latest_confirmed_node().await.unwrap().id, 5);
    }

    #[tokio::test]
    async fn test_node_containing_l2_block_picks_first_covering_node() {
        let config = TracerConfig::default();
        let l1 = [
            NodeFixture::new(10, 1_100, 90),
            NodeFixture::new(11, 1_300, 150),
            NodeFixture::new(12, 1_500, 210),
        ]
        .iter()
        .fold(MockChain::new(1, 5_000), |chain, fixture| {
            with_node(chain, &config, fixture)
        });
        let l2 = l2_with_blocks(&[(90, 1_000), (120, 1_050), (150, 1_250), (210, 1_450)]);
        let reader = RollupStateReader::new(&l1, &l2, &config);

        let node = reader.node_containing_l2_block(120).await.unwrap().unwrap();

        assert_eq!(node.id, 11);
        // Window is the L2 block's L1 block plus 576 blocks.
        assert_eq!(l1.log_queries()[0], (1_050, 1_626));
    }

    #[tokio::test]
    async fn test_node_containing_l2_block_outside_window() {
        let config = TracerConfig::default();
        let l1 = with_node(MockChain::new(1, 5_000), &config, &NodeFixture::new(10, 4_000, 300));
        let l2 = l2_with_blocks(&[(120, 1_050), (300, 3_900)]);
        let reader = RollupStateReader::new(&l1, &l2, &config);

        assert!(reader.node_containing_l2_block(120).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_estimate_confirmation_date() {
        let config = TracerConfig::default();
        let fixture = NodeFixture::new(3, 1_000, 50);
        let l1 = with_node(MockChain::new(1, 2_000), &config, &fixture)
            .with_simple_block(1_000, 1_700_000_000);
        let l2 = l2_with_blocks(&[]);
        let reader = RollupStateReader::new(&l1, &l2, &config);
        let node = reader.get_node(3).await.unwrap();

        let eta = reader.estimate_confirmation_date(&node).await.unwrap();

        // 45818 blocks of dispute period at 12.5s
        assert_eq!(eta.timestamp(), 1_700_000_000 + 572_725);
    }

    #[tokio::test]
    async fn test_find_node_confirmed_block() {
        let config = TracerConfig::default();
        let confirmed = Rollup::NodeConfirmed {
            nodeNum: 4,
            blockHash: B256::repeat_byte(1),
            sendRoot: B256::repeat_byte(2),
        };
        let l1 = MockChain::new(1, 3_000).with_log(crate::test_utils::rpc_log(
            config.contract_addresses.rollup,
            confirmed.encode_log_data(),
            2_500,
            3,
            B256::repeat_byte(0x44),
        ));
        let l2 = l2_with_blocks(&[]);
        let reader = RollupStateReader::new(&l1, &l2, &config);

        assert_eq!(reader.find_node_confirmed_block(4, 1_000).await.unwrap(), 2_500);
        assert!(reader.find_node_confirmed_block(5, 1_000).await.unwrap_err().is_absence());
    }

    #[tokio::test]
    async fn test_finality_of_l1_block() {
        let config = TracerConfig::default();
        let l1 = MockChain::new(1, 3_000);
        let l2 = l2_with_blocks(&[]);
        let reader = RollupStateReader::new(&l1, &l2, &config);

        assert_eq!(reader.classify_finality(2_936).await.unwrap(), L1FinalityTier::Finalized);
        assert_eq!(reader.classify_finality(2_937).await.unwrap(), L1FinalityTier::Safe);
    }
}
