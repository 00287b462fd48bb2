use crate::{
    batch::{BatchLocator, BatchReport},
    error::TraceResult,
    message::MessageClassifier,
    result::MessageSearchResult,
    rollup::{L2BlockStatus, NodeStateReport, RollupStateReader},
    utils::config::TracerConfig,
};
use alloy::primitives::B256;
use common::chain::ChainDataPort;
use std::sync::Arc;
use tracing::info;

/// Entry point of the tracer: one L1 and one L2 endpoint plus the rollup
/// deployment they belong to. Every query is independent and read-only.
pub struct BridgeTracer<L1: ChainDataPort, L2: ChainDataPort> {
    l1: Arc<L1>,
    l2: Arc<L2>,
    config: TracerConfig,
}

impl<L1: ChainDataPort, L2: ChainDataPort> BridgeTracer<L1, L2> {
    pub fn new(l1: Arc<L1>, l2: Arc<L2>, config: TracerConfig) -> Self {
        Self { l1, l2, config }
    }

    fn classifier(&self) -> MessageClassifier<'_, L1, L2> {
        MessageClassifier::new(self.l1.as_ref(), self.l2.as_ref(), &self.config)
    }

    fn reader(&self) -> RollupStateReader<'_, L1, L2> {
        RollupStateReader::new(self.l1.as_ref(), self.l2.as_ref(), &self.config)
    }

    /// Bridge messages an L1 or L2 transaction took part in.
    pub async fn locate(&self, tx_hash: B256) -> TraceResult<MessageSearchResult> {
        info!("Locating cross-chain messages of {}", tx_hash);
        self.classifier().locate(tx_hash).await
    }

    /// L2-to-L1 messages of an L2 transaction and their outbox status.
    pub async fn trace_withdrawal(&self, tx_hash: B256) -> TraceResult<MessageSearchResult> {
        info!("Tracing withdrawals of {}", tx_hash);
        self.classifier().trace_l2_to_l1(tx_hash).await
    }

    pub async fn find_l1_batch(&self, l2_tx_hash: B256) -> TraceResult<BatchReport> {
        BatchLocator::new(self.l1.as_ref(), self.l2.as_ref(), &self.config)
            .find_l1_batch(l2_tx_hash)
            .await
    }

    pub async fn l2_block_status(&self, l2_block: u64) -> TraceResult<L2BlockStatus> {
        self.reader().l2_block_status(l2_block).await
    }

    /// Consistency report of the latest confirmed node, or of the latest
    /// created one when `latest_created` is set.
    pub async fn verify_node(&self, latest_created: bool) -> TraceResult<NodeStateReport> {
        self.reader().verify_node(latest_created).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::TraceError,
        test_utils::{MockChain, hash},
    };

    fn tracer(l1: MockChain, l2: MockChain) -> BridgeTracer<MockChain, MockChain> {
        BridgeTracer::new(Arc::new(l1), Arc::new(l2), TracerConfig::default())
    }

    #[tokio::test]
    async fn test_unknown_hash_is_an_empty_result() {
        let tracer = tracer(MockChain::new(1, 100), MockChain::new(42161, 100));

        let result = tracer.locate(hash(0x77)).await.unwrap();

        assert_eq!(result.found_on, None);
        assert!(result.messages.is_empty());
    }

    #[tokio::test]
    async fn test_withdrawal_of_unknown_tx() {
        let tracer = tracer(MockChain::new(1, 100), MockChain::new(42161, 100));

        let result = tracer.trace_withdrawal(hash(0x78)).await.unwrap();

        assert_eq!(result.found_on, None);
    }

    #[tokio::test]
    async fn test_batch_of_unknown_tx_is_not_found() {
        let tracer = tracer(MockChain::new(1, 100), MockChain::new(42161, 100));

        let err = tracer.find_l1_batch(hash(0x79)).await.unwrap_err();

        assert!(matches!(err, TraceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let l1 = MockChain::new(1, 100);
        l1.set_transport_down();
        let tracer = tracer(l1, MockChain::new(42161, 100));

        let err = tracer.verify_node(false).await.unwrap_err();

        assert!(matches!(err, TraceError::Transport(_)));
    }
}
