use crate::error::TraceResult;
use std::future::Future;

/// Navigation over rollup nodes. Nodes form a tree under disputes; callers
/// only ever follow the path this graph calls canonical.
pub trait NodeGraph: Send + Sync {
    fn next_on_canonical_path(
        &self,
        node_id: u64,
    ) -> impl Future<Output = TraceResult<Option<u64>>> + Send;
}

/// Follows node ids upwards one by one until the latest created node.
/// Sibling branches under dispute are not told apart.
pub struct LinearNodeGraph {
    latest_created: u64,
}

impl LinearNodeGraph {
    pub fn new(latest_created: u64) -> Self {
        Self { latest_created }
    }
}

impl NodeGraph for LinearNodeGraph {
    async fn next_on_canonical_path(&self, node_id: u64) -> TraceResult<Option<u64>> {
        Ok((node_id < self.latest_created).then(|| node_id + 1))
    }
}
