mod finality;
mod graph;
mod node;
mod reader;
mod status;

pub use finality::{L1FinalityTier, classify_finality};
pub use graph::{LinearNodeGraph, NodeGraph};
pub use node::{GlobalState, RollupNode};
pub use reader::RollupStateReader;
pub use status::{L2BlockStatus, NodeStateReport};
