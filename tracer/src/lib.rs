pub mod batch;
pub mod engine;
pub mod error;
pub mod l1;
pub mod l2;
pub mod message;
pub mod result;
pub mod rollup;
pub mod scanner;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use engine::BridgeTracer;
pub use error::{TraceError, TraceResult};
pub use utils::config::TracerConfig;
