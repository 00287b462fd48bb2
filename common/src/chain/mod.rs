mod criteria;
mod port;
mod types;

pub use criteria::EventCriteria;
pub use port::ChainDataPort;
pub use types::{
    BlockInfo, BlockRef, DEPOSIT_TX_TYPE, RETRY_TX_TYPE, SUBMIT_RETRYABLE_TX_TYPE, TxReceipt,
};
