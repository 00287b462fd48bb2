use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, B256},
    rpc::types::Log,
};
use serde::{Deserialize, Serialize};

/// Arbitrum envelope type of an L1-to-L2 ETH deposit transaction.
pub const DEPOSIT_TX_TYPE: u64 = 0x64;
/// Arbitrum envelope type of a retryable auto/manual redeem attempt.
pub const RETRY_TX_TYPE: u64 = 0x68;
/// Arbitrum envelope type of a retryable ticket submission.
pub const SUBMIT_RETRYABLE_TX_TYPE: u64 = 0x69;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    Number(u64),
    Hash(B256),
    Latest,
}

impl From<u64> for BlockRef {
    fn from(number: u64) -> Self {
        BlockRef::Number(number)
    }
}

impl From<B256> for BlockRef {
    fn from(hash: B256) -> Self {
        BlockRef::Hash(hash)
    }
}

impl BlockRef {
    pub fn as_number_or_tag(&self) -> Option<BlockNumberOrTag> {
        match self {
            BlockRef::Number(number) => Some(BlockNumberOrTag::Number(*number)),
            BlockRef::Latest => Some(BlockNumberOrTag::Latest),
            BlockRef::Hash(_) => None,
        }
    }
}

impl std::fmt::Display for BlockRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockRef::Number(number) => write!(f, "{number}"),
            BlockRef::Hash(hash) => write!(f, "{hash}"),
            BlockRef::Latest => write!(f, "latest"),
        }
    }
}

/// Transaction receipt as returned by `eth_getTransactionReceipt`, tolerant of
/// the rollup's non-Ethereum envelope types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_hash: B256,
    #[serde(with = "alloy::serde::quantity")]
    pub block_number: u64,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub status: Option<u64>,
    #[serde(rename = "type", with = "alloy::serde::quantity")]
    pub tx_type: u64,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TxReceipt {
    /// Missing status (pre-Byzantium) counts as success.
    pub fn is_success(&self) -> bool {
        self.status.is_none_or(|status| status == 1)
    }
}

/// The block fields the tracer needs, including the rollup-specific
/// `l1BlockNumber`, `sendCount` and `sendRoot` extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    pub hash: B256,
    pub parent_hash: B256,
    #[serde(with = "alloy::serde::quantity")]
    pub number: u64,
    #[serde(with = "alloy::serde::quantity")]
    pub timestamp: u64,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub l1_block_number: Option<u64>,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub send_count: Option<u64>,
    #[serde(default)]
    pub send_root: Option<B256>,
}

impl BlockInfo {
    pub fn from_raw(raw: serde_json::Value) -> Result<Self, anyhow::Error> {
        serde_json::from_value(raw).map_err(|e| anyhow::anyhow!("Failed to parse block: {e}"))
    }
}
