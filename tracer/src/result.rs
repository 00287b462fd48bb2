use crate::message::{ChainSide, CrossChainMessage};
use alloy::primitives::B256;
use serde::Serialize;

/// How the L1 origin of an L2 transaction was looked for, and what came of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OriginSearch {
    Found {
        l1_tx_hash: Option<B256>,
        l1_block: Option<u64>,
    },
    /// Ordinary L2 transaction.
    NotL1Originated,
    NotFound {
        blocks_scanned: u64,
    },
    BudgetExceeded {
        chain_id: u64,
        blocks_scanned: u64,
    },
    /// L1-originated, but the link to the L1 message could not be established.
    Unresolved {
        reason: String,
    },
}

/// Everything learned about one transaction hash. Fields stay empty until
/// the corresponding step of the correlation succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSearchResult {
    pub tx_hash: B256,
    pub found_on: Option<ChainSide>,
    pub block_number: Option<u64>,
    pub origin: Option<OriginSearch>,
    pub messages: Vec<CrossChainMessage>,
}

impl MessageSearchResult {
    pub fn new(tx_hash: B256, found_on: ChainSide, block_number: u64) -> Self {
        Self {
            tx_hash,
            found_on: Some(found_on),
            block_number: Some(block_number),
            origin: None,
            messages: Vec::new(),
        }
    }

    /// The transaction exists on neither chain.
    pub fn not_found(tx_hash: B256) -> Self {
        Self {
            tx_hash,
            found_on: None,
            block_number: None,
            origin: None,
            messages: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_serialises_empty_fields() {
        let result = MessageSearchResult::not_found(B256::repeat_byte(7));
        assert_eq!(result.found_on, None);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["foundOn"].is_null());
        assert_eq!(json["messages"], serde_json::json!([]));
    }

    #[test]
    fn test_origin_search_tags() {
        let origin = OriginSearch::BudgetExceeded {
            chain_id: 1,
            blocks_scanned: 10_000,
        };
        let json = serde_json::to_value(&origin).unwrap();
        assert_eq!(json["result"], "budget_exceeded");
        assert_eq!(json["blocksScanned"], 10_000);
    }
}
