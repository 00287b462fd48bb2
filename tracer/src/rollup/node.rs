use crate::l1::bindings::Rollup;
use alloy::primitives::{B256, keccak256};
use serde::Serialize;

/// Machine state committed by an assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalState {
    pub l2_block_hash: B256,
    pub send_root: B256,
    pub inbox_position: u64,
    pub position_in_message: u64,
}

impl GlobalState {
    /// `keccak256(l2BlockHash ‖ sendRoot)`, what the rollup stores as a node's confirm data.
    pub fn confirm_data(&self) -> B256 {
        let mut packed = [0u8; 64];
        packed[..32].copy_from_slice(self.l2_block_hash.as_slice());
        packed[32..].copy_from_slice(self.send_root.as_slice());
        keccak256(packed)
    }
}

impl From<&Rollup::GlobalState> for GlobalState {
    fn from(state: &Rollup::GlobalState) -> Self {
        Self {
            l2_block_hash: state.bytes32Vals[0],
            send_root: state.bytes32Vals[1],
            inbox_position: state.u64Vals[0],
            position_in_message: state.u64Vals[1],
        }
    }
}

/// One rollup assertion, merged from the stored node and its `NodeCreated` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupNode {
    pub id: u64,
    pub parent_id: u64,
    pub created_at_l1_block: u64,
    pub deadline_l1_block: u64,
    pub confirm_data: B256,
    pub node_hash: B256,
    pub before_state: GlobalState,
    pub after_state: GlobalState,
    pub num_blocks: u64,
    pub creation_tx_hash: Option<B256>,
}

impl RollupNode {
    pub fn new(
        id: u64,
        stored: &Rollup::Node,
        created: &Rollup::NodeCreated,
        creation_tx_hash: Option<B256>,
    ) -> Self {
        Self {
            id,
            parent_id: stored.prevNum,
            created_at_l1_block: stored.createdAtBlock,
            deadline_l1_block: stored.deadlineBlock,
            confirm_data: stored.confirmData,
            node_hash: stored.nodeHash,
            before_state: GlobalState::from(&created.assertion.beforeState.globalState),
            after_state: GlobalState::from(&created.assertion.afterState.globalState),
            num_blocks: created.assertion.numBlocks,
            creation_tx_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::b256;

    #[test]
    fn test_confirm_data_is_packed_hash() {
        let state = GlobalState {
            l2_block_hash: B256::repeat_byte(0x01),
            send_root: B256::repeat_byte(0x02),
            inbox_position: 5,
            position_in_message: 0,
        };
        let mut expected = Vec::from(state.l2_block_hash.as_slice());
        expected.extend_from_slice(state.send_root.as_slice());
        assert_eq!(state.confirm_data(), keccak256(&expected));
        assert_ne!(
            state.confirm_data(),
            b256!("0x0000000000000000000000000000000000000000000000000000000000000000")
        );
    }

    #[test]
    fn test_global_state_from_binding() {
        let binding = Rollup::GlobalState {
            bytes32Vals: [B256::repeat_byte(0xaa), B256::repeat_byte(0xbb)],
            u64Vals: [17, 3],
        };
        let state = GlobalState::from(&binding);
        assert_eq!(state.l2_block_hash, B256::repeat_byte(0xaa));
        assert_eq!(state.send_root, B256::repeat_byte(0xbb));
        assert_eq!(state.inbox_position, 17);
        assert_eq!(state.position_in_message, 3);
    }
}
