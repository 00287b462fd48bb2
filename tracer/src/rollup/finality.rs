use serde::Serialize;

/// L1 finality of a block, by its age relative to the chain head.
/// Ordered from least to most final.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum L1FinalityTier {
    Unsafe,
    Safe,
    Finalized,
}

/// A block is `Safe` one epoch behind the head and `Finalized` two epochs behind.
pub fn classify_finality(latest_l1_block: u64, block: u64, slots_per_epoch: u64) -> L1FinalityTier {
    let lag = latest_l1_block.saturating_sub(block);
    if lag >= slots_per_epoch.saturating_mul(2) {
        L1FinalityTier::Finalized
    } else if lag >= slots_per_epoch {
        L1FinalityTier::Safe
    } else {
        L1FinalityTier::Unsafe
    }
}
