pub mod bindings;

use alloy::primitives::{Address, address};

/// Inbox message kind of a retryable ticket submission.
pub const L1_MESSAGE_TYPE_SUBMIT_RETRYABLE: u8 = 9;
/// Inbox message kind of a plain ETH deposit.
pub const L1_MESSAGE_TYPE_ETH_DEPOSIT: u8 = 12;

// Arbitrum One deployment, used when no address is configured.
pub const DEFAULT_ROLLUP_ADDRESS: Address = address!("0x5ef0d09d1e6204141b4d37530808ed19f60fba35");
pub const DEFAULT_BRIDGE_ADDRESS: Address = address!("0x8315177ab297ba92a06054ce80a67ed4dbd7ed3a");
pub const DEFAULT_INBOX_ADDRESS: Address = address!("0x4dbd4fc535ac27206064b68ffcf827b0a60bab3f");
pub const DEFAULT_SEQUENCER_INBOX_ADDRESS: Address =
    address!("0x1c479675ad559dc151f6ec7ed3fbf8cee79582b6");
pub const DEFAULT_OUTBOX_ADDRESS: Address = address!("0x0b9857ae2d4a3dbe74ffe1d7df045bb7f96e4840");
