pub mod bindings;

use alloy::primitives::{Address, address};

// Rollup precompiles, identical on every Arbitrum chain.
pub const ARB_SYS_ADDRESS: Address = address!("0x0000000000000000000000000000000000000064");
pub const ARB_RETRYABLE_TX_ADDRESS: Address =
    address!("0x000000000000000000000000000000000000006e");
pub const NODE_INTERFACE_ADDRESS: Address = address!("0x00000000000000000000000000000000000000c8");
