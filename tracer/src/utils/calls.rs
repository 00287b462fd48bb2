use crate::error::TraceResult;
use alloy::{primitives::Address, sol_types::SolCall};
use common::chain::ChainDataPort;

/// Encodes `call`, sends it as an `eth_call` to `to` and decodes the return value.
pub async fn view_call<P: ChainDataPort, C: SolCall + Send>(
    port: &P,
    to: Address,
    call: C,
) -> TraceResult<C::Return> {
    let output = port.call(to, call.abi_encode().into()).await?;
    Ok(C::abi_decode_returns(&output)?)
}

/// Whether a failed `eth_call` was rejected by the contract rather than lost in transport.
pub fn is_revert(error: &anyhow::Error) -> bool {
    error.to_string().to_lowercase().contains("revert")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_revert() {
        assert!(is_revert(&anyhow::anyhow!(
            "[chain_id: 42161] Failed to call 0xc8: server returned an error response: error code 3: execution reverted"
        )));
        assert!(!is_revert(&anyhow::anyhow!("connection refused")));
    }
}
