use alloy::primitives::Address;
use anyhow::Error;
use std::{fmt, str::FromStr};
use tracing::warn;

pub trait ConfigTrait: Sized {
    fn read_env_variables() -> Result<Self, Error>;
}

pub fn address_parse_error(
    env_var: &str,
    err: impl fmt::Display,
    address_str: &str,
) -> anyhow::Error {
    anyhow::anyhow!(
        "Failed to parse {} as an address ({}): {}",
        env_var,
        address_str,
        err
    )
}

/// Loads the `.env` file from the working directory, if present.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }
}

pub fn read_u64(env_var: &str, default: u64) -> Result<u64, Error> {
    match std::env::var(env_var) {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("{} must be a number: {}", env_var, e)),
        Err(_) => Ok(default),
    }
}

/// Reads a contract address, falling back to `default` with a warning when unset.
pub fn read_address_or(env_var: &str, contract_name: &str, default: Address) -> Result<Address, Error> {
    match std::env::var(env_var) {
        Ok(address_str) => Address::from_str(&address_str)
            .map_err(|e| address_parse_error(env_var, e, &address_str)),
        Err(_) => {
            warn!(
                "No {} contract address found in {} env var, using default {}",
                contract_name, env_var, default
            );
            Ok(default)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub l1_rpc_url: String,
    pub l2_rpc_url: String,
}

impl ConfigTrait for Config {
    fn read_env_variables() -> Result<Self, Error> {
        const L1_RPC_URL: &str = "L1_RPC_URL";
        let l1_rpc_url = std::env::var(L1_RPC_URL)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", L1_RPC_URL, e))?;

        const L2_RPC_URL: &str = "L2_RPC_URL";
        let l2_rpc_url = std::env::var(L2_RPC_URL)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", L2_RPC_URL, e))?;

        Ok(Config {
            l1_rpc_url,
            l2_rpc_url,
        })
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "L1 RPC URL: {}", self.l1_rpc_url)?;
        writeln!(f, "L2 RPC URL: {}", self.l2_rpc_url)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u64_falls_back_to_default() {
        assert_eq!(
            read_u64("BRIDGE_TRACER_TEST_SURELY_UNSET_VAR", 1000).unwrap(),
            1000
        );
    }

    #[test]
    fn test_address_parse_error_names_variable() {
        let err = address_parse_error("ROLLUP_ADDRESS", "bad hex", "0xzz");
        let msg = err.to_string();
        assert!(msg.contains("ROLLUP_ADDRESS"));
        assert!(msg.contains("0xzz"));
    }
}
