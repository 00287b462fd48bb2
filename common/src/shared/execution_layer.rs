use crate::{
    chain::{BlockRef, ChainDataPort, EventCriteria, TxReceipt},
    shared::alloy_tools,
};
use alloy::{
    primitives::{Address, B256, Bytes},
    providers::{DynProvider, Provider},
    rpc::types::{Log, TransactionRequest},
};
use anyhow::Error;
use tracing::{debug, info};

/// Handle to one chain endpoint: the RPC client plus the chain id it reported
/// at construction. Immutable for the lifetime of the process.
pub struct ExecutionLayer {
    provider: DynProvider,
    chain_id: u64,
}

impl ExecutionLayer {
    pub async fn new(provider: DynProvider) -> Result<Self, Error> {
        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| Error::msg(format!("Failed to get chain ID: {e}")))?;

        Ok(Self { provider, chain_id })
    }

    pub async fn new_read_only(url: &str) -> Result<Self, Error> {
        let provider = alloy_tools::create_alloy_provider_without_wallet(url).await?;
        let execution_layer = Self::new(provider).await?;
        info!("Connected to {} (chain ID: {})", url, execution_layer.chain_id);
        Ok(execution_layer)
    }

    pub fn provider(&self) -> DynProvider {
        self.provider.clone()
    }

    fn chain_error(&self, context: &str, e: impl std::fmt::Display) -> Error {
        anyhow::anyhow!("[chain_id: {}] {}: {}", self.chain_id, context, e)
    }
}

impl ChainDataPort for ExecutionLayer {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn get_block_number(&self) -> Result<u64, Error> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| self.chain_error("Failed to get latest block number", e))
    }

    async fn get_raw_block(&self, block: BlockRef) -> Result<Option<serde_json::Value>, Error> {
        let raw: Option<serde_json::Value> = match block {
            BlockRef::Hash(hash) => self
                .provider
                .client()
                .request("eth_getBlockByHash", (hash, false))
                .await
                .map_err(|e| self.chain_error(&format!("Failed to get block {hash}"), e))?,
            BlockRef::Number(_) | BlockRef::Latest => {
                let tag = block
                    .as_number_or_tag()
                    .ok_or_else(|| anyhow::anyhow!("Unsupported block reference {block}"))?;
                self.provider
                    .client()
                    .request("eth_getBlockByNumber", (tag, false))
                    .await
                    .map_err(|e| self.chain_error(&format!("Failed to get block {block}"), e))?
            }
        };
        // Some providers answer an unknown block with JSON null.
        Ok(raw.filter(|value| !value.is_null()))
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, Error> {
        self.provider
            .client()
            .request("eth_getTransactionReceipt", (hash,))
            .await
            .map_err(|e| self.chain_error(&format!("Failed to get receipt for {hash}"), e))
    }

    async fn get_logs(
        &self,
        criteria: &EventCriteria,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>, Error> {
        let filter = criteria.to_filter(from_block, to_block);
        debug!(
            "[chain_id: {}] eth_getLogs {}..={}",
            self.chain_id, from_block, to_block
        );
        self.provider
            .get_logs(&filter)
            .await
            .map_err(|e| self.chain_error("Failed to get logs", e))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, Error> {
        let request = TransactionRequest::default().to(to).input(data.into());
        self.provider
            .call(request)
            .await
            .map_err(|e| self.chain_error(&format!("Failed to call {to}"), e))
    }
}
