use super::{
    criteria::EventCriteria,
    types::{BlockInfo, BlockRef, TxReceipt},
};
use alloy::{
    primitives::{Address, B256, Bytes},
    rpc::types::Log,
};
use anyhow::Error;
use std::future::Future;

/// Read-only access to one chain endpoint.
///
/// Every method maps onto one JSON-RPC call; absence (`None`) is data, an `Err`
/// is a transport failure.
pub trait ChainDataPort: Send + Sync {
    fn chain_id(&self) -> u64;

    fn get_block_number(&self) -> impl Future<Output = Result<u64, Error>> + Send;

    /// Raw `eth_getBlockByNumber` / `eth_getBlockByHash` JSON, without full transactions.
    fn get_raw_block(
        &self,
        block: BlockRef,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, Error>> + Send;

    fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> impl Future<Output = Result<Option<TxReceipt>, Error>> + Send;

    fn get_logs(
        &self,
        criteria: &EventCriteria,
        from_block: u64,
        to_block: u64,
    ) -> impl Future<Output = Result<Vec<Log>, Error>> + Send;

    /// `eth_call` against the latest block.
    fn call(&self, to: Address, data: Bytes) -> impl Future<Output = Result<Bytes, Error>> + Send;

    fn get_block(
        &self,
        block: BlockRef,
    ) -> impl Future<Output = Result<Option<BlockInfo>, Error>> + Send {
        async move {
            match self.get_raw_block(block).await? {
                Some(raw) => Ok(Some(BlockInfo::from_raw(raw).map_err(|e| {
                    anyhow::anyhow!("[chain_id: {}] block {}: {}", self.chain_id(), block, e)
                })?)),
                None => Ok(None),
            }
        }
    }
}
