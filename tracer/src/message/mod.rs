mod classifier;
mod delivery;
mod ids;
mod outbox;
mod retryable;

pub use classifier::MessageClassifier;
pub use delivery::InboxDelivery;
pub use ids::{EthDepositMessage, L1ToL2Payload, RetryableSubmission};

use alloy::primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use common::chain::TxReceipt;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ChainSide {
    L1,
    L2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case", rename_all_fields = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum RetryableStatus {
    /// Ticket creation not executed on L2 yet.
    Pending,
    CreationFailed,
    /// Ticket created, waiting for a manual redeem.
    FundsDeposited,
    Redeemed,
    Expired,
    /// No successful redeem within the L2 search budget; a later one may exist.
    RedeemSearchExhausted { blocks_scanned: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DepositStatus {
    Pending,
    Deposited,
}

/// Progress of an L2-to-L1 message through the outbox, least advanced first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OutboxStatus {
    /// No created node covers the message yet.
    Unconfirmed,
    UnconfirmedPendingNode {
        node_id: u64,
        estimated_confirmation: DateTime<Utc>,
    },
    /// Executable on L1.
    Confirmed,
    Executed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryableTicket {
    /// L1 transaction that submitted the ticket, when known.
    pub source_tx_hash: Option<B256>,
    pub message_number: Option<U256>,
    pub ticket_id: B256,
    pub status: RetryableStatus,
    pub redeem_tx_hash: Option<B256>,
    pub creation_receipt: Option<TxReceipt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EthDeposit {
    pub source_tx_hash: Option<B256>,
    pub message_number: Option<U256>,
    pub deposit_tx_hash: B256,
    pub to: Option<Address>,
    pub value: Option<U256>,
    pub status: DepositStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct L2ToL1Message {
    pub source_tx_hash: B256,
    /// Leaf index in the send accumulator.
    pub position: U256,
    pub caller: Address,
    pub destination: Address,
    pub l2_block: u64,
    pub l1_block: u64,
    pub call_value: U256,
    pub status: OutboxStatus,
    pub outbox_execution_receipt: Option<TxReceipt>,
}

/// One bridge message, shaped by its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrossChainMessage {
    RetryableTicket(RetryableTicket),
    EthDeposit(EthDeposit),
    L2ToL1Message(L2ToL1Message),
}

impl CrossChainMessage {
    pub fn source_chain(&self) -> ChainSide {
        match self {
            Self::RetryableTicket(_) | Self::EthDeposit(_) => ChainSide::L1,
            Self::L2ToL1Message(_) => ChainSide::L2,
        }
    }

    pub fn source_tx_hash(&self) -> Option<B256> {
        match self {
            Self::RetryableTicket(ticket) => ticket.source_tx_hash,
            Self::EthDeposit(deposit) => deposit.source_tx_hash,
            Self::L2ToL1Message(message) => Some(message.source_tx_hash),
        }
    }

    pub fn status(&self) -> String {
        match self {
            Self::RetryableTicket(ticket) => ticket.status.to_string(),
            Self::EthDeposit(deposit) => deposit.status.to_string(),
            Self::L2ToL1Message(message) => match message.status {
                OutboxStatus::Unconfirmed => "unconfirmed".to_string(),
                OutboxStatus::UnconfirmedPendingNode { .. } => "unconfirmed_pending_node".to_string(),
                OutboxStatus::Confirmed => "confirmed".to_string(),
                OutboxStatus::Executed => "executed".to_string(),
            },
        }
    }
}
