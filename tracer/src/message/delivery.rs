use super::ids::L1ToL2Payload;
use crate::{
    l1::bindings::{Bridge, Inbox},
    scanner::decode_or_skip,
    utils::config::ContractAddresses,
};
use alloy::{
    primitives::{Address, B256, Bytes, U256},
    rpc::types::Log,
    sol_types::SolEvent,
};
use common::chain::EventCriteria;
use tracing::debug;

/// An inbox message as recorded on L1: the bridge's `MessageDelivered`
/// joined with the inbox's `InboxMessageDelivered` carrying the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxDelivery {
    pub message_number: U256,
    pub kind: u8,
    pub sender: Address,
    pub base_fee_l1: U256,
    pub data: Bytes,
    pub l1_tx_hash: Option<B256>,
    pub l1_block: Option<u64>,
}

impl InboxDelivery {
    /// Both delivery events of the configured bridge and inbox, for one scan.
    pub fn criteria(contracts: &ContractAddresses) -> EventCriteria {
        EventCriteria::new(contracts.bridge, Bridge::MessageDelivered::SIGNATURE_HASH)
            .with_address(contracts.inbox)
            .with_signature(Inbox::InboxMessageDelivered::SIGNATURE_HASH)
    }

    /// Joins delivery events by message number, in the order of the bridge events.
    /// Logs that fail to decode, or come from other contracts, are skipped.
    pub fn pair(logs: &[Log], contracts: &ContractAddresses) -> Vec<InboxDelivery> {
        let payloads: Vec<(U256, Bytes)> = logs
            .iter()
            .filter(|log| log.address() == contracts.inbox)
            .filter(|log| log.topic0() == Some(&Inbox::InboxMessageDelivered::SIGNATURE_HASH))
            .filter_map(decode_or_skip::<Inbox::InboxMessageDelivered>)
            .map(|event| (event.messageNum, event.data))
            .collect();

        logs.iter()
            .filter(|log| log.address() == contracts.bridge)
            .filter(|log| log.topic0() == Some(&Bridge::MessageDelivered::SIGNATURE_HASH))
            .filter_map(|log| {
                let delivered = decode_or_skip::<Bridge::MessageDelivered>(log)?;
                let Some((_, data)) = payloads
                    .iter()
                    .find(|(number, _)| *number == delivered.messageIndex)
                else {
                    debug!(
                        "No inbox payload for message {} in tx {:?}",
                        delivered.messageIndex, log.transaction_hash
                    );
                    return None;
                };
                Some(InboxDelivery {
                    message_number: delivered.messageIndex,
                    kind: delivered.kind,
                    sender: delivered.sender,
                    base_fee_l1: delivered.baseFeeL1,
                    data: data.clone(),
                    l1_tx_hash: log.transaction_hash,
                    l1_block: log.block_number,
                })
            })
            .collect()
    }

    /// The L2 payload, or `None` for kinds without an L2 transaction of their
    /// own and for payloads that fail to parse.
    pub fn payload(&self) -> Option<L1ToL2Payload> {
        match L1ToL2Payload::parse(self.kind, &self.data) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Skipping inbox message {}: {}", self.message_number, e);
                None
            }
        }
    }

    /// Hash of the L2 transaction this message turns into.
    pub fn l2_tx_hash(&self, l2_chain_id: u64) -> Option<B256> {
        self.payload().map(|payload| {
            payload.l2_tx_hash(l2_chain_id, self.message_number, self.sender, self.base_fee_l1)
        })
    }
}
