//! Deterministic L2 transaction hashes of L1-to-L2 messages.

use crate::{
    error::{TraceError, TraceResult},
    l1::{L1_MESSAGE_TYPE_ETH_DEPOSIT, L1_MESSAGE_TYPE_SUBMIT_RETRYABLE},
};
use alloy::primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_rlp::{Encodable, Header};
use common::chain::{DEPOSIT_TX_TYPE, SUBMIT_RETRYABLE_TX_TYPE};

const WORD: usize = 32;

/// Payload of a submit-retryable inbox message: nine 32-byte words followed by the call data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableSubmission {
    pub destination: Address,
    pub l2_call_value: U256,
    pub l1_value: U256,
    pub max_submission_fee: U256,
    pub excess_fee_refund_address: Address,
    pub call_value_refund_address: Address,
    pub gas_limit: U256,
    pub max_fee_per_gas: U256,
    pub data: Bytes,
}

impl RetryableSubmission {
    pub fn parse(payload: &[u8]) -> TraceResult<Self> {
        let word = |index: usize| -> TraceResult<&[u8]> {
            payload
                .get(index * WORD..(index + 1) * WORD)
                .ok_or_else(|| TraceError::Decode("truncated retryable submission".into()))
        };
        let uint = |index: usize| word(index).map(U256::from_be_slice);
        let address = |index: usize| word(index).map(|w| Address::from_slice(&w[12..]));

        let data_length = usize::try_from(uint(8)?)
            .map_err(|_| TraceError::Decode("retryable data length overflows".into()))?;
        let data_start = 9 * WORD;
        let data = data_start
            .checked_add(data_length)
            .and_then(|end| payload.get(data_start..end))
            .ok_or_else(|| TraceError::Decode("retryable data shorter than declared".into()))?;

        Ok(Self {
            destination: address(0)?,
            l2_call_value: uint(1)?,
            l1_value: uint(2)?,
            max_submission_fee: uint(3)?,
            excess_fee_refund_address: address(4)?,
            call_value_refund_address: address(5)?,
            gas_limit: uint(6)?,
            max_fee_per_gas: uint(7)?,
            data: Bytes::copy_from_slice(data),
        })
    }

    /// Hash of the submit-retryable transaction, which is also the ticket id.
    /// `sender` is the address recorded by the bridge, already aliased.
    pub fn ticket_id(
        &self,
        l2_chain_id: u64,
        message_number: U256,
        sender: Address,
        l1_base_fee: U256,
    ) -> B256 {
        let message_number = B256::from(message_number);
        let empty = Bytes::new();
        // A contract creation carries an empty destination.
        let destination: &dyn Encodable = if self.destination == Address::ZERO {
            &empty
        } else {
            &self.destination
        };
        typed_rlp_hash(
            SUBMIT_RETRYABLE_TX_TYPE,
            &[
                &l2_chain_id,
                &message_number,
                &sender,
                &l1_base_fee,
                &self.l1_value,
                &self.max_fee_per_gas,
                &self.gas_limit,
                destination,
                &self.l2_call_value,
                &self.call_value_refund_address,
                &self.max_submission_fee,
                &self.excess_fee_refund_address,
                &self.data,
            ],
        )
    }
}

/// Payload of an ETH deposit inbox message: recipient followed by the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthDepositMessage {
    pub to: Address,
    pub value: U256,
}

impl EthDepositMessage {
    pub fn parse(payload: &[u8]) -> TraceResult<Self> {
        let (Some(to), Some(value)) = (payload.get(..20), payload.get(20..20 + WORD)) else {
            return Err(TraceError::Decode("truncated deposit message".into()));
        };
        Ok(Self {
            to: Address::from_slice(to),
            value: U256::from_be_slice(value),
        })
    }

    pub fn deposit_tx_hash(&self, l2_chain_id: u64, message_number: U256, sender: Address) -> B256 {
        typed_rlp_hash(
            DEPOSIT_TX_TYPE,
            &[
                &l2_chain_id,
                &B256::from(message_number),
                &sender,
                &self.to,
                &self.value,
            ],
        )
    }
}

/// An inbox message the L2 turns into a transaction of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum L1ToL2Payload {
    Retryable(RetryableSubmission),
    EthDeposit(EthDepositMessage),
}

impl L1ToL2Payload {
    /// `None` for inbox message kinds that do not map onto a single L2 transaction.
    pub fn parse(kind: u8, payload: &[u8]) -> TraceResult<Option<Self>> {
        match kind {
            L1_MESSAGE_TYPE_SUBMIT_RETRYABLE => {
                RetryableSubmission::parse(payload).map(|s| Some(Self::Retryable(s)))
            }
            L1_MESSAGE_TYPE_ETH_DEPOSIT => {
                EthDepositMessage::parse(payload).map(|d| Some(Self::EthDeposit(d)))
            }
            _ => Ok(None),
        }
    }

    pub fn l2_tx_hash(
        &self,
        l2_chain_id: u64,
        message_number: U256,
        sender: Address,
        l1_base_fee: U256,
    ) -> B256 {
        match self {
            Self::Retryable(submission) => {
                submission.ticket_id(l2_chain_id, message_number, sender, l1_base_fee)
            }
            Self::EthDeposit(deposit) => {
                deposit.deposit_tx_hash(l2_chain_id, message_number, sender)
            }
        }
    }
}

fn typed_rlp_hash(tx_type: u64, fields: &[&dyn Encodable]) -> B256 {
    let payload_length = fields.iter().map(|field| field.length()).sum();
    let header = Header {
        list: true,
        payload_length,
    };
    let mut out = Vec::with_capacity(1 + header.length() + payload_length);
    // Envelope types are single bytes.
    out.push(tx_type.to_be_bytes()[7]);
    header.encode(&mut out);
    for field in fields {
        field.encode(&mut out);
    }
    keccak256(out)
}

#[cfg(test)]
pub(crate) fn encode_submission(submission: &RetryableSubmission) -> Vec<u8> {
    let mut out = Vec::new();
    let address_word = |address: &Address| B256::left_padding_from(address.as_slice());
    out.extend_from_slice(address_word(&submission.destination).as_slice());
    for value in [
        submission.l2_call_value,
        submission.l1_value,
        submission.max_submission_fee,
    ] {
        out.extend_from_slice(&value.to_be_bytes::<32>());
    }
    out.extend_from_slice(address_word(&submission.excess_fee_refund_address).as_slice());
    out.extend_from_slice(address_word(&submission.call_value_refund_address).as_slice());
    for value in [
        submission.gas_limit,
        submission.max_fee_per_gas,
        U256::from(submission.data.len()),
    ] {
        out.extend_from_slice(&value.to_be_bytes::<32>());
    }
    out.extend_from_slice(&submission.data);
    out
}

#[cfg(test)]
pub(crate) fn sample_submission() -> RetryableSubmission {
    RetryableSubmission {
        destination: Address::repeat_byte(0xde),
        l2_call_value: U256::from(1_000u64),
        l1_value: U256::from(5_000_000_000_000_000u64),
        max_submission_fee: U256::from(300_000_000_000u64),
        excess_fee_refund_address: Address::repeat_byte(0xe1),
        call_value_refund_address: Address::repeat_byte(0xe2),
        gas_limit: U256::from(120_000u64),
        max_fee_per_gas: U256::from(200_000_000u64),
        data: Bytes::from(vec![0xca, 0xfe, 0xba, 0xbe]),
    }
}
