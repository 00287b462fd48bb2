use super::{CrossChainMessage, delivery::InboxDelivery, ids::L1ToL2Payload};
use crate::{
    batch::BatchLocator,
    error::TraceResult,
    l2::{ARB_RETRYABLE_TX_ADDRESS, bindings::ArbRetryableTx},
    message::ChainSide,
    result::{MessageSearchResult, OriginSearch},
    rollup::RollupStateReader,
    scanner::{BlockWindow, ScanOutcome, WindowedScan, decode_or_skip},
    utils::config::TracerConfig,
};
use alloy::{primitives::B256, sol_types::SolEvent};
use common::chain::{
    ChainDataPort, DEPOSIT_TX_TYPE, EventCriteria, RETRY_TX_TYPE, SUBMIT_RETRYABLE_TX_TYPE,
    TxReceipt,
};
use tracing::{debug, info, warn};

/// What an L2 receipt says about the L1 message behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum L2Origin {
    RetryableTicket(B256),
    EthDeposit(B256),
    /// A retry whose `RedeemScheduled` event was not found within the L2 window.
    UnresolvedRetry { blocks_scanned: u64 },
    NotL1Originated,
}

/// Correlates one transaction hash with the bridge messages it took part in.
pub struct MessageClassifier<'a, L1: ChainDataPort, L2: ChainDataPort> {
    pub(super) l1: &'a L1,
    pub(super) l2: &'a L2,
    pub(super) config: &'a TracerConfig,
    pub(super) reader: RollupStateReader<'a, L1, L2>,
    pub(super) batches: BatchLocator<'a, L1, L2>,
}

impl<'a, L1: ChainDataPort, L2: ChainDataPort> MessageClassifier<'a, L1, L2> {
    pub fn new(l1: &'a L1, l2: &'a L2, config: &'a TracerConfig) -> Self {
        Self {
            l1,
            l2,
            config,
            reader: RollupStateReader::new(l1, l2, config),
            batches: BatchLocator::new(l1, l2, config),
        }
    }

    /// Follows an L1 transaction forward to its L2 effects, or an L2
    /// transaction back to its L1 origin. A hash known to neither chain
    /// yields an empty result, not an error.
    pub async fn locate(&self, tx_hash: B256) -> TraceResult<MessageSearchResult> {
        let (l1_receipt, l2_receipt) = tokio::try_join!(
            self.l1.get_transaction_receipt(tx_hash),
            self.l2.get_transaction_receipt(tx_hash)
        )?;

        if let Some(receipt) = l1_receipt {
            info!("Transaction {} found on L1 in block {}", tx_hash, receipt.block_number);
            return self.forward_from_l1(&receipt).await;
        }
        if let Some(receipt) = l2_receipt {
            info!("Transaction {} found on L2 in block {}", tx_hash, receipt.block_number);
            return self.backward_from_l2(&receipt).await;
        }

        info!("Transaction {} found neither on L1 nor on L2", tx_hash);
        Ok(MessageSearchResult::not_found(tx_hash))
    }

    async fn forward_from_l1(&self, receipt: &TxReceipt) -> TraceResult<MessageSearchResult> {
        let mut result = MessageSearchResult::new(
            receipt.transaction_hash,
            ChainSide::L1,
            receipt.block_number,
        );
        let deliveries = InboxDelivery::pair(&receipt.logs, &self.config.contract_addresses);
        debug!(
            "{} inbox messages in L1 tx {}",
            deliveries.len(),
            receipt.transaction_hash
        );

        for delivery in &deliveries {
            if let Some(message) = self.message_from_delivery(delivery).await? {
                result.messages.push(message);
            }
        }
        Ok(result)
    }

    async fn message_from_delivery(
        &self,
        delivery: &InboxDelivery,
    ) -> TraceResult<Option<CrossChainMessage>> {
        let Some(payload) = delivery.payload() else {
            return Ok(None);
        };
        let l2_tx_hash = payload.l2_tx_hash(
            self.l2.chain_id(),
            delivery.message_number,
            delivery.sender,
            delivery.base_fee_l1,
        );
        let message = match payload {
            L1ToL2Payload::Retryable(_) => {
                self.retryable_message(
                    l2_tx_hash,
                    delivery.l1_tx_hash,
                    Some(delivery.message_number),
                )
                .await?
            }
            L1ToL2Payload::EthDeposit(deposit) => {
                self.deposit_message(
                    l2_tx_hash,
                    delivery.l1_tx_hash,
                    Some(delivery.message_number),
                    Some(deposit),
                )
                .await?
            }
        };
        Ok(Some(message))
    }

    async fn backward_from_l2(&self, receipt: &TxReceipt) -> TraceResult<MessageSearchResult> {
        let mut result = MessageSearchResult::new(
            receipt.transaction_hash,
            ChainSide::L2,
            receipt.block_number,
        );

        let l2_origin = self.l2_origin(receipt).await?;
        let (origin, message) = match l2_origin {
            L2Origin::NotL1Originated => (OriginSearch::NotL1Originated, None),
            L2Origin::UnresolvedRetry { blocks_scanned } => {
                warn!(
                    "No RedeemScheduled event for retry tx {} in the previous {} L2 blocks",
                    receipt.transaction_hash, blocks_scanned
                );
                let reason = format!(
                    "retry without a RedeemScheduled event in the previous {blocks_scanned} L2 blocks"
                );
                (OriginSearch::Unresolved { reason }, None)
            }
            L2Origin::RetryableTicket(target) | L2Origin::EthDeposit(target) => {
                match self.find_l1_delivery(receipt.block_number, target).await? {
                    ScanOutcome::Found(delivery) => (
                        OriginSearch::Found {
                            l1_tx_hash: delivery.l1_tx_hash,
                            l1_block: delivery.l1_block,
                        },
                        self.message_from_delivery(&delivery).await?,
                    ),
                    ScanOutcome::RangeExhausted { blocks_scanned } => (
                        OriginSearch::NotFound { blocks_scanned },
                        self.l2_side_message(&l2_origin).await?,
                    ),
                    ScanOutcome::BudgetExceeded { blocks_scanned } => (
                        OriginSearch::BudgetExceeded {
                            chain_id: self.l1.chain_id(),
                            blocks_scanned,
                        },
                        self.l2_side_message(&l2_origin).await?,
                    ),
                }
            }
        };
        result.origin = Some(origin);
        result.messages.extend(message);

        result
            .messages
            .extend(self.l2_to_l1_messages(receipt).await?);
        Ok(result)
    }

    /// The message as seen from L2 alone, when its L1 origin is out of reach.
    async fn l2_side_message(&self, origin: &L2Origin) -> TraceResult<Option<CrossChainMessage>> {
        match origin {
            L2Origin::RetryableTicket(ticket_id) => self
                .retryable_message(*ticket_id, None, None)
                .await
                .map(Some),
            L2Origin::EthDeposit(hash) => self
                .deposit_message(*hash, None, None, None)
                .await
                .map(Some),
            L2Origin::UnresolvedRetry { .. } | L2Origin::NotL1Originated => Ok(None),
        }
    }

    /// Ticket creations and deposits carry their own id as transaction hash.
    /// A retry is tied to its ticket by the `RedeemScheduled` event that
    /// scheduled it, searched backwards on L2.
    async fn l2_origin(&self, receipt: &TxReceipt) -> TraceResult<L2Origin> {
        match receipt.tx_type {
            SUBMIT_RETRYABLE_TX_TYPE => Ok(L2Origin::RetryableTicket(receipt.transaction_hash)),
            DEPOSIT_TX_TYPE => Ok(L2Origin::EthDeposit(receipt.transaction_hash)),
            RETRY_TX_TYPE => {
                let outcome = self.find_redeem_scheduling(receipt).await?;
                Ok(match outcome {
                    ScanOutcome::Found(ticket_id) => L2Origin::RetryableTicket(ticket_id),
                    ScanOutcome::RangeExhausted { blocks_scanned }
                    | ScanOutcome::BudgetExceeded { blocks_scanned } => {
                        L2Origin::UnresolvedRetry { blocks_scanned }
                    }
                })
            }
            _ => Ok(L2Origin::NotL1Originated),
        }
    }

    async fn find_redeem_scheduling(&self, receipt: &TxReceipt) -> TraceResult<ScanOutcome<B256>> {
        let retry_tx = receipt.transaction_hash;
        let criteria = EventCriteria::new(
            ARB_RETRYABLE_TX_ADDRESS,
            ArbRetryableTx::RedeemScheduled::SIGNATURE_HASH,
        )
        .with_indexed(1, retry_tx);
        let window = BlockWindow::backward(
            0,
            receipt.block_number,
            self.config.l2_search.chunk_size,
            self.config.l2_search.max_blocks,
        );
        WindowedScan::new(self.l2, criteria, window)
            .find(|log| {
                decode_or_skip::<ArbRetryableTx::RedeemScheduled>(log)
                    .filter(|event| event.retryTxHash == retry_tx)
                    .map(|event| event.ticketId)
            })
            .await
    }

    /// Searches L1 backwards from the batch that posted `l2_block` for the
    /// inbox message whose derived L2 transaction hash is `target`.
    async fn find_l1_delivery(
        &self,
        l2_block: u64,
        target: B256,
    ) -> TraceResult<ScanOutcome<InboxDelivery>> {
        let anchor = match self.batches.batch_delivery_block(l2_block).await? {
            Some(l1_block) => l1_block,
            None => {
                debug!("L2 block {} not posted yet, searching from the L1 head", l2_block);
                self.l1.get_block_number().await?
            }
        };
        let contracts = &self.config.contract_addresses;
        let l2_chain_id = self.l2.chain_id();
        let window = BlockWindow::backward(
            self.config.rollup_deploy_l1_block,
            anchor,
            self.config.l1_search.chunk_size,
            self.config.l1_search.max_blocks,
        );
        WindowedScan::new(self.l1, InboxDelivery::criteria(contracts), window)
            .find_in_chunks(|logs| {
                InboxDelivery::pair(logs, contracts)
                    .into_iter()
                    .find(|delivery| delivery.l2_tx_hash(l2_chain_id) == Some(target))
            })
            .await
    }
}
