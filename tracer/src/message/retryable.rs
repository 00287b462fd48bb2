use super::{
    CrossChainMessage, DepositStatus, EthDeposit, RetryableStatus, RetryableTicket,
    classifier::MessageClassifier, ids::EthDepositMessage,
};
use crate::{
    error::{TraceError, TraceResult},
    l2::{ARB_RETRYABLE_TX_ADDRESS, bindings::ArbRetryableTx},
    scanner::{BlockWindow, ScanOutcome, WindowedScan, decode_or_skip},
};
use alloy::{
    primitives::{B256, U256},
    sol_types::SolEvent,
};
use common::chain::{BlockRef, ChainDataPort, EventCriteria, TxReceipt};
use tracing::{debug, info, warn};

struct Redemption {
    status: RetryableStatus,
    redeem_tx_hash: Option<B256>,
    creation_receipt: Option<TxReceipt>,
}

impl<L1: ChainDataPort, L2: ChainDataPort> MessageClassifier<'_, L1, L2> {
    pub(super) async fn retryable_message(
        &self,
        ticket_id: B256,
        source_tx_hash: Option<B256>,
        message_number: Option<U256>,
    ) -> TraceResult<CrossChainMessage> {
        let redemption = self.track_retryable(ticket_id).await?;
        info!("Retryable ticket {}: {}", ticket_id, redemption.status);
        Ok(CrossChainMessage::RetryableTicket(RetryableTicket {
            source_tx_hash,
            message_number,
            ticket_id,
            status: redemption.status,
            redeem_tx_hash: redemption.redeem_tx_hash,
            creation_receipt: redemption.creation_receipt,
        }))
    }

    pub(super) async fn deposit_message(
        &self,
        deposit_tx_hash: B256,
        source_tx_hash: Option<B256>,
        message_number: Option<U256>,
        deposit: Option<EthDepositMessage>,
    ) -> TraceResult<CrossChainMessage> {
        let receipt = self.l2.get_transaction_receipt(deposit_tx_hash).await?;
        let status = if receipt.is_some() {
            DepositStatus::Deposited
        } else {
            DepositStatus::Pending
        };
        info!("ETH deposit {}: {}", deposit_tx_hash, status);
        Ok(CrossChainMessage::EthDeposit(EthDeposit {
            source_tx_hash,
            message_number,
            deposit_tx_hash,
            to: deposit.map(|d| d.to),
            value: deposit.map(|d| d.value),
            status,
        }))
    }

    async fn track_retryable(&self, ticket_id: B256) -> TraceResult<Redemption> {
        let Some(creation) = self.l2.get_transaction_receipt(ticket_id).await? else {
            return Ok(Redemption {
                status: RetryableStatus::Pending,
                redeem_tx_hash: None,
                creation_receipt: None,
            });
        };
        if !creation.is_success() {
            return Ok(Redemption {
                status: RetryableStatus::CreationFailed,
                redeem_tx_hash: None,
                creation_receipt: Some(creation),
            });
        }

        let scheduled: Vec<ArbRetryableTx::RedeemScheduled> = creation
            .logs
            .iter()
            .filter(|log| log.address() == ARB_RETRYABLE_TX_ADDRESS)
            .filter(|log| log.topic0() == Some(&ArbRetryableTx::RedeemScheduled::SIGNATURE_HASH))
            .filter_map(decode_or_skip::<ArbRetryableTx::RedeemScheduled>)
            .filter(|event| event.ticketId == ticket_id)
            .collect();
        if scheduled.len() > 1 {
            return Err(TraceError::AmbiguousMatch(format!(
                "{} RedeemScheduled events for ticket {} in its creation receipt",
                scheduled.len(),
                ticket_id
            )));
        }

        if let Some(auto_redeem) = scheduled.first() {
            if self.redeem_succeeded(auto_redeem.retryTxHash).await? {
                return Ok(Redemption {
                    status: RetryableStatus::Redeemed,
                    redeem_tx_hash: Some(auto_redeem.retryTxHash),
                    creation_receipt: Some(creation),
                });
            }
            debug!("Auto-redeem {} of ticket {} failed", auto_redeem.retryTxHash, ticket_id);
        }

        let (status, redeem_tx_hash) = match self
            .find_manual_redeem(ticket_id, creation.block_number)
            .await?
        {
            ScanOutcome::Found(retry_tx) => (RetryableStatus::Redeemed, Some(retry_tx)),
            // Expiry says nothing while a redeem may lie past the budget.
            ScanOutcome::BudgetExceeded { blocks_scanned } => {
                warn!(
                    "No successful redeem of ticket {} in {} L2 blocks, search budget used up",
                    ticket_id, blocks_scanned
                );
                (RetryableStatus::RedeemSearchExhausted { blocks_scanned }, None)
            }
            ScanOutcome::RangeExhausted { .. } if self.is_expired(&creation).await? => {
                (RetryableStatus::Expired, None)
            }
            ScanOutcome::RangeExhausted { .. } => (RetryableStatus::FundsDeposited, None),
        };
        Ok(Redemption {
            status,
            redeem_tx_hash,
            creation_receipt: Some(creation),
        })
    }

    async fn redeem_succeeded(&self, retry_tx: B256) -> TraceResult<bool> {
        Ok(self
            .l2
            .get_transaction_receipt(retry_tx)
            .await?
            .is_some_and(|receipt| receipt.is_success()))
    }

    /// First successful redeem of `ticket_id` scheduled after its creation.
    async fn find_manual_redeem(
        &self,
        ticket_id: B256,
        from_block: u64,
    ) -> TraceResult<ScanOutcome<B256>> {
        let head = self.l2.get_block_number().await?;
        let criteria = EventCriteria::new(
            ARB_RETRYABLE_TX_ADDRESS,
            ArbRetryableTx::RedeemScheduled::SIGNATURE_HASH,
        )
        .with_indexed(0, ticket_id);
        let window = BlockWindow::forward(
            from_block,
            head,
            self.config.l2_search.chunk_size,
            self.config.l2_search.max_blocks,
        );
        let mut scan = WindowedScan::new(self.l2, criteria, window);

        while let Some(logs) = scan.next_chunk().await? {
            for event in logs
                .iter()
                .filter_map(decode_or_skip::<ArbRetryableTx::RedeemScheduled>)
            {
                if self.redeem_succeeded(event.retryTxHash).await? {
                    return Ok(ScanOutcome::Found(event.retryTxHash));
                }
            }
        }
        debug!(
            "No successful redeem of ticket {} in {} L2 blocks",
            ticket_id,
            scan.blocks_scanned()
        );
        Ok(scan.outcome())
    }

    /// Lifetime extensions (`keepalive`) are not taken into account.
    async fn is_expired(&self, creation: &TxReceipt) -> TraceResult<bool> {
        let (created, head) = tokio::try_join!(
            self.l2.get_block(BlockRef::Number(creation.block_number)),
            self.l2.get_block(BlockRef::Latest)
        )?;
        let created = created
            .ok_or_else(|| TraceError::not_found(format!("L2 block {}", creation.block_number)))?;
        let head = head.ok_or_else(|| TraceError::not_found("latest L2 block"))?;
        Ok(head.timestamp
            >= created
                .timestamp
                .saturating_add(self.config.retryable_lifetime_secs))
    }
}
