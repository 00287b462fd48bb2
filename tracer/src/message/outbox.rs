use super::{CrossChainMessage, L2ToL1Message, OutboxStatus, classifier::MessageClassifier};
use crate::{
    error::{TraceError, TraceResult},
    l1::bindings::Outbox,
    l2::{ARB_SYS_ADDRESS, bindings::ArbSys},
    message::ChainSide,
    result::MessageSearchResult,
    rollup::{LinearNodeGraph, NodeGraph, RollupNode},
    scanner::{BlockWindow, ScanOutcome, WindowedScan, decode_or_skip},
    utils::calls::view_call,
};
use alloy::{
    primitives::{B256, U256},
    sol_types::SolEvent,
};
use common::chain::{BlockRef, ChainDataPort, EventCriteria, TxReceipt};
use tracing::{debug, info, warn};

fn to_block_number(value: U256, what: &str) -> TraceResult<u64> {
    u64::try_from(value).map_err(|_| TraceError::Decode(format!("{what} {value} out of range")))
}

impl<L1: ChainDataPort, L2: ChainDataPort> MessageClassifier<'_, L1, L2> {
    /// L2-to-L1 messages sent by an L2 transaction, each with its outbox status.
    pub async fn trace_l2_to_l1(&self, tx_hash: B256) -> TraceResult<MessageSearchResult> {
        let Some(receipt) = self.l2.get_transaction_receipt(tx_hash).await? else {
            info!("Transaction {} not found on L2", tx_hash);
            return Ok(MessageSearchResult::not_found(tx_hash));
        };
        let mut result =
            MessageSearchResult::new(tx_hash, ChainSide::L2, receipt.block_number);
        result.messages = self.l2_to_l1_messages(&receipt).await?;
        Ok(result)
    }

    pub(super) async fn l2_to_l1_messages(
        &self,
        receipt: &TxReceipt,
    ) -> TraceResult<Vec<CrossChainMessage>> {
        let events: Vec<ArbSys::L2ToL1Tx> = receipt
            .logs
            .iter()
            .filter(|log| log.address() == ARB_SYS_ADDRESS)
            .filter(|log| log.topic0() == Some(&ArbSys::L2ToL1Tx::SIGNATURE_HASH))
            .filter_map(decode_or_skip::<ArbSys::L2ToL1Tx>)
            .collect();

        let mut messages = Vec::with_capacity(events.len());
        for event in events {
            let message = self
                .l2_to_l1_message(event, receipt.transaction_hash)
                .await?;
            messages.push(CrossChainMessage::L2ToL1Message(message));
        }
        Ok(messages)
    }

    async fn l2_to_l1_message(
        &self,
        event: ArbSys::L2ToL1Tx,
        source_tx_hash: B256,
    ) -> TraceResult<L2ToL1Message> {
        let status = self.outbox_status(event.position).await?;
        info!("L2-to-L1 message {}: {:?}", event.position, status);
        let outbox_execution_receipt = if status == OutboxStatus::Executed {
            self.find_outbox_execution(&event).await?
        } else {
            None
        };
        Ok(L2ToL1Message {
            source_tx_hash,
            position: event.position,
            caller: event.caller,
            destination: event.destination,
            l2_block: to_block_number(event.arbBlockNum, "L2 block")?,
            l1_block: to_block_number(event.ethBlockNum, "L1 block")?,
            call_value: event.callvalue,
            status,
            outbox_execution_receipt,
        })
    }

    /// Messages below the send count of the latest confirmed node are
    /// executable; the outbox bitmap tells whether they were executed.
    /// Later messages wait for the first created node whose send count
    /// covers them.
    pub async fn outbox_status(&self, position: U256) -> TraceResult<OutboxStatus> {
        let (latest_confirmed, latest_created) = tokio::try_join!(
            self.reader.latest_confirmed_id(),
            self.reader.latest_created_id()
        )?;

        let confirmed = self.reader.get_node(latest_confirmed).await?;
        if position < U256::from(self.node_send_count(&confirmed).await?) {
            let spent = view_call(
                self.l1,
                self.config.contract_addresses.outbox,
                Outbox::isSpentCall { index: position },
            )
            .await?;
            return Ok(if spent {
                OutboxStatus::Executed
            } else {
                OutboxStatus::Confirmed
            });
        }

        let graph = LinearNodeGraph::new(latest_created);
        self.first_pending_node_covering(&graph, latest_confirmed, position)
            .await
    }

    async fn first_pending_node_covering<G: NodeGraph>(
        &self,
        graph: &G,
        latest_confirmed: u64,
        position: U256,
    ) -> TraceResult<OutboxStatus> {
        let mut current = latest_confirmed;
        while let Some(next) = graph.next_on_canonical_path(current).await? {
            current = next;
            let node = match self.reader.get_node(next).await {
                Ok(node) => node,
                Err(e) if e.is_absence() => {
                    debug!("Skipping node {}: {}", next, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if position < U256::from(self.node_send_count(&node).await?) {
                let estimated_confirmation = self.reader.estimate_confirmation_date(&node).await?;
                return Ok(OutboxStatus::UnconfirmedPendingNode {
                    node_id: next,
                    estimated_confirmation,
                });
            }
        }
        Ok(OutboxStatus::Unconfirmed)
    }

    /// Send count recorded in the L2 block a node's after state points at.
    async fn node_send_count(&self, node: &RollupNode) -> TraceResult<u64> {
        let block = self
            .l2
            .get_block(BlockRef::Hash(node.after_state.l2_block_hash))
            .await?
            .ok_or_else(|| {
                TraceError::not_found(format!("L2 block {}", node.after_state.l2_block_hash))
            })?;
        block.send_count.ok_or_else(|| {
            TraceError::Decode(format!("L2 block {} carries no sendCount", block.number))
        })
    }

    /// Executions cannot happen before the dispute period has passed, so the
    /// scan starts one week of L1 blocks after the message was sent.
    async fn find_outbox_execution(&self, event: &ArbSys::L2ToL1Tx) -> TraceResult<Option<TxReceipt>> {
        let from_block = to_block_number(event.ethBlockNum, "L1 block")?
            .saturating_add(self.config.l1_one_week_block_offset);
        let head = self.l1.get_block_number().await?;
        let criteria = EventCriteria::new(
            self.config.contract_addresses.outbox,
            Outbox::OutBoxTransactionExecuted::SIGNATURE_HASH,
        )
        .with_indexed(0, event.destination.into_word())
        .with_indexed(1, event.caller.into_word());
        let window = BlockWindow::forward(
            from_block,
            head,
            self.config.l1_search.chunk_size,
            self.config.l1_search.max_blocks,
        );

        let outcome = WindowedScan::new(self.l1, criteria, window)
            .find(|log| {
                decode_or_skip::<Outbox::OutBoxTransactionExecuted>(log)
                    .filter(|executed| executed.transactionIndex == event.position)
                    .and(log.transaction_hash)
            })
            .await?;
        match outcome {
            ScanOutcome::Found(tx_hash) => Ok(self.l1.get_transaction_receipt(tx_hash).await?),
            absent => {
                warn!(
                    "Outbox execution of message {} not found from L1 block {}: {:?}",
                    event.position, from_block, absent
                );
                Ok(None)
            }
        }
    }
}
