//! Bounded, chunked, directional log search over one chain.

use crate::error::{TraceError, TraceResult};
use alloy::{rpc::types::Log, sol_types::SolEvent};
use common::chain::{ChainDataPort, EventCriteria};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From `from_block` upwards, used when following a message to its destination.
    Forward,
    /// From `to_block` downwards, used when looking for the origin of a message.
    Backward,
}

/// A directional scan request. `max_blocks` bounds the blocks covered by all
/// chunks together; both ends of the range are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockWindow {
    pub from_block: u64,
    pub to_block: u64,
    pub chunk_size: u64,
    pub max_blocks: u64,
    pub direction: Direction,
}

impl BlockWindow {
    pub fn forward(from_block: u64, to_block: u64, chunk_size: u64, max_blocks: u64) -> Self {
        Self {
            from_block,
            to_block,
            chunk_size,
            max_blocks,
            direction: Direction::Forward,
        }
    }

    pub fn backward(from_block: u64, to_block: u64, chunk_size: u64, max_blocks: u64) -> Self {
        Self {
            from_block,
            to_block,
            chunk_size,
            max_blocks,
            direction: Direction::Backward,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome<T> {
    Found(T),
    /// The whole range was scanned without a match.
    RangeExhausted { blocks_scanned: u64 },
    /// `max_blocks` were scanned without a match, part of the range was left out.
    BudgetExceeded { blocks_scanned: u64 },
}

impl<T> ScanOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            ScanOutcome::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Maps both absence outcomes onto their error kinds.
    pub fn into_result(self, chain_id: u64, what: &str) -> TraceResult<T> {
        match self {
            ScanOutcome::Found(value) => Ok(value),
            ScanOutcome::RangeExhausted { .. } => Err(TraceError::not_found(what)),
            ScanOutcome::BudgetExceeded { blocks_scanned } => {
                Err(TraceError::SearchBudgetExceeded {
                    chain_id,
                    blocks_scanned,
                })
            }
        }
    }
}

/// One pass over a [`BlockWindow`]. Chunks are produced lazily, one
/// `eth_getLogs` each, and the scan cannot be rewound; start a new one instead.
pub struct WindowedScan<'a, P: ChainDataPort> {
    port: &'a P,
    criteria: EventCriteria,
    window: BlockWindow,
    // Next block to query: lower edge going forward, upper edge going backward.
    cursor: u64,
    blocks_scanned: u64,
    queries: u64,
    exhausted: bool,
}

impl<'a, P: ChainDataPort> WindowedScan<'a, P> {
    pub fn new(port: &'a P, criteria: EventCriteria, window: BlockWindow) -> Self {
        let cursor = match window.direction {
            Direction::Forward => window.from_block,
            Direction::Backward => window.to_block,
        };
        Self {
            port,
            criteria,
            window,
            cursor,
            blocks_scanned: 0,
            queries: 0,
            exhausted: window.from_block > window.to_block,
        }
    }

    pub fn blocks_scanned(&self) -> u64 {
        self.blocks_scanned
    }

    pub fn queries_issued(&self) -> u64 {
        self.queries
    }

    fn budget_left(&self) -> u64 {
        self.window.max_blocks.saturating_sub(self.blocks_scanned)
    }

    fn next_range(&mut self) -> Option<(u64, u64)> {
        let budget = self.budget_left();
        if self.exhausted || budget == 0 {
            return None;
        }
        let len = self.window.chunk_size.max(1).min(budget);
        let (from, to) = match self.window.direction {
            Direction::Forward => {
                let from = self.cursor;
                let to = from.saturating_add(len - 1).min(self.window.to_block);
                if to == self.window.to_block {
                    self.exhausted = true;
                } else {
                    self.cursor = to + 1;
                }
                (from, to)
            }
            Direction::Backward => {
                let from = self
                    .cursor
                    .saturating_sub(len - 1)
                    .max(self.window.from_block);
                let to = self.cursor;
                if from == self.window.from_block {
                    self.exhausted = true;
                } else {
                    self.cursor = from - 1;
                }
                (from, to)
            }
        };
        self.blocks_scanned += to - from + 1;
        Some((from, to))
    }

    /// Fetches the next chunk, returning its logs ordered by block number and
    /// log index. `None` once the range or the budget is used up.
    pub async fn next_chunk(&mut self) -> TraceResult<Option<Vec<Log>>> {
        let Some((from, to)) = self.next_range() else {
            return Ok(None);
        };
        self.queries += 1;
        debug!(
            "[chain_id: {}] Scanning logs {}..={} ({} of {} blocks)",
            self.port.chain_id(),
            from,
            to,
            self.blocks_scanned,
            self.window.max_blocks
        );
        let mut logs: Vec<Log> = self
            .port
            .get_logs(&self.criteria, from, to)
            .await?
            .into_iter()
            .filter(|log| self.criteria.matches(log))
            .collect();
        logs.sort_by_key(|log| (log.block_number, log.log_index));
        Ok(Some(logs))
    }

    /// How an unsuccessful scan ended, once `next_chunk` has returned `None`.
    pub fn outcome<T>(&self) -> ScanOutcome<T> {
        if self.exhausted {
            ScanOutcome::RangeExhausted {
                blocks_scanned: self.blocks_scanned,
            }
        } else {
            ScanOutcome::BudgetExceeded {
                blocks_scanned: self.blocks_scanned,
            }
        }
    }

    /// Runs the scan until `matcher` accepts a chunk. Matching happens per
    /// chunk so that related events of the same chunk can be paired up.
    pub async fn find_in_chunks<T>(
        &mut self,
        mut matcher: impl FnMut(&[Log]) -> Option<T>,
    ) -> TraceResult<ScanOutcome<T>> {
        while let Some(logs) = self.next_chunk().await? {
            if let Some(found) = matcher(&logs) {
                return Ok(ScanOutcome::Found(found));
            }
        }
        Ok(self.outcome())
    }

    /// Runs the scan until `matcher` accepts a single log. Within a chunk the
    /// first accepted log in block order wins, whatever the direction.
    pub async fn find<T>(
        &mut self,
        mut matcher: impl FnMut(&Log) -> Option<T>,
    ) -> TraceResult<ScanOutcome<T>> {
        self.find_in_chunks(|logs| logs.iter().find_map(&mut matcher))
            .await
    }
}

/// Decodes `log` as `E`, logging and skipping anything that does not fit.
pub fn decode_or_skip<E: SolEvent>(log: &Log) -> Option<E> {
    match log.log_decode::<E>() {
        Ok(decoded) => Some(decoded.inner.data),
        Err(e) => {
            debug!(
                "Skipping log {:?} of tx {:?}: not a {} ({})",
                log.log_index,
                log.transaction_hash,
                E::SIGNATURE,
                e
            );
            None
        }
    }
}
