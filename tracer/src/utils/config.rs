use crate::l1::{
    DEFAULT_BRIDGE_ADDRESS, DEFAULT_INBOX_ADDRESS, DEFAULT_OUTBOX_ADDRESS, DEFAULT_ROLLUP_ADDRESS,
    DEFAULT_SEQUENCER_INBOX_ADDRESS,
};
use alloy::primitives::Address;
use anyhow::Error;
use common::config::{ConfigTrait, read_address_or, read_u64};
use std::fmt;

#[derive(Debug, Clone)]
pub struct ContractAddresses {
    pub rollup: Address,
    pub bridge: Address,
    pub inbox: Address,
    pub sequencer_inbox: Address,
    pub outbox: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            rollup: DEFAULT_ROLLUP_ADDRESS,
            bridge: DEFAULT_BRIDGE_ADDRESS,
            inbox: DEFAULT_INBOX_ADDRESS,
            sequencer_inbox: DEFAULT_SEQUENCER_INBOX_ADDRESS,
            outbox: DEFAULT_OUTBOX_ADDRESS,
        }
    }
}

/// Block budget and chunk size of the windowed scans on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_blocks: u64,
    pub chunk_size: u64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_blocks: 10_000,
            chunk_size: 1_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TracerConfig {
    pub contract_addresses: ContractAddresses,
    /// Lower bound for the single-shot lookups that rely on full log history.
    pub rollup_deploy_l1_block: u64,
    pub l1_search: SearchLimits,
    pub l2_search: SearchLimits,
    /// Outbox executions are searched from this many L1 blocks after the
    /// message's L1 block. Heuristic: one week of L1 blocks.
    pub l1_one_week_block_offset: u64,
    /// Average L1 block time. Heuristic, used for ETAs and lookback windows.
    pub l1_block_time_ms: u64,
    pub l1_slots_per_epoch: u64,
    /// Padding before the L1 block of an L2 block when looking for the node
    /// that covers it. Heuristic: nodes are produced roughly hourly.
    pub node_lookback_secs: u64,
    pub retryable_lifetime_secs: u64,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            contract_addresses: ContractAddresses::default(),
            rollup_deploy_l1_block: 0,
            l1_search: SearchLimits::default(),
            l2_search: SearchLimits::default(),
            l1_one_week_block_offset: 45_000,
            l1_block_time_ms: 12_500,
            l1_slots_per_epoch: 32,
            node_lookback_secs: 7_200,
            retryable_lifetime_secs: 604_800,
        }
    }
}

impl TracerConfig {
    /// Number of L1 blocks covered by `node_lookback_secs`.
    pub fn node_lookback_blocks(&self) -> u64 {
        self.node_lookback_secs
            .saturating_mul(1000)
            .checked_div(self.l1_block_time_ms)
            .unwrap_or(0)
    }
}

impl ConfigTrait for TracerConfig {
    fn read_env_variables() -> Result<Self, Error> {
        let defaults = TracerConfig::default();

        let contract_addresses = ContractAddresses {
            rollup: read_address_or("ROLLUP_ADDRESS", "Rollup", defaults.contract_addresses.rollup)?,
            bridge: read_address_or("BRIDGE_ADDRESS", "Bridge", defaults.contract_addresses.bridge)?,
            inbox: read_address_or("INBOX_ADDRESS", "Inbox", defaults.contract_addresses.inbox)?,
            sequencer_inbox: read_address_or(
                "SEQUENCER_INBOX_ADDRESS",
                "SequencerInbox",
                defaults.contract_addresses.sequencer_inbox,
            )?,
            outbox: read_address_or("OUTBOX_ADDRESS", "Outbox", defaults.contract_addresses.outbox)?,
        };

        let l1_search = SearchLimits {
            max_blocks: read_u64("L1_MAX_SEARCHABLE_BLOCKS", defaults.l1_search.max_blocks)?,
            chunk_size: read_u64("L1_SEARCHABLE_BLOCK_CHUNK", defaults.l1_search.chunk_size)?,
        };
        let l2_search = SearchLimits {
            max_blocks: read_u64("L2_MAX_SEARCHABLE_BLOCKS", defaults.l2_search.max_blocks)?,
            chunk_size: read_u64("L2_SEARCHABLE_BLOCK_CHUNK", defaults.l2_search.chunk_size)?,
        };
        if l1_search.chunk_size == 0 || l2_search.chunk_size == 0 {
            return Err(anyhow::anyhow!("Searchable block chunk must be greater than 0"));
        }

        let l1_block_time_ms = read_u64("L1_BLOCK_TIME_MS", defaults.l1_block_time_ms)?;
        if l1_block_time_ms == 0 {
            return Err(anyhow::anyhow!("L1_BLOCK_TIME_MS must be greater than 0"));
        }

        Ok(TracerConfig {
            contract_addresses,
            rollup_deploy_l1_block: read_u64(
                "ROLLUP_DEPLOY_L1_BLOCK",
                defaults.rollup_deploy_l1_block,
            )?,
            l1_search,
            l2_search,
            l1_one_week_block_offset: read_u64(
                "L1_ONE_WEEK_BLOCK_OFFSET",
                defaults.l1_one_week_block_offset,
            )?,
            l1_block_time_ms,
            l1_slots_per_epoch: read_u64("L1_SLOTS_PER_EPOCH", defaults.l1_slots_per_epoch)?,
            node_lookback_secs: read_u64("NODE_LOOKBACK_SECS", defaults.node_lookback_secs)?,
            retryable_lifetime_secs: read_u64(
                "RETRYABLE_LIFETIME_SECS",
                defaults.retryable_lifetime_secs,
            )?,
        })
    }
}

impl fmt::Display for TracerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Contract addresses: {:#?}", self.contract_addresses)?;
        writeln!(f, "Rollup deploy L1 block: {}", self.rollup_deploy_l1_block)?;
        writeln!(
            f,
            "L1 search: {} blocks in chunks of {}",
            self.l1_search.max_blocks, self.l1_search.chunk_size
        )?;
        writeln!(
            f,
            "L2 search: {} blocks in chunks of {}",
            self.l2_search.max_blocks, self.l2_search.chunk_size
        )?;
        writeln!(f, "L1 one week block offset: {}", self.l1_one_week_block_offset)?;
        writeln!(f, "L1 block time: {}ms", self.l1_block_time_ms)?;
        writeln!(f, "L1 slots per epoch: {}", self.l1_slots_per_epoch)?;
        writeln!(f, "Node lookback: {}s", self.node_lookback_secs)?;
        writeln!(f, "Retryable lifetime: {}s", self.retryable_lifetime_secs)?;
        Ok(())
    }
}
