use alloy::{
    primitives::{Address, B256},
    rpc::types::{Filter, Log},
};

/// Event-matching criteria: emitting contracts, accepted event signatures and
/// equality constraints on the indexed parameters (topics 1..=3).
///
/// Passed by value to the log scanner so that scanning stays independent of
/// any particular event binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCriteria {
    pub addresses: Vec<Address>,
    pub signatures: Vec<B256>,
    pub indexed: [Option<B256>; 3],
}

impl EventCriteria {
    pub fn new(address: Address, signature: B256) -> Self {
        Self {
            addresses: vec![address],
            signatures: vec![signature],
            indexed: [None; 3],
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.addresses.push(address);
        self
    }

    pub fn with_signature(mut self, signature: B256) -> Self {
        self.signatures.push(signature);
        self
    }

    /// Constrains indexed parameter `position` (0-based, i.e. topic `position + 1`).
    pub fn with_indexed(mut self, position: usize, value: B256) -> Self {
        if let Some(slot) = self.indexed.get_mut(position) {
            *slot = Some(value);
        }
        self
    }

    pub fn matches(&self, log: &Log) -> bool {
        if !self.addresses.is_empty() && !self.addresses.contains(&log.address()) {
            return false;
        }
        let topics = log.topics();
        if !self.signatures.is_empty() {
            match topics.first() {
                Some(topic0) if self.signatures.contains(topic0) => {}
                _ => return false,
            }
        }
        self.indexed
            .iter()
            .enumerate()
            .all(|(i, expected)| match expected {
                Some(value) => topics.get(i + 1) == Some(value),
                None => true,
            })
    }

    pub fn to_filter(&self, from_block: u64, to_block: u64) -> Filter {
        let mut filter = Filter::new()
            .address(self.addresses.clone())
            .event_signature(self.signatures.clone())
            .from_block(from_block)
            .to_block(to_block);
        if let Some(topic) = self.indexed[0] {
            filter = filter.topic1(topic);
        }
        if let Some(topic) = self.indexed[1] {
            filter = filter.topic2(topic);
        }
        if let Some(topic) = self.indexed[2] {
            filter = filter.topic3(topic);
        }
        filter
    }
}
