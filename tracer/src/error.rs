use alloy::primitives::B256;

pub type TraceResult<T> = Result<T, TraceError>;

/// Failure taxonomy of the correlation engine.
///
/// `NotFound` and `SearchBudgetExceeded` describe absence and are folded into
/// the result records wherever a lookup may legitimately come up empty.
/// `Decode` is raised per candidate log and absorbed by the scanning code.
/// `AmbiguousMatch` and `Transport` abort the current invocation.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("searched {blocks_scanned} blocks on chain {chain_id} without a match")]
    SearchBudgetExceeded { chain_id: u64, blocks_scanned: u64 },
    #[error("ambiguous match: {0}")]
    AmbiguousMatch(String),
    #[error("failed to decode {0}")]
    Decode(String),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl TraceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        TraceError::NotFound(what.into())
    }

    pub fn transaction_not_found(hash: B256) -> Self {
        TraceError::NotFound(format!("transaction {hash}"))
    }

    /// Absence outcomes callers are expected to tolerate.
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            TraceError::NotFound(_) | TraceError::SearchBudgetExceeded { .. }
        )
    }
}

impl From<alloy::sol_types::Error> for TraceError {
    fn from(e: alloy::sol_types::Error) -> Self {
        TraceError::Decode(e.to_string())
    }
}
