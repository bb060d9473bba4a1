use alloy_primitives::{Address, B256};
use payloadscan_beacon::BeaconClientError;
use payloadscan_database::DatabaseError;
use payloadscan_execution::ExecutionClientError;
use payloadscan_types::{AmountError, Slot};

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("beacon client error: {0}")]
    Beacon(#[from] BeaconClientError),

    #[error("execution client error: {0}")]
    Execution(#[from] ExecutionClientError),

    #[error("invalid claimed value for slot {slot}: {error}")]
    InvalidClaimedValue { slot: Slot, error: AmountError },

    #[error("balance of {address} around block {block_number} unavailable on every endpoint: {error}")]
    BalanceUnavailable { address: Address, block_number: u64, error: ExecutionClientError },

    #[error("no canonical block at height {block_number} (claimed block {block_hash})")]
    CanonicalBlockNotFound { block_number: u64, block_hash: B256 },

    #[error("amount out of range: {0}")]
    ValueOverflow(#[from] AmountError),

    #[error("failed to persist verdict: {0}")]
    Persistence(#[from] DatabaseError),

    #[error("worker panicked: {0}")]
    WorkerPanicked(String),
}

impl VerificationError {
    /// Failures that stop the whole batch regardless of the configured policy.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::WorkerPanicked(_))
    }
}
