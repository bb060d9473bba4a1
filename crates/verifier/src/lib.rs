pub mod balance;
pub mod canonicality;
pub mod error;
pub mod orchestrator;
pub mod reconciler;
#[cfg(test)]
mod test_utils;

pub use balance::BalanceOracle;
pub use canonicality::{CanonResult, CanonicalityChecker, UNCLE_SCAN_DEPTH};
pub use error::VerificationError;
pub use orchestrator::{BatchSummary, PayloadValueChecker, RecordVerifier};
pub use reconciler::{claimed_wei, ValueReconciler, ValueVerdict};
