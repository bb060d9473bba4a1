use serde::{Deserialize, Serialize};

use crate::Slot;

pub const DEFAULT_NUM_PAYLOADS: u64 = 1000;

/// Which stored delivered payloads a run picks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionPolicy {
    /// Every record for a single slot, regardless of an existing verdict.
    BySlot(Slot),
    /// Records whose previous value check failed.
    FailedOnly,
    /// The most recent records that have not been checked yet.
    RecentUnchecked(u64),
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::RecentUnchecked(DEFAULT_NUM_PAYLOADS)
    }
}

impl SelectionPolicy {
    pub fn is_single_slot(&self) -> bool {
        matches!(self, Self::BySlot(_))
    }
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BySlot(slot) => write!(f, "slot {slot}"),
            Self::FailedOnly => write!(f, "failed checks"),
            Self::RecentUnchecked(limit) => write!(f, "{limit} most recent unchecked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_policy_serde() {
        let policy: SelectionPolicy = serde_json::from_str(r#"{"BySlot":7283130}"#).unwrap();
        assert_eq!(policy, SelectionPolicy::BySlot(7283130));
        assert!(policy.is_single_slot());

        let policy: SelectionPolicy = serde_json::from_str(r#""FailedOnly""#).unwrap();
        assert_eq!(policy, SelectionPolicy::FailedOnly);

        assert_eq!(SelectionPolicy::default(), SelectionPolicy::RecentUnchecked(1000));
    }
}
