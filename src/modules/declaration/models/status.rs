//! Typed lifecycle statuses.
//!
//! Stored as text in the database; the enums own the transition rules so
//! the services never compare raw strings.

use serde::{Deserialize, Serialize};

/// Batch lifecycle:
/// `pending → submitted → approved → processing → completed`,
/// `rejected` reachable only from `submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Pending,
    Submitted,
    Approved,
    Rejected,
    Processing,
    Completed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Submitted => "submitted",
            BatchStatus::Approved => "approved",
            BatchStatus::Rejected => "rejected",
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BatchStatus::Pending),
            "submitted" => Some(BatchStatus::Submitted),
            "approved" => Some(BatchStatus::Approved),
            "rejected" => Some(BatchStatus::Rejected),
            "processing" => Some(BatchStatus::Processing),
            "completed" => Some(BatchStatus::Completed),
            _ => None,
        }
    }

    /// The transition matrix. Payment is a separate axis and is guarded by
    /// the service (`process` additionally requires `paid`).
    pub fn can_transition_to(&self, next: BatchStatus) -> bool {
        matches!(
            (self, next),
            (BatchStatus::Pending, BatchStatus::Submitted)
                | (BatchStatus::Submitted, BatchStatus::Approved)
                | (BatchStatus::Submitted, BatchStatus::Rejected)
                | (BatchStatus::Approved, BatchStatus::Processing)
                | (BatchStatus::Processing, BatchStatus::Completed)
        )
    }
}

/// Payment axis, independent of the batch status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

/// Declaration status mirrors the parent batch on bulk transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationStatus {
    Pending,
    Submitted,
    Approved,
    Rejected,
}

impl DeclarationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationStatus::Pending => "pending",
            DeclarationStatus::Submitted => "submitted",
            DeclarationStatus::Approved => "approved",
            DeclarationStatus::Rejected => "rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(BatchStatus::Pending.can_transition_to(BatchStatus::Submitted));
        assert!(BatchStatus::Submitted.can_transition_to(BatchStatus::Approved));
        assert!(BatchStatus::Submitted.can_transition_to(BatchStatus::Rejected));
        assert!(BatchStatus::Approved.can_transition_to(BatchStatus::Processing));
        assert!(BatchStatus::Processing.can_transition_to(BatchStatus::Completed));
    }

    #[test]
    fn test_pending_cannot_skip_submission() {
        assert!(!BatchStatus::Pending.can_transition_to(BatchStatus::Approved));
        assert!(!BatchStatus::Pending.can_transition_to(BatchStatus::Processing));
        assert!(!BatchStatus::Pending.can_transition_to(BatchStatus::Completed));
        assert!(!BatchStatus::Pending.can_transition_to(BatchStatus::Rejected));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for next in [
            BatchStatus::Pending,
            BatchStatus::Submitted,
            BatchStatus::Approved,
            BatchStatus::Rejected,
            BatchStatus::Processing,
            BatchStatus::Completed,
        ] {
            assert!(!BatchStatus::Rejected.can_transition_to(next));
            assert!(!BatchStatus::Completed.can_transition_to(next));
        }
    }

    #[test]
    fn test_round_trip_text() {
        for status in [
            BatchStatus::Pending,
            BatchStatus::Submitted,
            BatchStatus::Approved,
            BatchStatus::Rejected,
            BatchStatus::Processing,
            BatchStatus::Completed,
        ] {
            assert_eq!(BatchStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BatchStatus::parse("unknown"), None);
        assert_eq!(PaymentStatus::parse("paid"), Some(PaymentStatus::Paid));
    }
}
