//! The two status vocabularies derived from raw completion facts.
//!
//! Both vocabularies are pure functions over the same
//! `(assigned, completed, has_any_record, approval)` tuple so the
//! precedence rules stay in one place, unit-testable independent of the
//! store. The owner vocabulary shows only completion progress and is used
//! on an evaluator's own worklist; the approval-aware vocabulary layers
//! workflow state on top and is shown to administrators.

use serde::{Deserialize, Serialize};

use crate::step::ApprovalStatus;

/// Completion-only status for an evaluator's own worklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerStatus {
    None,
    InProgress,
    Complete,
}

impl OwnerStatus {
    /// Derive from an assignment count and a completed-item count.
    ///
    /// A single existing assignment with zero completed items already
    /// counts as `InProgress`.
    pub fn derive(assigned: i64, completed: i64) -> Self {
        if assigned == 0 {
            Self::None
        } else if completed < assigned {
            Self::InProgress
        } else {
            Self::Complete
        }
    }
}

/// Administrative status layering approval state over completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAwareStatus {
    None,
    InProgress,
    Pending,
    Approved,
    RevisionRequested,
    RevisionCompleted,
}

impl ApprovalAwareStatus {
    /// Derive from completion facts and the step's approval slot.
    ///
    /// `has_any_record` distinguishes "nothing exists yet" from "records
    /// exist but are incomplete": with zero records the status is `None`
    /// even when items are assigned. Once every assigned item is complete
    /// the approval slot takes over (`Pending` when no approval row exists
    /// yet).
    pub fn derive(
        assigned: i64,
        completed: i64,
        has_any_record: bool,
        approval: Option<ApprovalStatus>,
    ) -> Self {
        if assigned == 0 || !has_any_record {
            return Self::None;
        }
        if completed < assigned {
            return Self::InProgress;
        }
        match approval.unwrap_or(ApprovalStatus::Pending) {
            ApprovalStatus::Pending => Self::Pending,
            ApprovalStatus::Approved => Self::Approved,
            ApprovalStatus::RevisionRequested => Self::RevisionRequested,
            ApprovalStatus::RevisionCompleted => Self::RevisionCompleted,
        }
    }
}

/// Derive the legacy aggregate secondary status from the per-evaluator
/// approval rows.
///
/// Precedence: `RevisionRequested` if any evaluator is in that state; else
/// `RevisionCompleted` if any evaluator completed a revision; else
/// `Approved` only if all evaluators (at least one) are approved; else
/// `Pending`. This value is derived, never authored directly.
pub fn aggregate_secondary(statuses: &[ApprovalStatus]) -> ApprovalStatus {
    if statuses.iter().any(|s| *s == ApprovalStatus::RevisionRequested) {
        ApprovalStatus::RevisionRequested
    } else if statuses.iter().any(|s| *s == ApprovalStatus::RevisionCompleted) {
        ApprovalStatus::RevisionCompleted
    } else if !statuses.is_empty() && statuses.iter().all(|s| *s == ApprovalStatus::Approved) {
        ApprovalStatus::Approved
    } else {
        ApprovalStatus::Pending
    }
}
