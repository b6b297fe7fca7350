//! Step approval state models.

use serde::Serialize;
use sqlx::FromRow;

use evalcycle_core::error::CoreError;
use evalcycle_core::step::{ApprovalStatus, ApprovalStep};
use evalcycle_core::types::{DbId, Timestamp};

/// A row from the `step_approval_states` table: one state bundle per
/// mapping with four independent slots. The `secondary_*` columns hold the
/// legacy aggregate, derived from the per-evaluator rows and never
/// authored directly.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StepApprovalState {
    pub id: DbId,
    pub mapping_id: DbId,

    pub criteria_status: String,
    pub criteria_approved_by: Option<DbId>,
    pub criteria_approved_at: Option<Timestamp>,
    pub criteria_revision_request_id: Option<DbId>,

    pub self_status: String,
    pub self_approved_by: Option<DbId>,
    pub self_approved_at: Option<Timestamp>,
    pub self_revision_request_id: Option<DbId>,

    pub primary_status: String,
    pub primary_approved_by: Option<DbId>,
    pub primary_approved_at: Option<Timestamp>,
    pub primary_revision_request_id: Option<DbId>,

    pub secondary_status: String,
    pub secondary_approved_by: Option<DbId>,
    pub secondary_approved_at: Option<Timestamp>,
    pub secondary_revision_request_id: Option<DbId>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl StepApprovalState {
    /// Parsed status of one step slot.
    pub fn slot_status(&self, step: ApprovalStep) -> Result<ApprovalStatus, CoreError> {
        let raw = match step {
            ApprovalStep::Criteria => &self.criteria_status,
            ApprovalStep::SelfEvaluation => &self.self_status,
            ApprovalStep::Primary => &self.primary_status,
            ApprovalStep::Secondary => &self.secondary_status,
        };
        ApprovalStatus::from_str_value(raw)
    }
}

/// A row from the `secondary_evaluator_approval_states` table: the
/// secondary slot scoped to a single evaluator.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SecondaryEvaluatorApprovalState {
    pub id: DbId,
    pub mapping_id: DbId,
    pub evaluator_id: DbId,
    pub status: String,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub revision_request_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SecondaryEvaluatorApprovalState {
    /// Parsed approval status.
    pub fn parsed_status(&self) -> Result<ApprovalStatus, CoreError> {
        ApprovalStatus::from_str_value(&self.status)
    }
}
