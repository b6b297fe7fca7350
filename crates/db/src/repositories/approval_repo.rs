//! Repository for the `step_approval_states` and
//! `secondary_evaluator_approval_states` tables.
//!
//! Reads only: slot transitions are multi-statement operations owned by
//! the workflow engine so they stay atomic with revision fan-out.

use sqlx::PgPool;

use evalcycle_core::types::DbId;

use crate::models::approval::{SecondaryEvaluatorApprovalState, StepApprovalState};

/// Column list for step_approval_states queries.
pub const STATE_COLUMNS: &str = "id, mapping_id, \
    criteria_status, criteria_approved_by, criteria_approved_at, criteria_revision_request_id, \
    self_status, self_approved_by, self_approved_at, self_revision_request_id, \
    primary_status, primary_approved_by, primary_approved_at, primary_revision_request_id, \
    secondary_status, secondary_approved_by, secondary_approved_at, secondary_revision_request_id, \
    created_at, updated_at";

/// Column list for secondary_evaluator_approval_states queries.
pub const SECONDARY_COLUMNS: &str = "id, mapping_id, evaluator_id, status, \
    approved_by, approved_at, revision_request_id, created_at, updated_at";

/// Read access to step approval state bundles.
pub struct ApprovalStateRepo;

impl ApprovalStateRepo {
    /// Find the state bundle for a mapping.
    pub async fn find_by_mapping(
        pool: &PgPool,
        mapping_id: DbId,
    ) -> Result<Option<StepApprovalState>, sqlx::Error> {
        let query =
            format!("SELECT {STATE_COLUMNS} FROM step_approval_states WHERE mapping_id = $1");
        sqlx::query_as::<_, StepApprovalState>(&query)
            .bind(mapping_id)
            .fetch_optional(pool)
            .await
    }

    /// List per-evaluator secondary approval rows for a mapping, ordered
    /// by evaluator id.
    pub async fn list_secondary_for_mapping(
        pool: &PgPool,
        mapping_id: DbId,
    ) -> Result<Vec<SecondaryEvaluatorApprovalState>, sqlx::Error> {
        let query = format!(
            "SELECT {SECONDARY_COLUMNS} FROM secondary_evaluator_approval_states \
             WHERE mapping_id = $1 ORDER BY evaluator_id ASC"
        );
        sqlx::query_as::<_, SecondaryEvaluatorApprovalState>(&query)
            .bind(mapping_id)
            .fetch_all(pool)
            .await
    }

}
