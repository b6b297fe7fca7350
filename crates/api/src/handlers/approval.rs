//! Handlers for step-approval transitions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use evalcycle_core::step::{ApprovalStatus, ApprovalStep};
use evalcycle_core::types::DbId;
use evalcycle_engine::approval;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StepStatusRequest {
    pub status: ApprovalStatus,
    /// The person making the decision.
    pub actor: DbId,
    /// Required when `status` is `revision_requested`.
    pub comment: Option<String>,
}

/// PUT /api/v1/periods/{period_id}/employees/{employee_id}/steps/{step}
pub async fn set_step_status(
    State(state): State<AppState>,
    Path((period_id, employee_id, step)): Path<(DbId, DbId, ApprovalStep)>,
    Json(input): Json<StepStatusRequest>,
) -> AppResult<StatusCode> {
    approval::set_step_status(
        &state.pool,
        period_id,
        employee_id,
        step,
        input.status,
        input.actor,
        input.comment.as_deref(),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/periods/{period_id}/employees/{employee_id}/secondary-evaluators/{evaluator_id}
pub async fn set_secondary_evaluator_status(
    State(state): State<AppState>,
    Path((period_id, employee_id, evaluator_id)): Path<(DbId, DbId, DbId)>,
    Json(input): Json<StepStatusRequest>,
) -> AppResult<StatusCode> {
    approval::set_secondary_evaluator_status(
        &state.pool,
        period_id,
        employee_id,
        evaluator_id,
        input.status,
        input.actor,
        input.comment.as_deref(),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
