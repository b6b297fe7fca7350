//! Handlers for the revision-request ledger: inbox listing and the
//! recipient-owned read/complete mutations.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use evalcycle_core::types::DbId;
use evalcycle_db::models::revision::{RevisionRequest, RevisionRequestRecipient, RevisionRequestWithRecipient};
use evalcycle_db::repositories::RevisionRepo;
use evalcycle_engine::approval;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StepQuery {
    pub step: String,
}

/// GET /api/v1/periods/{period_id}/employees/{employee_id}/revisions?step=criteria
pub async fn list_for_employee_step(
    State(state): State<AppState>,
    Path((period_id, employee_id)): Path<(DbId, DbId)>,
    Query(query): Query<StepQuery>,
) -> AppResult<Json<DataResponse<Vec<RevisionRequest>>>> {
    let requests =
        RevisionRepo::list_for_employee_step(&state.pool, period_id, employee_id, &query.step)
            .await?;
    Ok(Json(DataResponse { data: requests }))
}

/// GET /api/v1/periods/{period_id}/recipients/{recipient_id}/revisions
///
/// A person's inbox: every request addressed to them within the period.
pub async fn list_inbox(
    State(state): State<AppState>,
    Path((period_id, recipient_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Vec<RevisionRequestWithRecipient>>>> {
    let requests = RevisionRepo::list_for_recipient(&state.pool, period_id, recipient_id).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// POST /api/v1/revision-recipients/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<RevisionRequestRecipient>>> {
    let recipient = approval::mark_revision_read(&state.pool, id).await?;
    Ok(Json(DataResponse { data: recipient }))
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub response_comment: Option<String>,
}

/// POST /api/v1/revision-recipients/{id}/complete
pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CompleteRequest>,
) -> AppResult<Json<DataResponse<RevisionRequestRecipient>>> {
    let recipient =
        approval::complete_revision(&state.pool, id, input.response_comment.as_deref()).await?;
    Ok(Json(DataResponse { data: recipient }))
}
