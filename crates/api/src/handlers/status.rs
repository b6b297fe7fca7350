//! Handlers for the read-side status views.

use axum::extract::{Path, State};
use axum::Json;

use evalcycle_core::types::DbId;
use evalcycle_engine::status::{
    employee_period_status, evaluator_targets_status, EmployeePeriodStatus, EvaluatorTargetStatus,
};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/periods/{period_id}/employees/{employee_id}/status
pub async fn employee_status(
    State(state): State<AppState>,
    Path((period_id, employee_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<EmployeePeriodStatus>>> {
    let status = employee_period_status(&state.pool, period_id, employee_id).await?;
    Ok(Json(DataResponse { data: status }))
}

/// GET /api/v1/periods/{period_id}/evaluators/{evaluator_id}/targets
pub async fn evaluator_targets(
    State(state): State<AppState>,
    Path((period_id, evaluator_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Vec<EvaluatorTargetStatus>>>> {
    let targets = evaluator_targets_status(&state.pool, period_id, evaluator_id).await?;
    Ok(Json(DataResponse { data: targets }))
}
