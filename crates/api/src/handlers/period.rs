//! Handlers for the `/periods` resource: period lifecycle, enrollment,
//! phase control, and deadlines.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use evalcycle_core::error::CoreError;
use evalcycle_core::phase::{DeadlineField, EvaluationPhase, PeriodStatus};
use evalcycle_core::types::{DbId, Timestamp};
use evalcycle_db::models::mapping::{CreateMapping, PeriodEmployeeMapping};
use evalcycle_db::models::period::{CreatePeriod, EvaluationPeriod};
use evalcycle_db::repositories::{MappingRepo, PeriodRepo};
use evalcycle_engine::scheduler;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/periods
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreatePeriod>,
) -> AppResult<(StatusCode, Json<DataResponse<EvaluationPeriod>>)> {
    let period = PeriodRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: period })))
}

/// GET /api/v1/periods/{period_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(period_id): Path<DbId>,
) -> AppResult<Json<DataResponse<EvaluationPeriod>>> {
    let period = PeriodRepo::find_by_id(&state.pool, period_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "EvaluationPeriod",
            id: period_id,
        })?;
    Ok(Json(DataResponse { data: period }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: PeriodStatus,
}

/// PATCH /api/v1/periods/{period_id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(period_id): Path<DbId>,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<Json<DataResponse<EvaluationPeriod>>> {
    let period = PeriodRepo::update_status(&state.pool, period_id, input.status)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "EvaluationPeriod",
            id: period_id,
        })?;
    Ok(Json(DataResponse { data: period }))
}

#[derive(Debug, Deserialize)]
pub struct ChangePhaseRequest {
    pub phase: EvaluationPhase,
}

/// PATCH /api/v1/periods/{period_id}/phase
pub async fn change_phase(
    State(state): State<AppState>,
    Path(period_id): Path<DbId>,
    Json(input): Json<ChangePhaseRequest>,
) -> AppResult<Json<DataResponse<EvaluationPeriod>>> {
    let period = scheduler::change_phase(&state.pool, period_id, input.phase).await?;
    Ok(Json(DataResponse { data: period }))
}

#[derive(Debug, Deserialize)]
pub struct SetDeadlineRequest {
    pub field: DeadlineField,
    pub value: Option<Timestamp>,
}

/// PATCH /api/v1/periods/{period_id}/deadlines
pub async fn set_deadline(
    State(state): State<AppState>,
    Path(period_id): Path<DbId>,
    Json(input): Json<SetDeadlineRequest>,
) -> AppResult<Json<DataResponse<EvaluationPeriod>>> {
    let period =
        scheduler::set_deadline(&state.pool, period_id, input.field, input.value).await?;
    Ok(Json(DataResponse { data: period }))
}

#[derive(Debug, Serialize)]
pub struct AdvancePhasesResponse {
    pub transitioned: u64,
}

/// POST /api/v1/periods/advance-phases
///
/// Runs one scheduler pass immediately, outside the background interval.
pub async fn advance_phases(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<AdvancePhasesResponse>>> {
    let transitioned = scheduler::advance_due_periods(&state.pool, Utc::now()).await?;
    Ok(Json(DataResponse {
        data: AdvancePhasesResponse { transitioned },
    }))
}

// ---------------------------------------------------------------------------
// Enrollment
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub employee_id: DbId,
}

/// POST /api/v1/periods/{period_id}/employees
pub async fn enroll(
    State(state): State<AppState>,
    Path(period_id): Path<DbId>,
    Json(input): Json<EnrollRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<PeriodEmployeeMapping>>)> {
    let mapping = MappingRepo::create(
        &state.pool,
        &CreateMapping {
            period_id,
            employee_id: input.employee_id,
            is_excluded: None,
            exclusion_reason: None,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: mapping })))
}

/// GET /api/v1/periods/{period_id}/employees
pub async fn list_enrolled(
    State(state): State<AppState>,
    Path(period_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<PeriodEmployeeMapping>>>> {
    let mappings = MappingRepo::list_for_period(&state.pool, period_id).await?;
    Ok(Json(DataResponse { data: mappings }))
}

#[derive(Debug, Deserialize)]
pub struct ExclusionRequest {
    pub is_excluded: bool,
    pub reason: Option<String>,
}

/// PATCH /api/v1/periods/{period_id}/employees/{employee_id}/exclusion
pub async fn set_exclusion(
    State(state): State<AppState>,
    Path((period_id, employee_id)): Path<(DbId, DbId)>,
    Json(input): Json<ExclusionRequest>,
) -> AppResult<Json<DataResponse<PeriodEmployeeMapping>>> {
    let mapping = MappingRepo::find_by_period_and_employee(&state.pool, period_id, employee_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "PeriodEmployeeMapping",
            id: employee_id,
        })?;

    let updated =
        MappingRepo::set_exclusion(&state.pool, mapping.id, input.is_excluded, input.reason.as_deref())
            .await?
            .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;
    Ok(Json(DataResponse { data: updated }))
}
