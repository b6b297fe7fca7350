//! Route definitions for the `/periods` resource and everything scoped
//! beneath a period.

use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::handlers::{approval, period, revision, status};
use crate::state::AppState;

/// Routes mounted at `/periods`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/periods", post(period::create))
        .route("/periods/advance-phases", post(period::advance_phases))
        .route("/periods/{period_id}", get(period::get_by_id))
        .route("/periods/{period_id}/status", patch(period::update_status))
        .route("/periods/{period_id}/phase", patch(period::change_phase))
        .route("/periods/{period_id}/deadlines", patch(period::set_deadline))
        .route(
            "/periods/{period_id}/employees",
            post(period::enroll).get(period::list_enrolled),
        )
        .route(
            "/periods/{period_id}/employees/{employee_id}/exclusion",
            patch(period::set_exclusion),
        )
        .route(
            "/periods/{period_id}/employees/{employee_id}/steps/{step}",
            put(approval::set_step_status),
        )
        .route(
            "/periods/{period_id}/employees/{employee_id}/secondary-evaluators/{evaluator_id}",
            put(approval::set_secondary_evaluator_status),
        )
        .route(
            "/periods/{period_id}/employees/{employee_id}/revisions",
            get(revision::list_for_employee_step),
        )
        .route(
            "/periods/{period_id}/employees/{employee_id}/status",
            get(status::employee_status),
        )
        .route(
            "/periods/{period_id}/recipients/{recipient_id}/revisions",
            get(revision::list_inbox),
        )
        .route(
            "/periods/{period_id}/evaluators/{evaluator_id}/targets",
            get(status::evaluator_targets),
        )
}
