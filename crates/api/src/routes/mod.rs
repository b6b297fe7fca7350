pub mod health;
pub mod period;
pub mod revision;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /periods                                          create
/// /periods/advance-phases                           run one scheduler pass (POST)
/// /periods/{id}                                     get
/// /periods/{id}/status                              lifecycle change (PATCH)
/// /periods/{id}/phase                               manual phase change (PATCH)
/// /periods/{id}/deadlines                           set/clear a deadline (PATCH)
/// /periods/{id}/employees                           enroll (POST), list (GET)
/// /periods/{id}/employees/{employee_id}/exclusion   exclusion toggle (PATCH)
/// /periods/{id}/employees/{employee_id}/steps/{step}
///                                                   step approval transition (PUT)
/// /periods/{id}/employees/{employee_id}/secondary-evaluators/{evaluator_id}
///                                                   per-evaluator transition (PUT)
/// /periods/{id}/employees/{employee_id}/revisions   request history (GET)
/// /periods/{id}/employees/{employee_id}/status      composite status view (GET)
/// /periods/{id}/recipients/{recipient_id}/revisions revision inbox (GET)
/// /periods/{id}/evaluators/{evaluator_id}/targets   evaluator worklist (GET)
///
/// /revision-recipients/{id}/read                    mark read (POST)
/// /revision-recipients/{id}/complete                fan-in completion (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(period::router())
        .merge(revision::router())
}
