//! Route definitions for recipient-owned revision mutations.

use axum::routing::post;
use axum::Router;

use crate::handlers::revision;
use crate::state::AppState;

/// Routes mounted at `/revision-recipients`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/revision-recipients/{id}/read", post(revision::mark_read))
        .route(
            "/revision-recipients/{id}/complete",
            post(revision::complete),
        )
}
