//! Sync endpoint routes.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::Result;
use crate::handlers::{
    handle_pull, handle_push, PullQuery, PullResponse, PushRequest, PushResponse,
};
use crate::AppState;

/// Create sync routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/sync/push", post(push_handler))
        .route("/api/sync/pull", get(pull_handler))
}

/// POST /api/sync/push - Deliver queued offline submissions.
async fn push_handler(
    State(state): State<AppState>,
    Json(request): Json<PushRequest>,
) -> Result<Json<PushResponse>> {
    let response = handle_push(&state.db, request)?;
    Ok(Json(response))
}

/// GET /api/sync/pull - Fetch changes since a checkpoint.
async fn pull_handler(
    State(state): State<AppState>,
    Query(query): Query<PullQuery>,
) -> Result<Json<PullResponse>> {
    let response = handle_pull(&state.db, query, state.config.pull_limit)?;
    Ok(Json(response))
}
