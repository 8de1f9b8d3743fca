//! Submission endpoint routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::db::StoredSubmission;
use crate::error::Result;
use crate::handlers::{
    create_submission, list_submissions, CreateSubmissionRequest, SubmissionQuery,
};
use crate::AppState;

/// Create submission routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/submissions", get(list_handler).post(create_handler))
}

/// GET /api/submissions?formId= - List submissions.
async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<SubmissionQuery>,
) -> Result<Json<Vec<StoredSubmission>>> {
    Ok(Json(list_submissions(&state.db, query)?))
}

/// POST /api/submissions - Validate and store a submission.
async fn create_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<StoredSubmission>)> {
    let submission = create_submission(&state.db, request)?;
    Ok((StatusCode::CREATED, Json(submission)))
}
