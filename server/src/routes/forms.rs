//! Form endpoint routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::db::StoredForm;
use crate::error::Result;
use crate::handlers::{
    create_form, delete_form, get_form, update_form, CreateFormRequest, UpdateFormRequest,
    UpdateFormResponse,
};
use crate::AppState;

/// Create form routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/forms", get(list_handler).post(create_handler))
        .route(
            "/api/forms/{id}",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
}

/// GET /api/forms - List all forms.
async fn list_handler(State(state): State<AppState>) -> Json<Vec<StoredForm>> {
    Json(state.db.list_forms())
}

/// POST /api/forms - Create a form.
async fn create_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateFormRequest>,
) -> Result<(StatusCode, Json<StoredForm>)> {
    let form = create_form(&state.db, request)?;
    Ok((StatusCode::CREATED, Json(form)))
}

/// GET /api/forms/{id} - Fetch one form.
async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredForm>> {
    Ok(Json(get_form(&state.db, &id)?))
}

/// PUT /api/forms/{id} - Update a form, resolving edit conflicts.
async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateFormRequest>,
) -> Result<Json<UpdateFormResponse>> {
    let response = update_form(&state.db, &id, request, state.config.conflict_strategy)?;
    Ok(Json(response))
}

/// DELETE /api/forms/{id} - Delete a form and its submissions.
async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    delete_form(&state.db, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
