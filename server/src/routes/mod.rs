//! HTTP route definitions.

mod forms;
mod health;
mod submissions;
mod sync;

use crate::AppState;
use axum::Router;

/// Create all application routes.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(forms::routes())
        .merge(submissions::routes())
        .merge(sync::routes())
}
