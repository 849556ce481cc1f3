//! HTTP route handlers for Lookout.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use argus_common::ArgusError;
use crate::state::AppState;

mod filters;
mod forms;
mod health;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/metrics", get(health::metrics))

        // Forms protected by the spam gate
        .route("/forms/{form_id}", get(forms::describe_form).post(forms::submit_form))

        // Category navigation
        .route("/filters/{name}", get(filters::render_filter))
        .route("/filters/{name}/{param}/{aliases}", get(filters::render_filtered))

        .layer(TraceLayer::new_for_http())

        // Add shared state
        .with_state(state)
}

/// Error wrapper turning `ArgusError` into a JSON response
#[derive(Debug)]
pub struct ApiError(pub ArgusError);

impl From<ArgusError> for ApiError {
    fn from(err: ArgusError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
