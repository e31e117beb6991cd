// API layer - the HTTP adapter over the core pipeline.
//
// Translation only: wire DTOs in, domain calls through, status codes out.
// No business rules live here.

#[path = "flag_routes.rs"]
pub mod flag_routes;

use crate::core::flags::{FlagError, FlagService};
use crate::infra::actions::SqliteActionStore;
use crate::infra::audit::SqliteAuditStore;
use crate::infra::flags::SqliteFlagStore;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;
use serde_json::json;
use std::sync::Arc;

/// The concrete pipeline this process serves.
pub type Pipeline = FlagService<SqliteFlagStore, SqliteActionStore, SqliteAuditStore>;

#[derive(Clone)]
pub struct AppState {
    pub flags: Arc<Pipeline>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/content/:id/flag", post(flag_routes::submit_flag))
        .route("/flags", get(flag_routes::list_flags))
        .route("/flags/stats", get(flag_routes::flag_stats))
        .route("/flags/:id", get(flag_routes::get_flag))
        .route("/flags/:id/actions", get(flag_routes::flag_actions))
        .route("/flags/:id/review", put(flag_routes::review_flag))
        .route("/health", get(flag_routes::health))
        .with_state(state)
}

/// Domain error projected onto an HTTP response.
pub struct ApiError(pub FlagError);

impl From<FlagError> for ApiError {
    fn from(err: FlagError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            FlagError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            FlagError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            FlagError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            FlagError::ContentNotFound(_) | FlagError::FlagNotFound => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            FlagError::DuplicateFlag => (StatusCode::CONFLICT, "DUPLICATE_FLAG"),
            FlagError::AlreadyReviewed { .. } => (StatusCode::CONFLICT, "ALREADY_REVIEWED"),
            FlagError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self.0);
        }

        (
            status,
            Json(json!({ "error": self.0.to_string(), "code": code })),
        )
            .into_response()
    }
}
