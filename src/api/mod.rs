pub mod server;
pub mod strings;

use axum::{
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Handler error: status plus `{"error": ...}` body / 错误响应
pub type ApiError = (StatusCode, Json<Value>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

pub fn internal_error(e: impl std::fmt::Display) -> ApiError {
    tracing::error!("Internal error: {}", e);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Build the HTTP router / 构建路由
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(server::health_check))
        .route("/strings", get(strings::list_strings).post(strings::create_string))
        .route(
            "/strings/filter-by-natural-language",
            get(strings::filter_by_natural_language),
        )
        .route(
            "/strings/:string_value",
            get(strings::get_string).delete(strings::delete_string),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
