use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::state::AppState;

/// GET /health - 健康检查
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let database = match string_analysis_backend::db::check_connection(state.store.pool()).await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!("Health check database probe failed: {}", e);
            "unavailable"
        }
    };

    Json(json!({
        "status": "ok",
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
        "build_time": env!("BUILD_TIME"),
    }))
}
