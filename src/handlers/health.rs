use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::error;

use crate::db::sqlite::ping;
use crate::router::AppState;

/// GET /health -> liveness probe against the database.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match ping(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "OK", "message": "Database connected" })),
        ),
        Err(e) => {
            error!(error = %e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "ERROR", "message": "Database connection failed" })),
            )
        }
    }
}
