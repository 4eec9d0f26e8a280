use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::catalog::Readiness;

pub async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "categories": "/api/v1/categories",
            "brands": "/api/v1/brands",
            "foodtypes": "/api/v1/foodtypes",
            "foods": "/api/v1/foods",
        }
    }))
}

/// Reports whether the database answers a trivial query.
pub async fn health(State(readiness): State<Arc<dyn Readiness>>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match readiness.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
