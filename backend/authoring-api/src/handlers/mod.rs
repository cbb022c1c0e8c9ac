use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::services::{AppState, AuthoringError};

pub mod activities;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut status = "healthy";
    let mut dependencies = serde_json::Map::new();
    let mut all_healthy = true;

    match &state.mongo {
        Some(mongo) => {
            let mongo_health = check_mongodb(mongo).await;
            if mongo_health.get("status").and_then(|v| v.as_str()) != Some("healthy") {
                all_healthy = false;
                status = "degraded";
            }
            dependencies.insert("mongodb".to_string(), json!(mongo_health));
        }
        None => {
            dependencies.insert("storage".to_string(), json!({ "status": "in-memory" }));
        }
    }

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "authoring-api",
            "version": env!("CARGO_PKG_VERSION"),
            "dependencies": dependencies
        })),
    )
}

async fn check_mongodb(mongo: &mongodb::Database) -> serde_json::Map<String, serde_json::Value> {
    let mut result = serde_json::Map::new();
    match tokio::time::timeout(
        std::time::Duration::from_secs(1),
        mongo.run_command(mongodb::bson::doc! { "ping": 1 }),
    )
    .await
    {
        Ok(Ok(_)) => {
            result.insert("status".to_string(), json!("healthy"));
        }
        Ok(Err(e)) => {
            result.insert("status".to_string(), json!("unhealthy"));
            result.insert("error".to_string(), json!(e.to_string()));
        }
        Err(_) => {
            result.insert("status".to_string(), json!("unhealthy"));
            result.insert("error".to_string(), json!("ping timeout"));
        }
    }
    result
}

/// Maps domain errors onto HTTP responses. Validation failures carry the
/// full error list so the editor can highlight the offending fields.
pub(crate) fn error_response(err: AuthoringError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        AuthoringError::NotFound(_) | AuthoringError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        AuthoringError::InvalidTransition { .. } => StatusCode::CONFLICT,
        AuthoringError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AuthoringError::UnknownType(_) | AuthoringError::Storage(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let body = match &err {
        AuthoringError::ValidationFailed(errors) => json!({
            "message": err.to_string(),
            "status": status.as_u16(),
            "errors": errors,
        }),
        _ => json!({
            "message": err.to_string(),
            "status": status.as_u16(),
        }),
    };

    (status, Json(body))
}
