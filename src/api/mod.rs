//! HTTP surface: POST /recommend, GET /health

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::core::config::EngineConfig;
use crate::pipeline::{format_report, run_pipeline, DecisionInput};

fn wants_text(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/plain"))
        .unwrap_or(false)
}

async fn recommend(
    State(config): State<Arc<EngineConfig>>,
    headers: HeaderMap,
    Json(input): Json<DecisionInput>,
) -> Response {
    if let Err(e) = input.validate() {
        tracing::warn!(error = %e, "Rejected recommend request");
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response();
    }

    let output = run_pipeline(&input, &config);
    tracing::info!(
        scene = %input.scene.scene_id,
        objects = input.objects.len(),
        alerts = output.alerts.len(),
        "Recommendation served"
    );

    if wants_text(&headers) {
        (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format_report(&output),
        )
            .into_response()
    } else {
        Json(output).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn router(config: Arc<EngineConfig>) -> Router {
    Router::new()
        .route("/recommend", post(recommend))
        .route("/health", get(health))
        .with_state(config)
}
