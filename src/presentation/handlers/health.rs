use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::domain::ModelState;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

/// Reports the model state without waiting for a load in progress.
/// A failed model answers 503 so orchestrators notice it. The route is
/// public, so a failure is reported by code only; the detail was logged
/// when the load failed.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.pipeline.session();
    let model_state = session.state();

    let status = match model_state {
        ModelState::Failed => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    (
        status,
        Json(HealthResponse {
            status: model_state.as_str(),
            model: session.model_id().to_string(),
            error: session.last_error().map(|e| e.code()),
        }),
    )
}
