use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::domain::ModelState;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct RootResponse {
    pub status: &'static str,
}

pub async fn root_handler(State(state): State<AppState>) -> Json<RootResponse> {
    let status = match state.pipeline.session().state() {
        ModelState::Ready => "ok",
        _ => "error",
    };

    Json(RootResponse { status })
}
