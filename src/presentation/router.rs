use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware;
use axum::routing::{get, post};
use tower::Layer;
use tower::util::{MapRequest, MapRequestLayer};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::application::services::SecurityGate;
use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{health_handler, root_handler, transcription_handler};
use crate::presentation::middleware::{
    API_KEY_HEADER, normalize_request_path, security_middleware, with_hardening_headers,
};
use crate::presentation::state::AppState;

/// The served application: path normalization wrapped around the router.
pub type App = MapRequest<Router, fn(Request) -> Request>;

/// Path rewriting has to happen outside the router; layers added with
/// `Router::layer` only run after a route has matched.
pub fn create_app(state: AppState) -> App {
    MapRequestLayer::new(normalize_request_path as fn(Request) -> Request)
        .layer(create_router(state))
}

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.security);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/v1/audio/transcriptions", post(transcription_handler))
        // Size is enforced while streaming the file field instead.
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.security),
            security_middleware,
        ))
        .layer(cors)
        .with_state(state);

    with_hardening_headers(router)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
}

fn cors_layer(gate: &SecurityGate) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(API_KEY_HEADER),
        ]);

    if gate.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = gate
        .allowed_origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
