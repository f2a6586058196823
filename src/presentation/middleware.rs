use std::sync::Arc;

use axum::extract::{Request, State};
use axum::Router;
use axum::http::uri::PathAndQuery;
use axum::http::{HeaderMap, HeaderValue, Uri, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::application::services::SecurityGate;
use crate::presentation::handlers::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Origin and API-key checks. Runs before any extractor touches the body,
/// so a rejected request never reaches upload handling.
pub async fn security_middleware(
    State(gate): State<Arc<SecurityGate>>,
    request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();
    let path = request.uri().path();

    let decision = gate
        .check_origin(header_str(headers, header::ORIGIN.as_str()))
        .and_then(|()| {
            gate.authorize(
                path,
                header_str(headers, header::AUTHORIZATION.as_str()),
                header_str(headers, API_KEY_HEADER),
            )
        });

    if let Err(error) = decision {
        tracing::warn!(path = %path, reason = %error, "Request blocked by security gate");
        return ApiError::from(error).into_response();
    }

    next.run(request).await
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Collapses runs of `/` in the request path before routing, so
/// `//v1/audio/transcriptions` reaches the same handler and the same
/// public-path rules as `/v1/audio/transcriptions`.
pub fn normalize_request_path(mut request: Request) -> Request {
    let Some(path) = collapse_slashes(request.uri().path()) else {
        return request;
    };

    let path_and_query = match request.uri().query() {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    };

    let mut parts = request.uri().clone().into_parts();
    match PathAndQuery::try_from(path_and_query) {
        Ok(normalized) => parts.path_and_query = Some(normalized),
        Err(_) => return request,
    }
    if let Ok(uri) = Uri::from_parts(parts) {
        *request.uri_mut() = uri;
    }
    request
}

/// `None` when the path has no repeated slash.
pub fn collapse_slashes(path: &str) -> Option<String> {
    if !path.contains("//") {
        return None;
    }

    let mut collapsed = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' && previous_slash {
            continue;
        }
        previous_slash = c == '/';
        collapsed.push(c);
    }
    Some(collapsed)
}

/// Adds headers sent on every response, including error responses.
pub fn with_hardening_headers(router: Router) -> Router {
    router
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
}
