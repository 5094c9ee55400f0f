use crate::api::error::{ErrorDetail, PredictError};
use axum::extract::{MatchedPath, State};
use axum::response::IntoResponse;
use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::sync::Arc;
use tracing::{error, warn};

/// Header clients put the shared API key in.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Log 4xx at `warn` and 5xx at `error`, with the matched route and the
/// failure detail a [`PredictError`] leaves in the response extensions.
pub async fn log_request_errors(req: Request<Body>, next: Next) -> Response {
    let uri = req.uri().clone();
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "fallback".to_string());

    let response = next.run(req).await;
    let status = response.status();
    let detail = response
        .extensions()
        .get::<ErrorDetail>()
        .map(|detail| detail.0.as_str())
        .unwrap_or("");

    if status.is_client_error() {
        // 4xx error
        warn!(
            method = %method,
            uri = %uri,
            route = %route,
            status = %status,
            detail = %detail,
            "Client error"
        );
    } else if status.is_server_error() {
        // 5xx error
        error!(
            method = %method,
            uri = %uri,
            route = %route,
            status = %status,
            detail = %detail,
            "Server error"
        );
    }

    response
}

/// Require a matching `X-API-KEY` header when a key is configured; pass every
/// request through otherwise.
pub async fn api_key_middleware(
    State(api_key): State<Option<Arc<str>>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(expected) = api_key.as_deref() {
        let provided = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());
        if provided != Some(expected) {
            warn!(has_key = provided.is_some(), "Rejected request with missing or wrong API key");
            return PredictError::Unauthorized.into_response();
        }
    }

    next.run(req).await
}
