//! Response decoration shared by every answer the HTTP adapter writes.
//!
//! These helpers stay stateless; the caller decides from the current
//! service toggles whether to apply them.
use std::time::Instant;

use http::{HeaderMap, HeaderValue, Method, StatusCode};

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

pub const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE";
pub const CORS_ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept, \
Authorization, Cache-Control, Pragma, Expires, If-Modified-Since, If-None-Match, \
X-Request-ID, X-CSRF-Token, X-Api-Key";
pub const CORS_MAX_AGE: &str = "86400";

/// Whether the request is a CORS preflight that should be answered directly.
pub fn is_preflight(method: &Method, cors_enabled: bool) -> bool {
    cors_enabled && method == Method::OPTIONS
}

/// Add permissive CORS headers. Values already present are overwritten.
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    headers.insert(
        "Access-Control-Max-Age",
        HeaderValue::from_static(CORS_MAX_AGE),
    );
}

/// Generate a per-request UUID.
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Expose the request id via `X-Request-ID`.
pub fn apply_request_id(headers: &mut HeaderMap, request_id: &str) {
    if let Ok(header_value) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, header_value);
    }
}

/// Log the completed request. With request logging switched on the line is
/// emitted at `info`, otherwise only at `debug`.
pub fn log_request(
    logs_enabled: bool,
    method: &Method,
    path: &str,
    status: StatusCode,
    started: Instant,
) {
    let elapsed = started.elapsed();
    if logs_enabled {
        tracing::info!("{} {} - {} in {:?}", method, path, status, elapsed);
    } else {
        tracing::debug!("{} {} - {} in {:?}", method, path, status, elapsed);
    }
}
