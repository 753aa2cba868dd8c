//! CORS header construction for the draft endpoint.
//!
//! The endpoint is called from browser pages on arbitrary origins, so the
//! allow-origin value echoes whatever `Origin` the request carried and falls
//! back to `*` for callers that send none (curl, file:// pages).

use axum::http::{header, HeaderMap, HeaderValue};

const ALLOWED_METHODS: &str = "POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";
const PREFLIGHT_MAX_AGE: &str = "86400";

/// Build the CORS header set for one request.
pub fn cors_headers(request_origin: Option<&HeaderValue>) -> HeaderMap {
    let allow_origin = request_origin
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    let mut headers = HeaderMap::new();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(PREFLIGHT_MAX_AGE),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    headers
}
