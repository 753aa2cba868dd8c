//! Draft endpoint handlers.
//!
//! A single route owns the whole pipeline: CORS negotiation, method gating,
//! prompt validation, rate limiting, the upstream call, and output cleanup.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::error::DraftError;
use crate::middleware::cors::cors_headers;
use crate::services::rate_limit::{caller_identity, RateDecision};
use crate::services::sanitize::strip_code_fences;
use crate::AppState;

/// Returned when the upstream answer carries no usable text.
pub const FALLBACK_DRAFT: &str = "Sorry, could not generate a draft right now.";

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub draft: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// Entry point for the root path. Preflight and method gating happen here;
/// POST requests continue into [`generate_draft`].
#[tracing::instrument(skip_all, fields(method = %method))]
pub async fn draft_entry(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let cors = cors_headers(headers.get(header::ORIGIN));

    if method == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        response.headers_mut().extend(cors);
        return response;
    }

    if method != Method::POST {
        let mut response = (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
        response.headers_mut().extend(cors);
        return response;
    }

    match generate_draft(&state, &headers, &body, &cors).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, "Draft request failed");
            err.into_response()
        }
    }
}

/// The POST pipeline. Expected outcomes (missing prompt, rate limit,
/// unconfigured credential, success) build their responses here with the
/// CORS set attached; everything unexpected propagates as [`DraftError`].
async fn generate_draft(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
    cors: &HeaderMap,
) -> Result<Response, DraftError> {
    let payload: Value = serde_json::from_slice(body)?;

    let Some(prompt) = payload
        .get("prompt")
        .and_then(Value::as_str)
        .filter(|prompt| !prompt.is_empty())
    else {
        return Ok(error_response(StatusCode::BAD_REQUEST, "Missing prompt", cors));
    };

    let identity = caller_identity(headers);
    let decision = state
        .limiter
        .check(&identity, Utc::now())
        .await
        .map_err(DraftError::Store)?;

    let counts = match decision {
        RateDecision::Allowed(counts) => counts,
        RateDecision::Limited => {
            tracing::info!(identity = %identity, "Rate limit exceeded");
            return Ok(error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded",
                cors,
            ));
        }
    };

    // Increments are scheduled before the credential check, so a request
    // that ends in 500 still consumes quota.
    state.limiter.record(counts, &state.background);

    let Some(generator) = state.generator.as_ref() else {
        tracing::error!("GEMINI_API_KEY is not configured");
        return Ok(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server not configured",
            cors,
        ));
    };

    let text = generator
        .generate(&state.config.upstream.system_prompt, prompt)
        .await?
        .unwrap_or_else(|| FALLBACK_DRAFT.to_string());
    let draft = strip_code_fences(&text);

    tracing::info!(identity = %identity, draft_len = draft.len(), "Draft generated");

    let mut response = (StatusCode::OK, Json(DraftResponse { draft })).into_response();
    response.headers_mut().extend(cors.clone());
    Ok(response)
}

fn error_response(status: StatusCode, message: &'static str, cors: &HeaderMap) -> Response {
    let mut response = (status, Json(ErrorBody { error: message })).into_response();
    response.headers_mut().extend(cors.clone());
    response
}
