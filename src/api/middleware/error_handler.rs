//! Conversion of errors into JSON [`ErrorResponse`] bodies.

use axum::{
    Json,
    body::Body,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::RequestId;
use crate::api::dto::ErrorResponse;
use crate::error::AppError;

/// Error bodies larger than this are replaced rather than parsed.
const MAX_ERROR_BODY: usize = 64 * 1024;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Unrouted { method, path } => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("UNROUTED", "No provider recognized the request").with_details(
                    json!({
                        "method": method,
                        "path": path,
                    }),
                ),
            ),
            AppError::Configuration { key, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("CONFIGURATION_ERROR", &format!("Configuration error: {}", key))
                    .with_details(json!({
                        "key": key
                    })),
            ),
            AppError::Registry(_) | AppError::Server(_) | AppError::Internal { .. } => {
                tracing::error!(error = ?self, "Internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Rewrites every 4xx/5xx response as an [`ErrorResponse`] carrying the
/// request ID.
///
/// Responses produced by [`AppError`] are already JSON and only gain the
/// request ID. Plain-text rejections from axum and tower-http (body too
/// large, timeouts, wrong method on `/health`) are wrapped.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().cloned();
    let response = next.run(request).await;

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    let (mut parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_ERROR_BODY)
        .await
        .unwrap_or_default();

    let parsed = if is_json {
        serde_json::from_slice::<ErrorResponse>(&bytes).ok()
    } else {
        None
    };

    let mut error_response = match parsed {
        Some(parsed) => parsed,
        None => {
            let original = String::from_utf8_lossy(&bytes).trim().to_string();
            let message = if original.is_empty() {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            } else {
                original
            };
            ErrorResponse::new(status_code_name(status), &message)
        }
    };

    if error_response.request_id.is_none()
        && let Some(RequestId(id)) = &request_id
    {
        error_response = error_response.with_request_id(id);
    }

    match serde_json::to_vec(&error_response) {
        Ok(body) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            parts.headers.insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("application/json"),
            );
            Response::from_parts(parts, Body::from(body))
        }
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}

fn status_code_name(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::REQUEST_TIMEOUT => "REQUEST_TIMEOUT",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::SERVICE_UNAVAILABLE => "SERVICE_UNAVAILABLE",
        s if s.is_server_error() => "INTERNAL_SERVER_ERROR",
        _ => "UNKNOWN_ERROR",
    }
}
