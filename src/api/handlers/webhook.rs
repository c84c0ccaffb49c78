//! Catch-all webhook endpoint.
//!
//! Every request that is not `GET /health` lands here, whatever its path or
//! method, so that providers can be matched on either.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
};

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::webhook::{DispatchOutcome, WebhookRequest};

/// Hands the request to the dispatcher.
///
/// Anything a provider recognized is acknowledged with `200 OK`, even when
/// its payload failed to decode, so the sender does not retry a request that
/// can never succeed. Unrecognized requests get `404`.
pub async fn receive_webhook(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<StatusCode> {
    let request = WebhookRequest::new(method, uri.path(), headers, body);

    match state.dispatcher.handle_and_dispatch(&request).await {
        DispatchOutcome::Unrouted => Err(AppError::unrouted(request.method(), request.path())),
        DispatchOutcome::Delivered { .. } | DispatchOutcome::DecodeFailed { .. } => Ok(StatusCode::OK),
    }
}
