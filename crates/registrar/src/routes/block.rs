use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use rtgate_common::sid_key;

use crate::state::SharedState;

/// Request body for the block webhook.
#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    #[serde(default)]
    pub sid: String,
    /// TTL in seconds; defaults to the configured block TTL (24 h).
    pub ttl: Option<u64>,
}

/// POST /rt-block
///
/// Writes one block entry at `sid:<sid>`. Calling it again for the same sid
/// resets the TTL clock; there is no accumulation and no explicit delete.
/// Responses are bare status codes — the one diagnostic body is
/// `sid required` — so a probing bot learns nothing from this endpoint.
pub async fn register_block(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Bearer auth before touching the body.
    let expected = format!("Bearer {}", state.webhook_token);
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if presented != Some(expected.as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let request: BlockRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = %e, "undecodable block request body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if request.sid.is_empty() {
        return (StatusCode::BAD_REQUEST, "sid required").into_response();
    }
    if request.ttl == Some(0) {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let ttl = request.ttl.unwrap_or(state.default_block_ttl_secs);

    match state.store.put(&sid_key(&request.sid), "", ttl).await {
        Ok(()) => {
            state.blocks_registered.inc();
            tracing::info!(sid = %request.sid, ttl_secs = ttl, "block entry registered");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, sid = %request.sid, "block entry write failed");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
