use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::Encoder;

use crate::state::SharedState;

/// GET /api/metrics
///
/// Returns all registered Prometheus metrics in the standard text exposition
/// format. The registry is shared with the proxy, so gate decision counters
/// show up here too.
pub async fn get_metrics(State(state): State<SharedState>) -> impl IntoResponse {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = state.registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "failed to encode prometheus metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            String::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
