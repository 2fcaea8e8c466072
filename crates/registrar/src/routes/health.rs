use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use rtgate_store::BlockStore;

use crate::state::SharedState;

/// GET /api/health
///
/// Reports registrar health and uptime, pinging the block-list store so a
/// dead backend shows up as degraded rather than silently failing requests.
pub async fn health_check(State(state): State<SharedState>) -> Json<Value> {
    let uptime = state.start_time.elapsed().as_secs();
    let store_ok = state.store.ping().await.is_ok();

    Json(json!({
        "status": if store_ok { "healthy" } else { "degraded" },
        "store": if store_ok { "ok" } else { "unreachable" },
        "uptime_secs": uptime,
        "version": env!("CARGO_PKG_VERSION")
    }))
}
