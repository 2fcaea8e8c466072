use std::sync::Arc;

use prometheus::{IntCounter, Registry};
use rtgate_common::RegistrarConfig;
use rtgate_store::SharedStore;

/// Shared state type alias used across all route handlers.
pub type SharedState = Arc<AppState>;

/// Registrar state: the block-list handle, the webhook credential, and the
/// metrics registry (shared with the proxy so one scrape covers both).
pub struct AppState {
    pub store: SharedStore,
    pub webhook_token: String,
    pub default_block_ttl_secs: u64,
    pub registry: Registry,
    pub blocks_registered: IntCounter,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create registrar state, registering its counters into `registry`.
    pub fn new(config: &RegistrarConfig, store: SharedStore, registry: Registry) -> Self {
        let blocks_registered = IntCounter::new(
            "rtgate_blocks_registered_total",
            "Block entries written via the registrar webhook",
        )
        .expect("failed to create blocks_registered counter");
        registry
            .register(Box::new(blocks_registered.clone()))
            .expect("failed to register blocks_registered");

        Self {
            store,
            webhook_token: config.webhook_token.clone(),
            default_block_ttl_secs: config.default_block_ttl_secs,
            registry,
            blocks_registered,
            start_time: std::time::Instant::now(),
        }
    }
}
