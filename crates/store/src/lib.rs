//! Durable block-list storage.
//!
//! The gate and the registrar share no in-process state; everything flows
//! through a [`BlockStore`] handle. Existence of a key is the signal — values
//! are kept empty — and entries disappear when their TTL elapses.

mod memory;
mod redis;

use async_trait::async_trait;
use rtgate_common::GateResult;
use std::sync::Arc;

pub use memory::MemoryStore;
pub use redis::RedisStore;

/// Key-value store with per-entry expiry.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Look up a key. `None` means absent or expired.
    async fn get(&self, key: &str) -> GateResult<Option<String>>;

    /// Upsert a key with a TTL in seconds. Writing an existing key resets
    /// its expiry clock.
    async fn put(&self, key: &str, value: &str, ttl_secs: u64) -> GateResult<()>;

    /// Liveness check against the backing store. In-process stores are
    /// always live; networked backends override this.
    async fn ping(&self) -> GateResult<()> {
        Ok(())
    }
}

/// Shared store handle passed to both the gate and the registrar.
pub type SharedStore = Arc<dyn BlockStore>;

/// Build a store from configuration.
pub fn from_config(config: &rtgate_common::StoreConfig) -> GateResult<SharedStore> {
    match config.backend {
        rtgate_common::StoreBackend::Redis => Ok(Arc::new(RedisStore::new(&config.url)?)),
        rtgate_common::StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
