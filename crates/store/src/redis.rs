use async_trait::async_trait;
use fred::clients::Client;
use fred::interfaces::*;
use fred::types::{config::Config as RedisConfig, Expiration};
use rtgate_common::{GateError, GateResult};
use tokio::sync::OnceCell;

use crate::BlockStore;

/// Redis-backed block-list store.
///
/// The client connects lazily on first use so the store can be constructed
/// outside an async runtime; fred reconnects on its own after that. A failed
/// connect is retried on the next call.
pub struct RedisStore {
    client: Client,
    connected: OnceCell<()>,
}

impl RedisStore {
    pub fn new(url: &str) -> GateResult<Self> {
        let config = RedisConfig::from_url(url)
            .map_err(|e| GateError::Config(format!("invalid redis url: {e}")))?;
        let client = Client::new(config, None, None, None);
        Ok(Self {
            client,
            connected: OnceCell::new(),
        })
    }

    async fn ensure_connected(&self) -> GateResult<()> {
        self.connected
            .get_or_try_init(|| async {
                self.client
                    .init()
                    .await
                    .map(|_| ())
                    .map_err(|e| GateError::Store(format!("redis connect failed: {e}")))
            })
            .await?;
        Ok(())
    }

}

#[async_trait]
impl BlockStore for RedisStore {
    async fn get(&self, key: &str) -> GateResult<Option<String>> {
        self.ensure_connected().await?;
        let value: Option<String> = self
            .client
            .get(key)
            .await
            .map_err(|e| GateError::Store(e.to_string()))?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, ttl_secs: u64) -> GateResult<()> {
        self.ensure_connected().await?;
        self.client
            .set::<(), _, _>(
                key,
                value,
                Some(Expiration::EX(ttl_secs as i64)),
                None,
                false,
            )
            .await
            .map_err(|e| GateError::Store(e.to_string()))?;
        Ok(())
    }

    async fn ping(&self) -> GateResult<()> {
        self.ensure_connected().await?;
        self.client
            .ping::<()>(None)
            .await
            .map_err(|e| GateError::Store(e.to_string()))
    }
}
