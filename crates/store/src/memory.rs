use async_trait::async_trait;
use dashmap::DashMap;
use rtgate_common::GateResult;
use std::time::Duration;
use tokio::time::Instant;

use crate::BlockStore;

/// In-process block-list store with lazy expiry.
///
/// Expired entries are dropped when they are next read; there is no sweeper
/// task, which is fine for a store whose only query is point lookup.
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockStore for MemoryStore {
    async fn get(&self, key: &str) -> GateResult<Option<String>> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Drop the read guard before removing.
        self.entries.remove_if(key, |_, e| e.expires_at <= Instant::now());
        Ok(None)
    }

    async fn put(&self, key: &str, value: &str, ttl_secs: u64) -> GateResult<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryStore::new();
        store.put("sid:abc", "", 60).await.unwrap();
        assert_eq!(store.get("sid:abc").await.unwrap(), Some(String::new()));
        assert_eq!(store.get("sid:other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_is_single_entry() {
        let store = MemoryStore::new();
        store.put("sid:abc", "", 60).await.unwrap();
        store.put("sid:abc", "", 120).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires() {
        let store = MemoryStore::new();
        store.put("sid:abc", "", 1).await.unwrap();
        assert!(store.get("sid:abc").await.unwrap().is_some());

        tokio::time::advance(Duration::from_millis(1100)).await;
        assert_eq!(store.get("sid:abc").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewrite_resets_ttl() {
        let store = MemoryStore::new();
        store.put("sid:abc", "", 2).await.unwrap();

        tokio::time::advance(Duration::from_millis(1500)).await;
        store.put("sid:abc", "", 2).await.unwrap();

        tokio::time::advance(Duration::from_millis(1500)).await;
        // 3 s after the first write, but only 1.5 s after the reset.
        assert!(store.get("sid:abc").await.unwrap().is_some());
    }
}
