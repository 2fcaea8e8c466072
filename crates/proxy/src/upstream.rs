use rtgate_common::UpstreamConfig;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Selects origin servers with weighted round-robin.
pub struct UpstreamSelector {
    pub name: String,
    servers: Vec<String>,
    /// Round-robin index into the weight-expanded list.
    counter: AtomicUsize,
    /// Server indices expanded by weight: weight 3 → three slots.
    weighted_indices: Vec<usize>,
}

impl UpstreamSelector {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        let servers: Vec<String> = config.servers.iter().map(|s| s.addr.clone()).collect();

        let mut weighted_indices = Vec::new();
        for (i, server) in config.servers.iter().enumerate() {
            for _ in 0..server.weight {
                weighted_indices.push(i);
            }
        }
        if weighted_indices.is_empty() && !servers.is_empty() {
            // All weights zero; fall back to equal weight.
            weighted_indices.extend(0..servers.len());
        }

        Self {
            name: config.name.clone(),
            servers,
            counter: AtomicUsize::new(0),
            weighted_indices,
        }
    }

    /// Select the next origin address.
    pub fn select(&self) -> Option<&str> {
        if self.weighted_indices.is_empty() {
            return None;
        }
        let idx = self.counter.fetch_add(1, Ordering::Relaxed) % self.weighted_indices.len();
        Some(&self.servers[self.weighted_indices[idx]])
    }
}
