use serde::{Deserialize, Serialize};

/// Top-level gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub gate: GateConfig,
    pub registrar: RegistrarConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen: Vec<String>,
    #[serde(default = "default_registrar_listen")]
    pub registrar_listen: String,
}

/// The origin the gate fronts. Passed requests are forwarded here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_name")]
    pub name: String,
    pub servers: Vec<UpstreamServer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamServer {
    pub addr: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Lifetime of the trust cookie issued after a heuristic pass.
    #[serde(default = "default_trust_ttl")]
    pub trust_ttl_secs: u64,
    /// What to do when the block-list store is unreachable.
    #[serde(default = "default_store_failure")]
    pub store_failure: StoreFailurePolicy,
    /// Extra user-agent substrings treated as known-good crawlers.
    #[serde(default)]
    pub crawler_allowlist: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            trust_ttl_secs: default_trust_ttl(),
            store_failure: default_store_failure(),
            crawler_allowlist: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreFailurePolicy {
    /// Treat a failed lookup as entry-absent and fall through to the heuristic.
    FailOpen,
    /// Treat a failed lookup as blocked.
    FailClosed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// Shared secret compared against `Authorization: Bearer <token>`.
    pub webhook_token: String,
    #[serde(default = "default_block_ttl")]
    pub default_block_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            url: default_redis_url(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    /// Process-local store; suitable for single-node deployments and tests.
    Memory,
}

// Default value helpers
fn default_registrar_listen() -> String {
    "127.0.0.1:9090".to_string()
}
fn default_upstream_name() -> String {
    "origin".to_string()
}
fn default_weight() -> u32 {
    1
}
fn default_trust_ttl() -> u64 {
    crate::DAY_SECS
}
fn default_store_failure() -> StoreFailurePolicy {
    StoreFailurePolicy::FailOpen
}
fn default_block_ttl() -> u64 {
    crate::DAY_SECS
}
fn default_store_backend() -> StoreBackend {
    StoreBackend::Redis
}
fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.listen.is_empty() {
            anyhow::bail!("server.listen must have at least one address");
        }

        if self.upstream.servers.is_empty() {
            anyhow::bail!("upstream '{}' has no servers", self.upstream.name);
        }

        if self.registrar.webhook_token.is_empty() {
            anyhow::bail!("registrar.webhook_token must not be empty");
        }

        if self.gate.trust_ttl_secs == 0 {
            anyhow::bail!("gate.trust_ttl_secs must be positive");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r#"
server:
  listen: ["0.0.0.0:8080"]
upstream:
  servers:
    - addr: "127.0.0.1:3000"
registrar:
  webhook_token: "s3cret"
"#
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config: AppConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.gate.trust_ttl_secs, 86_400);
        assert_eq!(config.gate.store_failure, StoreFailurePolicy::FailOpen);
        assert_eq!(config.registrar.default_block_ttl_secs, 86_400);
        assert_eq!(config.store.backend, StoreBackend::Redis);
        assert_eq!(config.server.registrar_listen, "127.0.0.1:9090");
        assert_eq!(config.upstream.servers[0].weight, 1);
    }

    #[test]
    fn test_empty_token_rejected() {
        let yaml = minimal_yaml().replace("s3cret", "");
        let config: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_no_upstream_servers_rejected() {
        let yaml = r#"
server:
  listen: ["0.0.0.0:8080"]
upstream:
  servers: []
registrar:
  webhook_token: "s3cret"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fail_closed_parses() {
        let yaml = format!("{}gate:\n  store_failure: fail_closed\n", minimal_yaml());
        let config: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.gate.store_failure, StoreFailurePolicy::FailClosed);
    }
}
