pub mod config;
pub mod error;

pub use config::{
    AppConfig, GateConfig, RegistrarConfig, ServerConfig, StoreBackend, StoreConfig,
    StoreFailurePolicy, UpstreamConfig, UpstreamServer,
};
pub use error::{GateError, GateResult};

/// Cookie carrying the opaque session identifier.
pub const SID_COOKIE: &str = "rt_sid";

/// Cookie marking a session that already passed heuristic screening.
pub const TRUST_COOKIE: &str = "rt_pass";

/// Block-list key prefix; full keys are `sid:<sid>`.
pub const SID_KEY_PREFIX: &str = "sid:";

/// Default TTL for both block entries and the trust cookie (24 h).
pub const DAY_SECS: u64 = 86_400;

/// Build the block-list key for a session identifier.
pub fn sid_key(sid: &str) -> String {
    format!("{}{}", SID_KEY_PREFIX, sid)
}
