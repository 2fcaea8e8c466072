//! Request gate decision engine.
//!
//! Classifies every inbound request into one of four outcomes: bypass
//! (pre-flight probes), reject (blocked session or automation signature),
//! fast-pass (valid trust cookie), or pass-and-stamp (heuristic pass that
//! earns a trust cookie on the response). The engine keeps no state across
//! requests; everything lives in cookies and the durable block-list.

pub mod cookies;

use rtgate_botcheck::classify_user_agent;
use rtgate_common::{sid_key, GateConfig, StoreFailurePolicy, SID_COOKIE, TRUST_COOKIE};
use rtgate_store::SharedStore;
use tracing::{debug, warn};

use crate::cookies::parse_cookies;

/// Outcome of evaluating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Pre-flight/probe method; forward untouched, no checks.
    Bypass,
    /// Valid trust cookie and no block entry; forward without restamping.
    FastPass,
    /// Heuristic pass; forward and append the trust cookie on the response.
    Stamp,
    /// Terminal 403 with an empty body.
    Reject {
        /// Expire the client's trust cookie in the rejection response.
        /// Set when the session is on the block-list, so the client must
        /// re-qualify once the block lapses.
        expire_trust: bool,
    },
}

/// The per-request decision engine. Cheap to share; holds only configuration
/// and the store handle.
pub struct Gate {
    config: GateConfig,
    store: SharedStore,
}

impl Gate {
    pub fn new(config: GateConfig, store: SharedStore) -> Self {
        Self { config, store }
    }

    /// Evaluate one request. The only suspension point is the block-list
    /// lookup, and that happens at most once per request.
    pub async fn evaluate(
        &self,
        method: &str,
        cookie_header: Option<&str>,
        user_agent: &str,
    ) -> GateDecision {
        // Capability probes never carry the payload a bot would exploit.
        if is_probe_method(method) {
            return GateDecision::Bypass;
        }

        let cookies = parse_cookies(cookie_header.unwrap_or(""));
        // An empty sid value is the same as no sid: never look up `sid:`.
        let sid = cookies.get(SID_COOKIE).filter(|s| !s.is_empty());
        let has_pass = cookies.contains_key(TRUST_COOKIE);

        // Block-list check precedes the fast-pass: a blocked session must
        // not ride an already-issued trust cookie.
        if let Some(sid) = sid {
            match self.store.get(&sid_key(sid)).await {
                Ok(Some(_)) => {
                    debug!(sid = %sid, "session is on the block-list");
                    return GateDecision::Reject { expire_trust: true };
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, policy = ?self.config.store_failure, "block-list lookup failed");
                    if self.config.store_failure == StoreFailurePolicy::FailClosed {
                        return GateDecision::Reject { expire_trust: true };
                    }
                    // Fail-open: treat as absent and keep going.
                }
            }
        }

        if has_pass {
            return GateDecision::FastPass;
        }

        let class = classify_user_agent(user_agent, &self.config.crawler_allowlist);
        if class.is_allowed() {
            GateDecision::Stamp
        } else {
            debug!(?class, user_agent, "user-agent failed heuristic screen");
            GateDecision::Reject {
                expire_trust: false,
            }
        }
    }

    /// `Set-Cookie` value to append when stamping a passed response.
    pub fn stamp_header(&self) -> String {
        cookies::trust_cookie(self.config.trust_ttl_secs)
    }

    /// `Set-Cookie` value attached to blocked-session rejections.
    pub fn expire_header(&self) -> String {
        cookies::expire_trust_cookie()
    }
}

/// Methods forwarded unconditionally: CORS pre-flights and HEAD probes.
fn is_probe_method(method: &str) -> bool {
    method.eq_ignore_ascii_case("OPTIONS") || method.eq_ignore_ascii_case("HEAD")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rtgate_common::{GateError, GateResult};
    use rtgate_store::{BlockStore, MemoryStore};
    use std::sync::Arc;

    const BROWSER_UA: &str =
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";
    const GOOGLEBOT_UA: &str =
        "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
    const HEADLESS_UA: &str =
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 HeadlessChrome/120.0";

    fn gate_with(store: SharedStore, policy: StoreFailurePolicy) -> Gate {
        let config = GateConfig {
            store_failure: policy,
            ..GateConfig::default()
        };
        Gate::new(config, store)
    }

    fn gate() -> (Gate, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (
            gate_with(store.clone(), StoreFailurePolicy::FailOpen),
            store,
        )
    }

    /// Store double whose lookups always fail.
    struct BrokenStore;

    #[async_trait]
    impl BlockStore for BrokenStore {
        async fn get(&self, _key: &str) -> GateResult<Option<String>> {
            Err(GateError::Store("connection refused".into()))
        }
        async fn put(&self, _key: &str, _value: &str, _ttl: u64) -> GateResult<()> {
            Err(GateError::Store("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_probe_methods_bypass_everything() {
        let (gate, store) = gate();
        store.put("sid:abc", "", 60).await.unwrap();

        for method in ["OPTIONS", "HEAD", "options", "head"] {
            let decision = gate
                .evaluate(method, Some("rt_sid=abc"), HEADLESS_UA)
                .await;
            assert_eq!(decision, GateDecision::Bypass, "method {method}");
        }
    }

    #[tokio::test]
    async fn test_blocked_sid_rejected_with_trust_expiry() {
        let (gate, store) = gate();
        store.put("sid:abc", "", 60).await.unwrap();

        let decision = gate
            .evaluate("GET", Some("rt_sid=abc; rt_pass=1"), BROWSER_UA)
            .await;
        assert_eq!(decision, GateDecision::Reject { expire_trust: true });
    }

    #[tokio::test]
    async fn test_fast_pass_skips_heuristic() {
        let (gate, _store) = gate();

        // A UA that would normally be rejected still fast-passes.
        let decision = gate
            .evaluate("GET", Some("rt_sid=abc; rt_pass=1"), HEADLESS_UA)
            .await;
        assert_eq!(decision, GateDecision::FastPass);
    }

    #[tokio::test]
    async fn test_allowed_crawler_stamped() {
        let (gate, _store) = gate();
        let decision = gate.evaluate("GET", None, GOOGLEBOT_UA).await;
        assert_eq!(decision, GateDecision::Stamp);
    }

    #[tokio::test]
    async fn test_headless_rejected_without_expiry() {
        let (gate, _store) = gate();
        let decision = gate.evaluate("GET", None, HEADLESS_UA).await;
        assert_eq!(
            decision,
            GateDecision::Reject {
                expire_trust: false
            }
        );
    }

    #[tokio::test]
    async fn test_bot_token_rejected() {
        let (gate, _store) = gate();
        let decision = gate.evaluate("POST", None, "my bot v1").await;
        assert_eq!(
            decision,
            GateDecision::Reject {
                expire_trust: false
            }
        );
    }

    #[tokio::test]
    async fn test_plain_browser_with_unblocked_sid_stamped() {
        let (gate, _store) = gate();
        let decision = gate.evaluate("GET", Some("rt_sid=abc"), BROWSER_UA).await;
        assert_eq!(decision, GateDecision::Stamp);
    }

    #[tokio::test]
    async fn test_no_cookies_at_all_stamped() {
        let (gate, _store) = gate();
        let decision = gate.evaluate("GET", None, BROWSER_UA).await;
        assert_eq!(decision, GateDecision::Stamp);
    }

    #[tokio::test]
    async fn test_expired_block_passes_again() {
        let (gate, store) = gate();
        store.put("sid:abc", "", 60).await.unwrap();
        // Simulate expiry by letting the trust cookie carry the session.
        tokio::time::pause();
        tokio::time::advance(std::time::Duration::from_secs(61)).await;

        let decision = gate
            .evaluate("GET", Some("rt_sid=abc; rt_pass=1"), BROWSER_UA)
            .await;
        assert_eq!(decision, GateDecision::FastPass);
    }

    #[tokio::test]
    async fn test_fail_open_falls_through_to_heuristic() {
        let gate = gate_with(Arc::new(BrokenStore), StoreFailurePolicy::FailOpen);

        let decision = gate.evaluate("GET", Some("rt_sid=abc"), BROWSER_UA).await;
        assert_eq!(decision, GateDecision::Stamp);

        let decision = gate.evaluate("GET", Some("rt_sid=abc"), HEADLESS_UA).await;
        assert_eq!(
            decision,
            GateDecision::Reject {
                expire_trust: false
            }
        );
    }

    #[tokio::test]
    async fn test_fail_closed_rejects_on_store_error() {
        let gate = gate_with(Arc::new(BrokenStore), StoreFailurePolicy::FailClosed);

        let decision = gate
            .evaluate("GET", Some("rt_sid=abc; rt_pass=1"), BROWSER_UA)
            .await;
        assert_eq!(decision, GateDecision::Reject { expire_trust: true });
    }

    #[tokio::test]
    async fn test_empty_sid_value_treated_as_absent() {
        // No lookup for an empty sid, so even a broken store in fail-closed
        // mode cannot reject it.
        let gate = gate_with(Arc::new(BrokenStore), StoreFailurePolicy::FailClosed);

        let decision = gate.evaluate("GET", Some("rt_sid="), BROWSER_UA).await;
        assert_eq!(decision, GateDecision::Stamp);
    }

    #[tokio::test]
    async fn test_store_not_consulted_without_sid() {
        // No sid cookie means no lookup, so a broken store is harmless.
        let gate = gate_with(Arc::new(BrokenStore), StoreFailurePolicy::FailClosed);

        let decision = gate.evaluate("GET", Some("rt_pass=1"), BROWSER_UA).await;
        assert_eq!(decision, GateDecision::FastPass);
    }
}
