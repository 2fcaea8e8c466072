use async_trait::async_trait;
use http::StatusCode;
use pingora_core::prelude::*;
use pingora_core::upstreams::peer::HttpPeer;
use pingora_http::{RequestHeader, ResponseHeader};
use pingora_proxy::{ProxyHttp, Session};
use prometheus::{HistogramVec, IntCounter, Registry};
use std::sync::Arc;
use tracing::{debug, info};

use rtgate_common::AppConfig;
use rtgate_gate::{Gate, GateDecision};
use rtgate_store::SharedStore;

use crate::context::RequestContext;
use crate::upstream::UpstreamSelector;

/// The gate's host: a reverse proxy that evaluates every request before it
/// reaches the origin and stamps the trust cookie on passed responses.
pub struct RtGateProxy {
    pub gate: Arc<Gate>,
    pub upstream: UpstreamSelector,
    pub metrics: Arc<ProxyMetrics>,
}

pub struct ProxyMetrics {
    pub requests_total: IntCounter,
    pub requests_blocked: IntCounter,
    pub fast_passes: IntCounter,
    pub trust_cookies_issued: IntCounter,
    pub preflight_bypassed: IntCounter,
    pub request_duration: HistogramVec,
}

impl ProxyMetrics {
    /// Create and register all proxy metrics against the shared registry.
    pub fn new(registry: &Registry) -> Self {
        let requests_total =
            IntCounter::new("rtgate_requests_total", "Total requests processed").unwrap();
        let requests_blocked =
            IntCounter::new("rtgate_requests_blocked_total", "Requests rejected by the gate")
                .unwrap();
        let fast_passes = IntCounter::new(
            "rtgate_fast_passes_total",
            "Requests forwarded on a valid trust cookie",
        )
        .unwrap();
        let trust_cookies_issued = IntCounter::new(
            "rtgate_trust_cookies_issued_total",
            "Trust cookies stamped on passed responses",
        )
        .unwrap();
        let preflight_bypassed = IntCounter::new(
            "rtgate_preflight_bypassed_total",
            "Pre-flight/probe requests forwarded unconditionally",
        )
        .unwrap();
        let request_duration = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "rtgate_request_duration_seconds",
                "Request duration in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
            &["decision"],
        )
        .unwrap();

        registry.register(Box::new(requests_total.clone())).unwrap();
        registry.register(Box::new(requests_blocked.clone())).unwrap();
        registry.register(Box::new(fast_passes.clone())).unwrap();
        registry
            .register(Box::new(trust_cookies_issued.clone()))
            .unwrap();
        registry
            .register(Box::new(preflight_bypassed.clone()))
            .unwrap();
        registry.register(Box::new(request_duration.clone())).unwrap();

        Self {
            requests_total,
            requests_blocked,
            fast_passes,
            trust_cookies_issued,
            preflight_bypassed,
            request_duration,
        }
    }
}

impl RtGateProxy {
    pub fn new(config: &AppConfig, store: SharedStore, registry: &Registry) -> Self {
        let gate = Arc::new(Gate::new(config.gate.clone(), store));
        let upstream = UpstreamSelector::from_config(&config.upstream);
        let metrics = Arc::new(ProxyMetrics::new(registry));

        Self {
            gate,
            upstream,
            metrics,
        }
    }
}

fn decision_label(decision: GateDecision) -> &'static str {
    match decision {
        GateDecision::Bypass => "bypass",
        GateDecision::FastPass => "fast_pass",
        GateDecision::Stamp => "stamp",
        GateDecision::Reject { .. } => "reject",
    }
}

#[async_trait]
impl ProxyHttp for RtGateProxy {
    type CTX = RequestContext;

    fn new_ctx(&self) -> Self::CTX {
        RequestContext::new()
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        self.metrics.requests_total.inc();

        let header = session.req_header();
        ctx.method = header.method.as_str().to_string();
        ctx.uri = header
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
            .to_string();

        // Client IP from X-Forwarded-For, falling back to the socket.
        ctx.client_ip = header
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| {
                session
                    .client_addr()
                    .map(|a| a.to_string())
                    .unwrap_or_default()
            });

        let cookie_header = header
            .headers
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let user_agent = header
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let decision = self
            .gate
            .evaluate(&ctx.method, cookie_header.as_deref(), &user_agent)
            .await;
        ctx.decision = Some(decision);

        match decision {
            GateDecision::Bypass => {
                self.metrics.preflight_bypassed.inc();
                Ok(false)
            }
            GateDecision::FastPass => {
                self.metrics.fast_passes.inc();
                Ok(false)
            }
            GateDecision::Stamp => {
                ctx.stamp_trust = true;
                Ok(false)
            }
            GateDecision::Reject { expire_trust } => {
                debug!(client_ip = %ctx.client_ip, uri = %ctx.uri, "request rejected by gate");
                self.metrics.requests_blocked.inc();
                ctx.response_status = StatusCode::FORBIDDEN.as_u16();

                let mut resp = ResponseHeader::build(StatusCode::FORBIDDEN, Some(1)).unwrap();
                if expire_trust {
                    resp.insert_header("set-cookie", self.gate.expire_header())
                        .unwrap();
                }
                session.set_keepalive(None);
                session.write_response_header(Box::new(resp), false).await?;
                // Empty body on purpose: a rejected bot learns nothing.
                session.write_response_body(None, true).await?;
                Ok(true)
            }
        }
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        let addr = self
            .upstream
            .select()
            .ok_or_else(|| Error::new(ErrorType::ConnectProxyFailure))?;

        debug!(upstream = %self.upstream.name, addr, "selected origin peer");

        let peer = HttpPeer::new(addr, false, String::new());
        Ok(Box::new(peer))
    }

    async fn upstream_request_filter(
        &self,
        _session: &mut Session,
        upstream_request: &mut RequestHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()> {
        if !ctx.client_ip.is_empty() {
            upstream_request
                .insert_header("x-real-ip", &ctx.client_ip)
                .unwrap();
        }
        Ok(())
    }

    async fn response_filter(
        &self,
        _session: &mut Session,
        upstream_response: &mut ResponseHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()>
    where
        Self::CTX: Send + Sync,
    {
        ctx.response_status = upstream_response.status.as_u16();

        // Origin status and body pass through untouched; the only addition
        // is the trust cookie on a heuristic pass.
        if ctx.stamp_trust {
            upstream_response
                .append_header("set-cookie", self.gate.stamp_header())
                .unwrap();
            self.metrics.trust_cookies_issued.inc();
        }

        Ok(())
    }

    async fn logging(
        &self,
        _session: &mut Session,
        _error: Option<&pingora_core::Error>,
        ctx: &mut Self::CTX,
    ) {
        let duration = ctx.request_start.elapsed();

        let label = ctx.decision.map(decision_label).unwrap_or("none");
        self.metrics
            .request_duration
            .with_label_values(&[label])
            .observe(duration.as_secs_f64());

        info!(
            client_ip = %ctx.client_ip,
            method = %ctx.method,
            uri = %ctx.uri,
            status = ctx.response_status,
            duration_ms = duration.as_millis() as u64,
            decision = label,
            "request completed"
        );
    }
}
