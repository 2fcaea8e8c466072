use rtgate_gate::GateDecision;
use std::time::Instant;

/// Per-request context carried through the Pingora proxy pipeline.
pub struct RequestContext {
    /// Client IP address string.
    pub client_ip: String,

    /// HTTP method (cached for logging).
    pub method: String,

    /// Request URI (cached for logging).
    pub uri: String,

    /// Request start time for latency measurement.
    pub request_start: Instant,

    /// Gate decision for this request.
    pub decision: Option<GateDecision>,

    /// Whether to append the trust cookie on the response path.
    pub stamp_trust: bool,

    /// Response status code (set during response phase).
    pub response_status: u16,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            client_ip: String::new(),
            method: String::new(),
            uri: String::new(),
            request_start: Instant::now(),
            decision: None,
            stamp_trust: false,
            response_status: 0,
        }
    }
}
