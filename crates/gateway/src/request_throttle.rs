//! Fixed-window per-IP rate limiting.
//!
//! One window per client IP, owned by the server state rather than a
//! global. Expired windows are swept inline every few hundred requests, so
//! there is no background timer to start or stop. Both allowed and denied
//! responses carry the `X-RateLimit-*` trio; denials add `Retry-After`.

use std::{
    net::{IpAddr, SocketAddr},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

use {
    axum::{
        body::Body,
        extract::{ConnectInfo, State},
        http::{HeaderMap, HeaderName, Request, StatusCode, header},
        middleware::Next,
        response::{IntoResponse, Json, Response},
    },
    dashmap::{DashMap, mapref::entry::Entry},
};

use vellum_config::ThrottleConfig;

use crate::server::AppState;

const CLEANUP_EVERY_REQUESTS: u64 = 512;

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Clone)]
pub struct RequestThrottle {
    limits: ThrottleConfig,
    buckets: Arc<DashMap<IpAddr, WindowState>>,
    requests_seen: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy)]
struct WindowState {
    reset_at_ms: u64,
    count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed { remaining: u32, reset_at_ms: u64 },
    Denied { retry_after_secs: u64, reset_at_ms: u64 },
}

impl RequestThrottle {
    #[must_use]
    pub fn new(limits: ThrottleConfig) -> Self {
        Self {
            limits,
            buckets: Arc::new(DashMap::new()),
            requests_seen: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.limits.max_requests
    }

    fn check(&self, ip: IpAddr) -> ThrottleDecision {
        self.check_at(ip, epoch_millis())
    }

    /// Count one request against `ip`'s current window.
    ///
    /// The counter increments before the limit check, so request
    /// `max_requests + 1` inside a window is the first one denied.
    fn check_at(&self, ip: IpAddr, now_ms: u64) -> ThrottleDecision {
        let limit = self.limits.max_requests;
        let decision = match self.buckets.entry(ip) {
            Entry::Occupied(mut occupied) => {
                let state = occupied.get_mut();
                if state.reset_at_ms < now_ms {
                    state.reset_at_ms = now_ms + self.limits.window_ms;
                    state.count = 0;
                }
                state.count += 1;
                if state.count > limit {
                    ThrottleDecision::Denied {
                        retry_after_secs: state.reset_at_ms.saturating_sub(now_ms).div_ceil(1000),
                        reset_at_ms: state.reset_at_ms,
                    }
                } else {
                    ThrottleDecision::Allowed {
                        remaining: limit - state.count,
                        reset_at_ms: state.reset_at_ms,
                    }
                }
            },
            Entry::Vacant(vacant) => {
                let state = vacant.insert(WindowState {
                    reset_at_ms: now_ms + self.limits.window_ms,
                    count: 1,
                });
                if limit == 0 {
                    ThrottleDecision::Denied {
                        retry_after_secs: self.limits.window_ms.div_ceil(1000),
                        reset_at_ms: state.reset_at_ms,
                    }
                } else {
                    ThrottleDecision::Allowed {
                        remaining: limit - 1,
                        reset_at_ms: state.reset_at_ms,
                    }
                }
            },
        };

        self.cleanup_if_needed(now_ms);
        decision
    }

    fn cleanup_if_needed(&self, now_ms: u64) {
        let seen = self.requests_seen.fetch_add(1, Ordering::Relaxed) + 1;
        if !seen.is_multiple_of(CLEANUP_EVERY_REQUESTS) {
            return;
        }
        self.buckets.retain(|_, state| state.reset_at_ms >= now_ms);
    }
}

pub async fn throttle_gate(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if path == "/health" || path == "/" {
        return next.run(request).await;
    }

    let client_ip = resolve_client_ip(request.headers(), addr);
    let limit = state.throttle.max_requests();
    match state.throttle.check(client_ip) {
        ThrottleDecision::Allowed {
            remaining,
            reset_at_ms,
        } => {
            let mut response = next.run(request).await;
            apply_rate_headers(response.headers_mut(), limit, remaining, reset_at_ms);
            response
        },
        ThrottleDecision::Denied {
            retry_after_secs,
            reset_at_ms,
        } => {
            tracing::warn!(ip = %client_ip, path, "rate limit exceeded");
            rate_limited_response(limit, retry_after_secs, reset_at_ms)
        },
    }
}

fn rate_limited_response(limit: u32, retry_after_secs: u64, reset_at_ms: u64) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "error": "Too many requests",
            "retryAfter": retry_after_secs,
        })),
    )
        .into_response();

    let headers = response.headers_mut();
    if let Ok(value) = retry_after_secs.to_string().parse() {
        headers.insert(header::RETRY_AFTER, value);
    }
    apply_rate_headers(headers, limit, 0, reset_at_ms);
    response
}

fn apply_rate_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_at_ms: u64) {
    insert_numeric(headers, LIMIT_HEADER, u64::from(limit));
    insert_numeric(headers, REMAINING_HEADER, u64::from(remaining));
    insert_numeric(headers, RESET_HEADER, reset_at_ms);
}

fn insert_numeric(headers: &mut HeaderMap, name: HeaderName, value: u64) {
    if let Ok(value) = value.to_string().parse() {
        headers.insert(name, value);
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn resolve_client_ip(headers: &HeaderMap, addr: SocketAddr) -> IpAddr {
    if let Some(ip) = forwarded_ip(headers) {
        return ip;
    }
    addr.ip()
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let xff = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok());
    if let Some(xff) = xff
        && let Some(ip) = xff
            .split(',')
            .find_map(|candidate| parse_ip(candidate.trim()))
    {
        return Some(ip);
    }

    let xri = headers.get("x-real-ip").and_then(|v| v.to_str().ok());
    if let Some(xri) = xri
        && let Some(ip) = parse_ip(xri.trim())
    {
        return Some(ip);
    }

    None
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    if value.is_empty() {
        return None;
    }
    if let Ok(ip) = value.parse::<IpAddr>() {
        return Some(ip);
    }
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Some(addr.ip());
    }
    None
}
