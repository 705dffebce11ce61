//! API middleware.

use std::collections::HashMap;
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderValue, Method, Request, Response};
use axum::middleware::Next;
use axum::response::IntoResponse;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn, Span};
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics;

/// Limiter for one client within one window.
pub type WindowRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Maximum number of IPs to track in rate limiter cache.
const MAX_RATE_LIMITER_ENTRIES: usize = 10_000;

#[derive(Clone)]
struct ClientWindow {
    limiter: Arc<WindowRateLimiter>,
    started: Instant,
}

/// Per-IP rate limiter: at most `max` requests per `window`.
///
/// A client's window opens with its first request and its whole allowance
/// comes back once the window has elapsed.
#[derive(Clone)]
pub struct RateLimiterCache {
    windows: Arc<RwLock<HashMap<IpAddr, ClientWindow>>>,
    quota: Quota,
    window: Duration,
    trusted_proxy_hops: usize,
}

impl RateLimiterCache {
    /// Create a new rate limiter cache.
    pub fn new(max: u32, window: Duration) -> Self {
        let max = NonZeroU32::new(max).unwrap_or(NonZeroU32::MIN);
        // Nothing replenishes inside a window; a fresh limiter starts the next one.
        let quota = Quota::with_period(window)
            .map(|q| q.allow_burst(max))
            .unwrap_or_else(|| Quota::per_second(max));
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            quota,
            window,
            trusted_proxy_hops: 1,
        }
    }

    /// Number of reverse proxies in front of the server whose
    /// `X-Forwarded-For` entries are trusted.
    pub fn with_trusted_proxy_hops(mut self, hops: usize) -> Self {
        self.trusted_proxy_hops = hops;
        self
    }

    pub fn trusted_proxy_hops(&self) -> usize {
        self.trusted_proxy_hops
    }

    /// Drop windows that have elapsed, then the oldest ones if still full.
    fn prune(&self, windows: &mut HashMap<IpAddr, ClientWindow>, now: Instant) {
        windows.retain(|_, w| now.duration_since(w.started) < self.window);

        if windows.len() >= MAX_RATE_LIMITER_ENTRIES {
            let mut entries: Vec<_> = windows.iter().map(|(ip, w)| (*ip, w.started)).collect();
            entries.sort_by_key(|(_, started)| *started);

            let to_remove = windows.len() + 1 - MAX_RATE_LIMITER_ENTRIES;
            for (ip, _) in entries.into_iter().take(to_remove) {
                windows.remove(&ip);
            }
            warn!("Rate limiter cache exceeded capacity, removed {} entries", to_remove);
        }
    }

    /// The open window for `ip`, starting a new one if the last has elapsed.
    async fn current_window(&self, ip: IpAddr, now: Instant) -> ClientWindow {
        {
            let windows = self.windows.read().await;
            if let Some(w) = windows.get(&ip) {
                if now.duration_since(w.started) < self.window {
                    return w.clone();
                }
            }
        }

        let mut windows = self.windows.write().await;
        // Double-check after acquiring write lock
        if let Some(w) = windows.get(&ip) {
            if now.duration_since(w.started) < self.window {
                return w.clone();
            }
        }

        if windows.len() >= MAX_RATE_LIMITER_ENTRIES {
            self.prune(&mut windows, now);
        }

        let window = ClientWindow {
            limiter: Arc::new(RateLimiter::direct(self.quota)),
            started: now,
        };
        windows.insert(ip, window.clone());
        window
    }

    /// Check rate limit for an IP. On rejection returns how long until the
    /// client's window ends.
    pub async fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        let now = Instant::now();
        let window = self.current_window(ip, now).await;
        window.limiter.check().map_err(|_| {
            self.window
                .saturating_sub(Instant::now().saturating_duration_since(window.started))
        })
    }
}

/// Create CORS layer.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_methods = [Method::GET, Method::POST, Method::OPTIONS];

    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_methods(allowed_methods)
            .allow_headers(Any)
            .expose_headers([header::CONTENT_DISPOSITION, header::CONTENT_LENGTH])
            .allow_origin(Any)
            .max_age(Duration::from_secs(600))
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_methods(allowed_methods)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
            .expose_headers([header::CONTENT_DISPOSITION, header::CONTENT_LENGTH])
            .allow_origin(origins)
            .max_age(Duration::from_secs(600))
    }
}

/// Security headers middleware.
pub async fn security_headers(request: Request<Body>, next: Next) -> Response<Body> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "X-Permitted-Cross-Domain-Policies",
        HeaderValue::from_static("none"),
    );

    response
}

/// Request ID middleware.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response<Body> {
    // Generate or extract request ID
    let request_id = request
        .headers()
        .get("X-Request-ID")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(request_id.clone());
    Span::current().record("request_id", request_id.as_str());

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("X-Request-ID", header_value);
    }

    response
}

/// Request logging middleware.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration = start.elapsed();

    // Skip probe logging
    if uri.path() != "/health" && uri.path() != "/ready" {
        info!(
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

/// Rate limiting middleware using the per-IP limiter.
///
/// Requests whose client cannot be identified are let through.
pub async fn rate_limit_middleware(
    State(rate_limiter): State<RateLimiterCache>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if let Some(ip) = extract_client_ip(&request, rate_limiter.trusted_proxy_hops()) {
        if let Err(wait) = rate_limiter.check(ip).await {
            warn!(ip = %ip, path = %request.uri().path(), "Rate limit exceeded");
            metrics::record_rate_limit_hit(request.uri().path());

            let retry_after = wait.as_secs().max(1).to_string();
            let mut response = ApiError::RateLimited.into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            return response;
        }
    }

    next.run(request).await
}

/// Extract the client IP behind `trusted_hops` reverse proxies.
///
/// Each trusted proxy appends the address it received the request from to
/// `X-Forwarded-For`, so the client is the entry `trusted_hops` places from
/// the right; anything further left was written by the caller. Falls back to
/// `X-Real-IP`, then the socket peer. With no trusted proxies only the socket
/// peer is used.
pub fn extract_client_ip(request: &Request<Body>, trusted_hops: usize) -> Option<IpAddr> {
    if trusted_hops > 0 {
        if let Some(ip) = forwarded_client(request, trusted_hops) {
            return Some(ip);
        }

        if let Some(real_ip) = request.headers().get("X-Real-IP") {
            if let Ok(ip_str) = real_ip.to_str() {
                if let Ok(ip) = ip_str.trim().parse() {
                    return Some(ip);
                }
            }
        }
    }

    // Requires `into_make_service_with_connect_info`
    request
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip())
}

fn forwarded_client(request: &Request<Body>, trusted_hops: usize) -> Option<IpAddr> {
    let forwarded = request.headers().get("X-Forwarded-For")?.to_str().ok()?;
    let hops: Vec<&str> = forwarded
        .split(',')
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .collect();
    // Shorter chains than expected resolve to the leftmost entry.
    let index = hops.len().checked_sub(1)?.saturating_sub(trusted_hops - 1);
    hops[index].parse().ok()
}
