use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{cache::RateLimitStore, config::Config, error::AppError};

/// 固定窗口的按 IP 限流器
#[derive(Clone)]
pub struct RateLimiter {
    counter: Arc<dyn RateLimitStore>,
    config: Arc<Config>,
}

impl RateLimiter {
    pub fn new(counter: Arc<dyn RateLimitStore>, config: Config) -> Self {
        Self {
            counter,
            config: Arc::new(config),
        }
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        // 从连接信息获取原始IP
        let remote_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string());
        let ip = client_ip(req.headers(), remote_ip.as_deref());

        let window_secs = self.config.rate_limit_window_secs;
        let count = match self.counter.increment(&ip, window_secs).await {
            Ok(count) => count,
            Err(e) => {
                // 计数不可用时放行
                tracing::warn!("Rate limit check skipped for {}: {}", ip, e);
                return next.run(req).await;
            }
        };

        let limit = self.config.rate_limit_requests;
        let mut response = if count > limit {
            tracing::warn!("Rate limit exceeded for {} ({} requests)", ip, count);
            AppError::TooManyRequests(
                "Too many requests from this IP, please try again later.".to_string(),
            )
            .into_response()
        } else {
            next.run(req).await
        };

        let headers = response.headers_mut();
        headers.insert("ratelimit-limit", HeaderValue::from(limit));
        headers.insert(
            "ratelimit-remaining",
            HeaderValue::from(limit.saturating_sub(count)),
        );

        response
    }
}

/// 依次从 `x-real-ip`、`x-forwarded-for` 和连接地址中取客户端IP
fn client_ip(headers: &HeaderMap, remote_ip: Option<&str>) -> String {
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip)
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}
