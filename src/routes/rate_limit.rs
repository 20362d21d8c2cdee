//! Request Rate Limiting
//!
//! IP별 고정 윈도우 카운터. 윈도우 안에서 한도를 넘긴 요청은 429.
//! 연결 정보가 없는 요청(테스트 등)은 하나의 키로 묶어서 집계

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

use crate::{error::ApiError, AppState};

/// 추적 중인 키가 이보다 많아지면 만료된 윈도우 정리
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

/// IP별 요청 카운터
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: DashMap<Option<IpAddr>, Window>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: DashMap::new(),
        }
    }

    /// 한도가 0이면 제한 없음
    pub fn is_enabled(&self) -> bool {
        self.max_requests > 0
    }

    /// 요청 하나를 기록. 한도 안이면 true
    pub fn check(&self, ip: Option<IpAddr>) -> bool {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: Option<IpAddr>, now: Instant) -> bool {
        if self.clients.len() > PRUNE_THRESHOLD {
            self.prune(now);
        }

        let mut window = self.clients.entry(ip).or_insert(Window { started: now, hits: 0 });
        if now.duration_since(window.started) >= self.window {
            *window = Window { started: now, hits: 0 };
        }
        if window.hits >= self.max_requests {
            return false;
        }
        window.hits += 1;
        true
    }

    fn prune(&self, now: Instant) {
        let window = self.window;
        self.clients
            .retain(|_, entry| now.duration_since(entry.started) < window);
    }
}

/// 전역 rate limit 미들웨어
pub async fn limit_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let limiter = &state.rate_limiter;
    if limiter.is_enabled() {
        let ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        if !limiter.check(ip) {
            tracing::warn!(?ip, path = %request.uri().path(), "rate limit exceeded");
            return Err(ApiError::TooManyRequests);
        }
    }

    Ok(next.run(request).await)
}
