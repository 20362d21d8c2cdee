//! Credit Registry API Library
//!
//! # Overview
//!
//! 고객(Client)과 대출(Credit)을 관리하는 REST 백엔드.
//! 핵심은 대출 상태 전이와 필드 수정 규칙, 그리고 엔티티 간 삭제 제약.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                         API                              │
//! │                                                          │
//! │  ┌─────────┐  ┌──────────────────────┐  ┌─────────┐     │
//! │  │ Routes  │─▶│       Services       │─▶│   DB    │     │
//! │  └─────────┘  │ lifecycle │ guard    │  │ (Store) │     │
//! │               │ clients   │ credits  │  └────┬────┘     │
//! │               └──────────────────────┘       │          │
//! └──────────────────────────────────────────────┼──────────┘
//!                                                ▼
//!                                       ┌────────────────┐
//!                                       │   PostgreSQL   │
//!                                       └────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: 환경 설정 관리
//! - `error`: 에러 타입 및 HTTP 매핑
//! - `routes`: HTTP 엔드포인트 핸들러 + 라우터
//! - `services`: 비즈니스 로직 (상태 전이 엔진, 삭제 가드)
//! - `db`: 데이터베이스 연동 (`Store` trait, PostgreSQL 구현)
//! - `types`: 공통 타입 정의 (응답 래퍼, 페이지네이션)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use credit_registry_api::{config::Config, db::Database, routes, AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let db = Database::connect(&config.database_url).await?;
//!     let app = routes::router(AppState::new(db, config));
//!
//!     // ... 서버 시작
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod db;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::ApiError;
pub use db::{Database, Store};

use routes::rate_limit::RateLimiter;

/// 애플리케이션 전역 상태
///
/// 저장소 핸들, 설정, IP별 요청 카운터
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(store: impl Store + 'static, config: Config) -> Self {
        Self::with_store(Arc::new(store), config)
    }

    /// 이미 공유 중인 저장소 핸들로 상태 구성
    pub fn with_store(store: Arc<dyn Store>, config: Config) -> Self {
        let rate_limiter = RateLimiter::new(
            config.rate_limit_max,
            Duration::from_secs(config.rate_limit_window_secs),
        );
        Self {
            store,
            config: Arc::new(config),
            rate_limiter: Arc::new(rate_limiter),
        }
    }
}
