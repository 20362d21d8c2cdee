//! Services Module
//!
//! 비즈니스 로직을 담당하는 서비스 레이어
//!
//! # Services
//! - `lifecycle`: 대출 상태 전이 + 필드 수정 규칙 (순수 함수)
//! - `guard`: lookup guard (404) + 삭제 가드 (409)
//! - `clients`: 고객 유스케이스
//! - `credits`: 대출 유스케이스

pub mod clients;
pub mod credits;
pub mod guard;
pub mod lifecycle;

pub use clients::{ClientListQuery, ClientPatch, CreateClientRequest};
pub use credits::{CreateCreditRequest, CreditListQuery};
pub use lifecycle::{apply_update, can_transition, CreditPatch, TRANSITIONS};
