//! Error Handling Module
//!
//! Provides type-safe error handling with proper HTTP status code mapping.
//! Uses thiserror for domain errors and integrates with tracing for structured logging.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::db::CreditStatus;

/// API 에러 타입
///
/// # Design Decision
///
/// 각 에러 variant는 적절한 HTTP 상태 코드에 매핑됨
/// - 잘못된 요청 / 허용되지 않는 상태 전이 / 필드 검증 실패: 400
/// - 없는 리소스 (soft delete 포함): 404
/// - 엔티티 간 제약 위반: 409
/// - 요청 한도 초과: 429
/// - 서버 에러: 500
///
/// 민감한 내부 정보는 클라이언트에 노출하지 않음
#[derive(Debug, Error)]
pub enum ApiError {
    // ============ 400 Bad Request ============
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Cannot change the status of a credit that is '{from}'")]
    InvalidTransition { from: CreditStatus },

    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ============ 404 Not Found ============
    #[error("Resource not found: {0}")]
    NotFound(String),

    // ============ 409 Conflict ============
    #[error("Conflict: {0}")]
    Conflict(String),

    // ============ 429 Too Many Requests ============
    #[error("Too many requests")]
    TooManyRequests,

    // ============ 500 Internal Server Error ============
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    InternalError,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_)
            | ApiError::InvalidTransition { .. }
            | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::DatabaseError(_) | ApiError::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "INVALID_REQUEST",
            ApiError::InvalidTransition { .. } => "INVALID_TRANSITION",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::TooManyRequests => "RATE_LIMITED",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// API 에러 응답 구조
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (message, details) = match &self {
            ApiError::InvalidRequest(msg) | ApiError::Conflict(msg) => (msg.clone(), None),
            ApiError::InvalidTransition { .. } => (self.to_string(), None),
            ApiError::ValidationError(msg) => {
                ("Validation failed".to_string(), Some(msg.clone()))
            }
            ApiError::NotFound(resource) => (format!("{} not found", resource), None),
            ApiError::TooManyRequests => (
                "Too many requests from this IP, please try again later".to_string(),
                None,
            ),

            // 5xx: 내부 에러는 클라이언트에 상세 정보 노출 안 함
            ApiError::DatabaseError(_) => {
                tracing::error!("Database error: {:?}", self);
                ("Database error occurred".to_string(), None)
            }
            ApiError::InternalError => {
                tracing::error!("Internal error: {:?}", self);
                ("An internal error occurred".to_string(), None)
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code().to_string(),
            details,
        };

        (self.status_code(), Json(body)).into_response()
    }
}

/// PostgreSQL 제약 위반 코드
const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_CHECK_VIOLATION: &str = "23514";

/// SQLx 에러를 ApiError로 변환
///
/// unique / check 제약 위반은 필드 검증 실패로 취급
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(PG_UNIQUE_VIOLATION) => {
                    let constraint = db_err.constraint().unwrap_or("unique field");
                    return ApiError::ValidationError(format!(
                        "duplicate value violates {}",
                        constraint
                    ));
                }
                Some(PG_CHECK_VIOLATION) => {
                    let constraint = db_err.constraint().unwrap_or("check constraint");
                    return ApiError::ValidationError(format!("value violates {}", constraint));
                }
                _ => {}
            }
        }
        tracing::error!("SQLx error: {:?}", err);
        ApiError::DatabaseError(err.to_string())
    }
}

/// 잘못된 JSON 본문
///
/// - 필수 필드 누락 / 타입 불일치 / 알 수 없는 enum 값: 필드 검증 실패
/// - 문법 오류, Content-Type 누락: 잘못된 요청
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ApiError::ValidationError(err.body_text()),
            other => ApiError::InvalidRequest(other.body_text()),
        }
    }
}

/// 잘못된 경로 파라미터 (UUID 형식 오류)
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

/// anyhow 에러를 ApiError로 변환
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Anyhow error: {:?}", err);
        ApiError::InternalError
    }
}
