//! Repository Pattern Implementation
//!
//! # Interview Q&A
//!
//! Q: Repository 패턴이란?
//! A: 데이터 접근 로직을 추상화하는 패턴
//!
//!    장점:
//!    - 비즈니스 로직(대출 상태 전이, 삭제 가드)과 데이터 접근 분리
//!    - 테스트 시 Mock 구현 쉬움 (아래 `mock` 모듈)
//!    - DB 교체 시 영향 최소화
//!
//! Q: 동시에 두 요청이 같은 대출의 상태를 바꾸면?
//! A: `update_credit`은 직전에 읽은 상태를 조건으로 거는 조건부 업데이트
//!
//!    ```sql
//!    UPDATE credits SET ... WHERE id = $1 AND status = $expected AND deleted = FALSE
//!    ```
//!
//!    - 영향받은 row가 없으면 `None` → 서비스에서 409 Conflict
//!    - last-write-wins 대신 나중 요청이 실패

use async_trait::async_trait;
use uuid::Uuid;

use super::models::{Client, Credit, CreditStatus, Gender, MaritalStatus};
use crate::error::ApiError;
use crate::types::{Page, SortKey, SortField};

// ============ Query Shapes ============

/// 고객 목록 정렬 필드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientSortField {
    CreatedAt,
    FirstName,
    LastName,
    Email,
    RequestedAmount,
    MonthlyIncome,
}

impl SortField for ClientSortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "createdAt" => Some(Self::CreatedAt),
            "firstName" => Some(Self::FirstName),
            "lastName" => Some(Self::LastName),
            "email" => Some(Self::Email),
            "requestedAmount" => Some(Self::RequestedAmount),
            "monthlyIncome" => Some(Self::MonthlyIncome),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Email => "email",
            Self::RequestedAmount => "requested_amount",
            Self::MonthlyIncome => "monthly_income",
        }
    }
}

/// 대출 목록 정렬 필드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditSortField {
    CreatedAt,
    Amount,
    AnnualInterestRate,
    TermMonths,
    Status,
    ApprovalDate,
}

impl SortField for CreditSortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "createdAt" => Some(Self::CreatedAt),
            "amount" => Some(Self::Amount),
            "annualInterestRate" => Some(Self::AnnualInterestRate),
            "termMonths" => Some(Self::TermMonths),
            "status" => Some(Self::Status),
            "approvalDate" => Some(Self::ApprovalDate),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Amount => "amount",
            Self::AnnualInterestRate => "annual_interest_rate",
            Self::TermMonths => "term_months",
            Self::Status => "status",
            Self::ApprovalDate => "approval_date",
        }
    }
}

/// 고객 목록 조회 조건 (삭제된 고객은 항상 제외)
#[derive(Debug, Clone)]
pub struct ClientFilter {
    pub gender: Option<Gender>,
    pub marital_status: Option<MaritalStatus>,
    pub min_requested_amount: Option<f64>,
    pub max_requested_amount: Option<f64>,
    pub min_monthly_income: Option<f64>,
    pub max_monthly_income: Option<f64>,
    pub sort: Vec<SortKey<ClientSortField>>,
    pub page: Page,
}

/// 대출 목록 조회 조건 (삭제된 대출은 항상 제외)
#[derive(Debug, Clone)]
pub struct CreditFilter {
    pub status: Option<CreditStatus>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub sort: Vec<SortKey<CreditSortField>>,
    pub page: Page,
}

// ============ Store ============

/// Client / Credit 저장소 인터페이스
///
/// PostgreSQL 구현은 db/mod.rs의 `Database`
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), ApiError>;

    async fn create_client(&self, client: &Client) -> Result<Client, ApiError>;
    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, ApiError>;
    async fn find_clients(&self, filter: &ClientFilter) -> Result<Vec<Client>, ApiError>;
    async fn update_client(&self, client: &Client) -> Result<Client, ApiError>;
    async fn mark_client_deleted(&self, id: Uuid) -> Result<(), ApiError>;

    async fn create_credit(&self, credit: &Credit) -> Result<Credit, ApiError>;
    /// 고객 소유 대출만 조회 (삭제 여부와 무관)
    async fn find_credit(&self, client_id: Uuid, credit_id: Uuid) -> Result<Option<Credit>, ApiError>;
    /// 주어진 상태의 대출 하나 (삭제 여부와 무관)
    async fn find_credit_by_status(
        &self,
        client_id: Uuid,
        status: CreditStatus,
    ) -> Result<Option<Credit>, ApiError>;
    async fn find_credits(&self, client_id: Uuid, filter: &CreditFilter) -> Result<Vec<Credit>, ApiError>;
    /// 삭제되지 않았고 저장된 상태가 `expected_status`일 때만 반영. 아니면 `None`
    async fn update_credit(
        &self,
        credit: &Credit,
        expected_status: CreditStatus,
    ) -> Result<Option<Credit>, ApiError>;
    /// `in_process`이고 삭제되지 않은 대출만 삭제 처리. 반영 여부 반환
    async fn mark_credit_deleted(&self, client_id: Uuid, credit_id: Uuid) -> Result<bool, ApiError>;
}

// 테스트용 Mock 구현:
