//! Credit Use Cases
//!
//! 모든 연산은 고객 lookup guard → 대출 lookup guard → 엔진/가드 → 쓰기 순서.
//! 거부되면 쓰기는 일어나지 않음

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::guard;
use super::lifecycle::{self, CreditPatch};
use crate::config::Config;
use crate::db::{Credit, CreditFilter, CreditSortField, CreditStatus, Store};
use crate::error::ApiError;
use crate::types::{ListQuery, SortDirection, SortKey};

// ============ Request Types ============

/// 대출 생성 요청
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCreditRequest {
    pub amount: f64,
    #[serde(alias = "interestRate")]
    pub annual_interest_rate: f64,
    pub term_months: i32,
    /// 생성 시 상태 지정 불가 (항상 `in_process`)
    pub status: Option<serde_json::Value>,
    pub deleted: Option<bool>,
}

/// 대출 목록 쿼리 파라미터
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub fields: Option<String>,
    pub status: Option<CreditStatus>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

impl CreditListQuery {
    pub fn paging(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            limit: self.limit,
            sort: self.sort.clone(),
            fields: self.fields.clone(),
        }
    }
}

// ============ Use Cases ============

pub async fn create_credit(
    store: &dyn Store,
    client_id: Uuid,
    req: CreateCreditRequest,
) -> Result<Credit, ApiError> {
    let client = guard::live_client(store, client_id).await?;

    guard::forbid_deleted_field(req.deleted)?;
    if req.status.is_some() {
        return Err(ApiError::InvalidRequest(
            "The credit status cannot be set when creating a credit".to_string(),
        ));
    }

    let credit = Credit {
        id: Uuid::new_v4(),
        client_id: client.id,
        amount: req.amount,
        annual_interest_rate: req.annual_interest_rate,
        term_months: req.term_months,
        status: CreditStatus::InProcess,
        created_at: Utc::now(),
        approval_date: None,
        rejection_reason: None,
        deleted: false,
    };
    credit.validate()?;

    let created = store.create_credit(&credit).await?;
    tracing::info!(%client_id, credit_id = %created.id, amount = created.amount, "credit created");
    Ok(created)
}

pub async fn get_credit(
    store: &dyn Store,
    client_id: Uuid,
    credit_id: Uuid,
) -> Result<Credit, ApiError> {
    guard::live_client(store, client_id).await?;
    guard::live_credit(store, client_id, credit_id).await
}

pub async fn list_credits(
    store: &dyn Store,
    client_id: Uuid,
    query: &CreditListQuery,
    config: &Config,
) -> Result<Vec<Credit>, ApiError> {
    guard::live_client(store, client_id).await?;

    let paging = query.paging();
    let filter = CreditFilter {
        status: query.status,
        min_amount: query.min_amount,
        max_amount: query.max_amount,
        sort: paging.sort_keys(SortKey {
            field: CreditSortField::CreatedAt,
            direction: SortDirection::Desc,
        })?,
        page: paging.page(config.default_page_size, config.max_page_size),
    };
    store.find_credits(client_id, &filter).await
}

/// 대출 수정 (상태 전이 포함)
///
/// 저장은 직전에 읽은 상태를 조건으로 함. 그 사이 상태가 바뀌었으면 409
pub async fn update_credit(
    store: &dyn Store,
    client_id: Uuid,
    credit_id: Uuid,
    patch: CreditPatch,
) -> Result<Credit, ApiError> {
    guard::forbid_deleted_field(patch.deleted)?;

    guard::live_client(store, client_id).await?;
    let current = guard::live_credit(store, client_id, credit_id).await?;

    let next = lifecycle::apply_update(&current, &patch, Utc::now()).map_err(|err| {
        tracing::warn!(%credit_id, status = %current.status, error = %err, "credit update rejected");
        err
    })?;
    next.validate()?;

    let updated = store
        .update_credit(&next, current.status)
        .await?
        .ok_or_else(guard::concurrent_modification)?;

    if updated.status != current.status {
        tracing::info!(%credit_id, from = %current.status, to = %updated.status, "credit status changed");
    } else {
        tracing::info!(%credit_id, "credit updated");
    }
    Ok(updated)
}

pub async fn delete_credit(
    store: &dyn Store,
    client_id: Uuid,
    credit_id: Uuid,
) -> Result<(), ApiError> {
    guard::live_client(store, client_id).await?;
    let credit = guard::live_credit(store, client_id, credit_id).await?;
    guard::soft_delete_credit(store, &credit).await?;
    tracing::info!(%client_id, %credit_id, "credit deleted");
    Ok(())
}
