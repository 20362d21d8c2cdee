//! Entity Lookup Guard + Cross-Entity Guard
//!
//! - lookup guard: 없거나 soft delete된 엔티티 → 404 (404의 유일한 출처)
//! - 삭제 가드: 활성 대출이 있는 고객 / `in_process`가 아닌 대출은 삭제 불가

use uuid::Uuid;

use crate::db::{Client, Credit, CreditStatus, Store};
use crate::error::ApiError;

/// 요청 본문에 `deleted`가 있으면 값과 상관없이 거부
pub fn forbid_deleted_field(deleted: Option<bool>) -> Result<(), ApiError> {
    match deleted {
        Some(_) => Err(ApiError::InvalidRequest(
            "'deleted' cannot be set in the request".to_string(),
        )),
        None => Ok(()),
    }
}

/// 살아있는 고객 조회
pub async fn live_client(store: &dyn Store, client_id: Uuid) -> Result<Client, ApiError> {
    match store.find_client(client_id).await? {
        Some(client) if !client.deleted => Ok(client),
        _ => {
            tracing::debug!(%client_id, "client missing or deleted");
            Err(ApiError::NotFound("Client".to_string()))
        }
    }
}

/// 살아있는 대출 조회 (해당 고객 소유만)
pub async fn live_credit(
    store: &dyn Store,
    client_id: Uuid,
    credit_id: Uuid,
) -> Result<Credit, ApiError> {
    match store.find_credit(client_id, credit_id).await? {
        Some(credit) if !credit.deleted => Ok(credit),
        _ => {
            tracing::debug!(%client_id, %credit_id, "credit missing or deleted");
            Err(ApiError::NotFound("Credit".to_string()))
        }
    }
}

/// 고객 soft delete
///
/// 활성 대출이 하나라도 있으면 거부. 활성 대출은 그 자체의 삭제 플래그와 무관하게 막음
pub async fn soft_delete_client(store: &dyn Store, client: &Client) -> Result<(), ApiError> {
    if let Some(active) = store
        .find_credit_by_status(client.id, CreditStatus::Active)
        .await?
    {
        tracing::warn!(client_id = %client.id, credit_id = %active.id, "client has an active credit");
        return Err(ApiError::Conflict(
            "Clients with active credits cannot be deleted; active credits must be resolved first"
                .to_string(),
        ));
    }

    store.mark_client_deleted(client.id).await
}

/// 대출 soft delete (`in_process`만 가능)
pub async fn soft_delete_credit(store: &dyn Store, credit: &Credit) -> Result<(), ApiError> {
    if credit.status != CreditStatus::InProcess {
        tracing::warn!(credit_id = %credit.id, status = %credit.status, "credit is not in process");
        return Err(ApiError::Conflict(
            "Only in-process credits may be deleted".to_string(),
        ));
    }

    if !store.mark_credit_deleted(credit.client_id, credit.id).await? {
        return Err(concurrent_modification());
    }
    Ok(())
}

pub(crate) fn concurrent_modification() -> ApiError {
    ApiError::Conflict("Credit was modified concurrently; retry the request".to_string())
}
