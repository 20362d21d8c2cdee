//! Credit Endpoints
//!
//! 대출은 항상 소유 고객 경로 아래에서만 접근

use axum::{extract::State, Json};
use serde_json::Value;
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{
    db::Credit,
    error::ApiError,
    services::{credits, CreateCreditRequest, CreditListQuery, CreditPatch},
    types::{project, ApiResponse},
    AppState,
};

/// POST /api/v1/client/:client_id/credit
pub async fn create_credit(
    State(state): State<AppState>,
    ApiPath(client_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreateCreditRequest>,
) -> Result<Json<ApiResponse<Credit>>, ApiError> {
    let credit = credits::create_credit(state.store.as_ref(), client_id, req).await?;
    Ok(Json(ApiResponse::with_message("Credit created successfully.", credit)))
}

/// GET /api/v1/client/:client_id/credit
///
/// `?status=active&minAmount=1000&sort=-amount&fields=amount,status&page=1&limit=10`
pub async fn list_credits(
    State(state): State<AppState>,
    ApiPath(client_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<CreditListQuery>,
) -> Result<Json<ApiResponse<Vec<Value>>>, ApiError> {
    let fields = query.paging().selected_fields::<Credit>()?;
    let credits =
        credits::list_credits(state.store.as_ref(), client_id, &query, &state.config).await?;
    Ok(Json(ApiResponse::list(project(credits, fields.as_deref())?)))
}

/// GET /api/v1/client/:client_id/credit/:credit_id
pub async fn get_credit(
    State(state): State<AppState>,
    ApiPath((client_id, credit_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Credit>>, ApiError> {
    let credit = credits::get_credit(state.store.as_ref(), client_id, credit_id).await?;
    Ok(Json(ApiResponse::success(credit)))
}

/// PUT /api/v1/client/:client_id/credit/:credit_id
///
/// # Request
///
/// ```json
/// { "amount": 500, "status": "active" }
/// ```
///
/// 금액/이자율/기간은 `in_process`일 때만 반영. 상태는 전이 테이블을 따름
pub async fn update_credit(
    State(state): State<AppState>,
    ApiPath((client_id, credit_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(patch): ApiJson<CreditPatch>,
) -> Result<Json<ApiResponse<Credit>>, ApiError> {
    let credit = credits::update_credit(state.store.as_ref(), client_id, credit_id, patch).await?;
    Ok(Json(ApiResponse::with_message("Credit updated successfully.", credit)))
}

/// DELETE /api/v1/client/:client_id/credit/:credit_id
///
/// `in_process`가 아니면 409
pub async fn delete_credit(
    State(state): State<AppState>,
    ApiPath((client_id, credit_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    credits::delete_credit(state.store.as_ref(), client_id, credit_id).await?;
    Ok(Json(ApiResponse::message("Credit deleted successfully.")))
}
