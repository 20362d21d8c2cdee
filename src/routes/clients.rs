//! Client Endpoints
//!
//! 고객 CRUD. soft delete된 고객은 모든 경로에서 404

use axum::{extract::State, Json};
use serde_json::Value;
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{
    db::Client,
    error::ApiError,
    services::{clients, ClientListQuery, ClientPatch, CreateClientRequest},
    types::{project, ApiResponse},
    AppState,
};

/// POST /api/v1/client
pub async fn create_client(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateClientRequest>,
) -> Result<Json<ApiResponse<Client>>, ApiError> {
    let client = clients::create_client(state.store.as_ref(), req).await?;
    Ok(Json(ApiResponse::with_message("Client created successfully.", client)))
}

/// GET /api/v1/client
///
/// `?gender=female&minMonthlyIncome=10000&sort=-createdAt&fields=firstName,email&page=1&limit=10`
pub async fn list_clients(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ClientListQuery>,
) -> Result<Json<ApiResponse<Vec<Value>>>, ApiError> {
    let fields = query.paging().selected_fields::<Client>()?;
    let clients = clients::list_clients(state.store.as_ref(), &query, &state.config).await?;
    Ok(Json(ApiResponse::list(project(clients, fields.as_deref())?)))
}

/// GET /api/v1/client/:client_id
pub async fn get_client(
    State(state): State<AppState>,
    ApiPath(client_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Client>>, ApiError> {
    let client = clients::get_client(state.store.as_ref(), client_id).await?;
    Ok(Json(ApiResponse::success(client)))
}

/// PUT /api/v1/client/:client_id
pub async fn update_client(
    State(state): State<AppState>,
    ApiPath(client_id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<ClientPatch>,
) -> Result<Json<ApiResponse<Client>>, ApiError> {
    let client = clients::update_client(state.store.as_ref(), client_id, patch).await?;
    Ok(Json(ApiResponse::with_message("Client updated successfully.", client)))
}

/// DELETE /api/v1/client/:client_id
///
/// 활성 대출이 있으면 409
pub async fn delete_client(
    State(state): State<AppState>,
    ApiPath(client_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    clients::delete_client(state.store.as_ref(), client_id).await?;
    Ok(Json(ApiResponse::message("Client deleted successfully.")))
}
