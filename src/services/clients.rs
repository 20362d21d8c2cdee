//! Client Use Cases
//!
//! 생성 / 조회 / 목록 / 수정 / soft delete

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::guard;
use crate::config::Config;
use crate::db::{Address, Client, ClientFilter, ClientSortField, Gender, MaritalStatus, Store};
use crate::error::ApiError;
use crate::types::{ListQuery, SortDirection, SortKey};

// ============ Request Types ============

/// 고객 생성 요청
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub rfc: String,
    pub curp: String,
    pub gender: Option<Gender>,
    pub marital_status: Option<MaritalStatus>,
    #[serde(default)]
    pub address: Address,
    pub requested_amount: f64,
    /// 소득이 없으면 0
    pub monthly_income: f64,
    pub deleted: Option<bool>,
}

/// 고객 수정 요청 (모든 필드 옵션, `id`/`createdAt`은 무시)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub rfc: Option<String>,
    pub curp: Option<String>,
    pub gender: Option<Gender>,
    pub marital_status: Option<MaritalStatus>,
    pub address: Option<Address>,
    pub requested_amount: Option<f64>,
    pub monthly_income: Option<f64>,
    pub deleted: Option<bool>,
}

/// 고객 목록 쿼리 파라미터
///
/// `?gender=female&minMonthlyIncome=10000&sort=-requestedAmount&fields=firstName,email`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub fields: Option<String>,
    pub gender: Option<Gender>,
    pub marital_status: Option<MaritalStatus>,
    pub min_requested_amount: Option<f64>,
    pub max_requested_amount: Option<f64>,
    pub min_monthly_income: Option<f64>,
    pub max_monthly_income: Option<f64>,
}

impl ClientListQuery {
    pub fn paging(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            limit: self.limit,
            sort: self.sort.clone(),
            fields: self.fields.clone(),
        }
    }
}

impl ClientPatch {
    fn apply(self, mut client: Client) -> Client {
        if let Some(v) = self.first_name {
            client.first_name = v;
        }
        if let Some(v) = self.last_name {
            client.last_name = v;
        }
        if let Some(v) = self.email {
            client.email = v;
        }
        if let Some(v) = self.birth_date {
            client.birth_date = v;
        }
        if let Some(v) = self.rfc {
            client.rfc = v;
        }
        if let Some(v) = self.curp {
            client.curp = v;
        }
        if self.gender.is_some() {
            client.gender = self.gender;
        }
        if self.marital_status.is_some() {
            client.marital_status = self.marital_status;
        }
        if let Some(address) = self.address {
            // 하위 필드 단위 병합
            let current = &mut client.address;
            current.street = address.street.or(current.street.take());
            current.neighborhood = address.neighborhood.or(current.neighborhood.take());
            current.city = address.city.or(current.city.take());
            current.state = address.state.or(current.state.take());
            current.postal_code = address.postal_code.or(current.postal_code.take());
        }
        if let Some(v) = self.requested_amount {
            client.requested_amount = v;
        }
        if let Some(v) = self.monthly_income {
            client.monthly_income = v;
        }
        client
    }
}

// ============ Use Cases ============

pub async fn create_client(store: &dyn Store, req: CreateClientRequest) -> Result<Client, ApiError> {
    guard::forbid_deleted_field(req.deleted)?;

    let client = Client {
        id: Uuid::new_v4(),
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
        birth_date: req.birth_date,
        rfc: req.rfc,
        curp: req.curp,
        gender: req.gender,
        marital_status: req.marital_status,
        address: req.address,
        requested_amount: req.requested_amount,
        monthly_income: req.monthly_income,
        deleted: false,
        created_at: Utc::now(),
    };
    client.validate()?;

    let created = store.create_client(&client).await?;
    tracing::info!(client_id = %created.id, "client created");
    Ok(created)
}

pub async fn get_client(store: &dyn Store, client_id: Uuid) -> Result<Client, ApiError> {
    guard::live_client(store, client_id).await
}

pub async fn list_clients(
    store: &dyn Store,
    query: &ClientListQuery,
    config: &Config,
) -> Result<Vec<Client>, ApiError> {
    let paging = query.paging();
    let filter = ClientFilter {
        gender: query.gender,
        marital_status: query.marital_status,
        min_requested_amount: query.min_requested_amount,
        max_requested_amount: query.max_requested_amount,
        min_monthly_income: query.min_monthly_income,
        max_monthly_income: query.max_monthly_income,
        sort: paging.sort_keys(SortKey {
            field: ClientSortField::CreatedAt,
            direction: SortDirection::Desc,
        })?,
        page: paging.page(config.default_page_size, config.max_page_size),
    };
    store.find_clients(&filter).await
}

pub async fn update_client(
    store: &dyn Store,
    client_id: Uuid,
    patch: ClientPatch,
) -> Result<Client, ApiError> {
    guard::forbid_deleted_field(patch.deleted)?;

    let current = guard::live_client(store, client_id).await?;
    let next = patch.apply(current);
    next.validate()?;

    let updated = store.update_client(&next).await?;
    tracing::info!(%client_id, "client updated");
    Ok(updated)
}

pub async fn delete_client(store: &dyn Store, client_id: Uuid) -> Result<(), ApiError> {
    let client = guard::live_client(store, client_id).await?;
    guard::soft_delete_client(store, &client).await?;
    tracing::info!(%client_id, "client deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{fixtures, mock::MockStore};

    fn config() -> Config {
        Config::default()
    }

    fn create_request() -> CreateClientRequest {
        serde_json::from_value(serde_json::json!({
            "firstName": "Luis",
            "lastName": "Pérez Soto",
            "email": "luis@example.com",
            "birthDate": "1985-02-11",
            "rfc": "PESL850211QW3",
            "curp": "PESL850211HJCRTS04",
            "gender": "male",
            "address": { "city": "Monterrey", "postalCode": "64000" },
            "requestedAmount": 20000,
            "monthlyIncome": 0
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_client_defaults() {
        let store = MockStore::new();
        let client = create_client(&store, create_request()).await.unwrap();

        assert!(!client.deleted);
        assert_eq!(client.monthly_income, 0.0);
        assert_eq!(client.address.postal_code.as_deref(), Some("64000"));
        assert_eq!(store.client(client.id), Some(client));
    }

    #[tokio::test]
    async fn test_create_client_rejects_deleted_even_false() {
        let store = MockStore::new();
        let mut req = create_request();
        req.deleted = Some(false);

        let err = create_client(&store, req).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_create_client_validates() {
        let store = MockStore::new();
        let mut req = create_request();
        req.rfc = "bad".to_string();

        let err = create_client(&store, req).await.unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_create_client_duplicate_email() {
        let store = MockStore::new();
        create_client(&store, create_request()).await.unwrap();

        let err = create_client(&store, create_request()).await.unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_update_client_merges_fields() {
        let store = MockStore::new();
        let client = store.insert_client(fixtures::client());
        let patch: ClientPatch = serde_json::from_value(serde_json::json!({
            "monthlyIncome": 0,
            "address": { "street": "Av. Juárez 10" },
            "createdAt": "2000-01-01T00:00:00Z"
        }))
        .unwrap();

        let updated = update_client(&store, client.id, patch).await.unwrap();

        assert_eq!(updated.monthly_income, 0.0);
        assert_eq!(updated.address.street.as_deref(), Some("Av. Juárez 10"));
        assert_eq!(updated.address.city, client.address.city);
        assert_eq!(updated.created_at, client.created_at);
        assert_eq!(updated.first_name, client.first_name);
    }

    #[tokio::test]
    async fn test_update_client_rejects_deleted_before_lookup() {
        let store = MockStore::new();
        let patch = ClientPatch { deleted: Some(true), ..Default::default() };

        let err = update_client(&store, Uuid::new_v4(), patch).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_deleted_client_is_not_found_everywhere() {
        let store = MockStore::new();
        let client = store.insert_client(fixtures::client());
        delete_client(&store, client.id).await.unwrap();

        assert!(matches!(get_client(&store, client.id).await, Err(ApiError::NotFound(_))));
        assert!(matches!(
            update_client(&store, client.id, ClientPatch::default()).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(delete_client(&store, client.id).await, Err(ApiError::NotFound(_))));
        assert!(list_clients(&store, &ClientListQuery::default(), &config())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_list_clients_sorted_and_paged() {
        let store = MockStore::new();
        for (i, name) in ["Carla", "Beto", "Ana"].into_iter().enumerate() {
            let mut client = fixtures::client();
            client.first_name = name.to_string();
            client.requested_amount = (i as f64 + 1.0) * 1000.0;
            store.insert_client(client);
        }

        let query = ClientListQuery {
            sort: Some("firstName".into()),
            limit: Some(2),
            page: Some(1),
            ..Default::default()
        };
        let first_page = list_clients(&store, &query, &config()).await.unwrap();
        let names: Vec<_> = first_page.iter().map(|c| c.first_name.as_str()).collect();
        assert_eq!(names, ["Ana", "Beto"]);

        let query = ClientListQuery {
            sort: Some("-requestedAmount".into()),
            limit: Some(2),
            page: Some(2),
            ..Default::default()
        };
        let second_page = list_clients(&store, &query, &config()).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].first_name, "Carla");
    }

    #[tokio::test]
    async fn test_list_clients_filters() {
        let store = MockStore::new();
        let profiles = [
            (Gender::Female, MaritalStatus::Single, 5_000.0, 0.0),
            (Gender::Female, MaritalStatus::Married, 20_000.0, 18_000.0),
            (Gender::Male, MaritalStatus::Married, 50_000.0, 40_000.0),
        ];
        for (gender, marital_status, requested, income) in profiles {
            let mut client = fixtures::client();
            client.gender = Some(gender);
            client.marital_status = Some(marital_status);
            client.requested_amount = requested;
            client.monthly_income = income;
            store.insert_client(client);
        }

        let by_gender = ClientListQuery { gender: Some(Gender::Female), ..Default::default() };
        assert_eq!(list_clients(&store, &by_gender, &config()).await.unwrap().len(), 2);

        let by_income = ClientListQuery {
            marital_status: Some(MaritalStatus::Married),
            min_monthly_income: Some(20_000.0),
            ..Default::default()
        };
        let married_high_income = list_clients(&store, &by_income, &config()).await.unwrap();
        assert_eq!(married_high_income.len(), 1);
        assert_eq!(married_high_income[0].gender, Some(Gender::Male));

        let by_amount = ClientListQuery {
            min_requested_amount: Some(5_000.0),
            max_requested_amount: Some(20_000.0),
            sort: Some("requestedAmount".into()),
            ..Default::default()
        };
        let amounts: Vec<f64> = list_clients(&store, &by_amount, &config())
            .await
            .unwrap()
            .iter()
            .map(|c| c.requested_amount)
            .collect();
        assert_eq!(amounts, [5_000.0, 20_000.0]);
    }
}
