//! Database Module
//!
//! # Interview Q&A
//!
//! Q: 왜 PostgreSQL을 선택했는가?
//! A: 대출 데이터에 적합한 이유
//!
//!    1. ACID 트랜잭션: 금융 데이터 무결성 보장
//!    2. ENUM 타입: 대출 상태를 DB 레벨에서 제한
//!    3. CHECK / UNIQUE 제약: 금액 범위, email/RFC/CURP 중복 방지
//!    4. 인덱싱: 고객별, 상태별 조회 최적화
//!
//! Q: soft delete 필터는 어디서 처리하는가?
//! A: 단건 조회는 삭제된 레코드도 그대로 반환하고
//!    서비스 레이어의 lookup guard가 일괄적으로 404 처리
//!    목록 조회는 쿼리에서 `deleted = FALSE`로 제외
//!
//! Q: 커넥션 풀은 어떻게 관리하는가?
//! A: SQLx의 PgPool 사용
//!    - 최소/최대 커넥션 수 설정
//!    - 커넥션 재사용 (오버헤드 감소)
//!    - 타임아웃 처리

mod models;
mod repository;

pub use models::*;
pub use repository::{ClientFilter, ClientSortField, CreditFilter, CreditSortField, Store};

#[cfg(test)]
pub use repository::mock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::ApiError;
use crate::types::{Page, SortDirection, SortField, SortKey};

const CLIENT_COLUMNS: &str = r#"
    id, first_name, last_name, email, birth_date, rfc, curp, gender, marital_status,
    address_street, address_neighborhood, address_city, address_state, address_postal_code,
    requested_amount, monthly_income, deleted, created_at
"#;

const CREDIT_COLUMNS: &str = r#"
    id, client_id, amount, annual_interest_rate, term_months, status,
    created_at, approval_date, rejection_reason, deleted
"#;

/// 데이터베이스 연결 및 쿼리 담당
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 데이터베이스 연결
    ///
    /// # Connection Pool Settings
    ///
    /// - max_connections: 10 (트래픽에 따라 조정)
    /// - min_connections: 1 (idle 시 최소 유지)
    /// - acquire_timeout: 3초 (커넥션 획득 대기)
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(database_url)
            .await
            .context("failed to connect to PostgreSQL")?;

        Ok(Self { pool })
    }

    /// 마이그레이션 실행
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run migrations")?;
        Ok(())
    }
}

/// `AND column >= min AND column <= max` (값이 있는 쪽만)
///
/// 컬럼 이름은 호출부의 상수 문자열
fn push_range(
    builder: &mut QueryBuilder<'_, Postgres>,
    column: &'static str,
    min: Option<f64>,
    max: Option<f64>,
) {
    if let Some(min) = min {
        builder.push(format!(" AND {column} >= ")).push_bind(min);
    }
    if let Some(max) = max {
        builder.push(format!(" AND {column} <= ")).push_bind(max);
    }
}

/// `ORDER BY a DESC, b ASC` + `LIMIT/OFFSET`
///
/// 컬럼 이름은 `SortField` 화이트리스트에서만 옴
fn push_order_and_page<F: SortField>(
    builder: &mut QueryBuilder<'_, Postgres>,
    sort: &[SortKey<F>],
    page: Page,
) {
    builder.push(" ORDER BY ");
    for (i, key) in sort.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(key.field.column());
        builder.push(match key.direction {
            SortDirection::Asc => " ASC",
            SortDirection::Desc => " DESC",
        });
    }
    // 동일 값 정렬 안정화
    builder.push(if sort.is_empty() { "id" } else { ", id" });

    builder.push(" LIMIT ");
    builder.push_bind(i64::from(page.limit));
    builder.push(" OFFSET ");
    builder.push_bind(page.offset() as i64);
}

#[async_trait]
impl Store for Database {
    async fn health_check(&self) -> Result<(), ApiError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_client(&self, client: &Client) -> Result<Client, ApiError> {
        let created = sqlx::query_as::<_, Client>(&format!(
            r#"
            INSERT INTO clients (
                id, first_name, last_name, email, birth_date, rfc, curp, gender, marital_status,
                address_street, address_neighborhood, address_city, address_state, address_postal_code,
                requested_amount, monthly_income, deleted, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, FALSE, $17)
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(client.id)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.email)
        .bind(client.birth_date)
        .bind(&client.rfc)
        .bind(&client.curp)
        .bind(client.gender)
        .bind(client.marital_status)
        .bind(&client.address.street)
        .bind(&client.address.neighborhood)
        .bind(&client.address.city)
        .bind(&client.address.state)
        .bind(&client.address.postal_code)
        .bind(client.requested_amount)
        .bind(client.monthly_income)
        .bind(client.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, ApiError> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    async fn find_clients(&self, filter: &ClientFilter) -> Result<Vec<Client>, ApiError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE deleted = FALSE"
        ));

        if let Some(gender) = filter.gender {
            builder.push(" AND gender = ").push_bind(gender);
        }
        if let Some(marital_status) = filter.marital_status {
            builder.push(" AND marital_status = ").push_bind(marital_status);
        }
        push_range(&mut builder, "requested_amount", filter.min_requested_amount, filter.max_requested_amount);
        push_range(&mut builder, "monthly_income", filter.min_monthly_income, filter.max_monthly_income);
        push_order_and_page(&mut builder, &filter.sort, filter.page);

        let clients = builder
            .build_query_as::<Client>()
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }

    /// created_at / deleted 는 갱신 대상 아님
    async fn update_client(&self, client: &Client) -> Result<Client, ApiError> {
        let updated = sqlx::query_as::<_, Client>(&format!(
            r#"
            UPDATE clients SET
                first_name = $2, last_name = $3, email = $4, birth_date = $5, rfc = $6, curp = $7,
                gender = $8, marital_status = $9,
                address_street = $10, address_neighborhood = $11, address_city = $12,
                address_state = $13, address_postal_code = $14,
                requested_amount = $15, monthly_income = $16
            WHERE id = $1
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(client.id)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.email)
        .bind(client.birth_date)
        .bind(&client.rfc)
        .bind(&client.curp)
        .bind(client.gender)
        .bind(client.marital_status)
        .bind(&client.address.street)
        .bind(&client.address.neighborhood)
        .bind(&client.address.city)
        .bind(&client.address.state)
        .bind(&client.address.postal_code)
        .bind(client.requested_amount)
        .bind(client.monthly_income)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| ApiError::NotFound("Client".to_string()))
    }

    async fn mark_client_deleted(&self, id: Uuid) -> Result<(), ApiError> {
        sqlx::query("UPDATE clients SET deleted = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_credit(&self, credit: &Credit) -> Result<Credit, ApiError> {
        let created = sqlx::query_as::<_, Credit>(&format!(
            r#"
            INSERT INTO credits (
                id, client_id, amount, annual_interest_rate, term_months, status,
                created_at, approval_date, rejection_reason, deleted
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE)
            RETURNING {CREDIT_COLUMNS}
            "#
        ))
        .bind(credit.id)
        .bind(credit.client_id)
        .bind(credit.amount)
        .bind(credit.annual_interest_rate)
        .bind(credit.term_months)
        .bind(credit.status)
        .bind(credit.created_at)
        .bind(credit.approval_date)
        .bind(&credit.rejection_reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_credit(&self, client_id: Uuid, credit_id: Uuid) -> Result<Option<Credit>, ApiError> {
        let credit = sqlx::query_as::<_, Credit>(&format!(
            "SELECT {CREDIT_COLUMNS} FROM credits WHERE id = $1 AND client_id = $2"
        ))
        .bind(credit_id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credit)
    }

    async fn find_credit_by_status(
        &self,
        client_id: Uuid,
        status: CreditStatus,
    ) -> Result<Option<Credit>, ApiError> {
        let credit = sqlx::query_as::<_, Credit>(&format!(
            "SELECT {CREDIT_COLUMNS} FROM credits WHERE client_id = $1 AND status = $2 LIMIT 1"
        ))
        .bind(client_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credit)
    }

    async fn find_credits(&self, client_id: Uuid, filter: &CreditFilter) -> Result<Vec<Credit>, ApiError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CREDIT_COLUMNS} FROM credits WHERE deleted = FALSE AND client_id = "
        ));
        builder.push_bind(client_id);

        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        push_range(&mut builder, "amount", filter.min_amount, filter.max_amount);
        push_order_and_page(&mut builder, &filter.sort, filter.page);

        let credits = builder
            .build_query_as::<Credit>()
            .fetch_all(&self.pool)
            .await?;

        Ok(credits)
    }

    async fn update_credit(
        &self,
        credit: &Credit,
        expected_status: CreditStatus,
    ) -> Result<Option<Credit>, ApiError> {
        let updated = sqlx::query_as::<_, Credit>(&format!(
            r#"
            UPDATE credits SET
                amount = $3, annual_interest_rate = $4, term_months = $5, status = $6,
                approval_date = $7, rejection_reason = $8
            WHERE id = $1 AND client_id = $2 AND status = $9 AND deleted = FALSE
            RETURNING {CREDIT_COLUMNS}
            "#
        ))
        .bind(credit.id)
        .bind(credit.client_id)
        .bind(credit.amount)
        .bind(credit.annual_interest_rate)
        .bind(credit.term_months)
        .bind(credit.status)
        .bind(credit.approval_date)
        .bind(&credit.rejection_reason)
        .bind(expected_status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn mark_credit_deleted(&self, client_id: Uuid, credit_id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE credits SET deleted = TRUE
            WHERE id = $1 AND client_id = $2 AND status = $3 AND deleted = FALSE
            "#,
        )
        .bind(credit_id)
        .bind(client_id)
        .bind(CreditStatus::InProcess)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
