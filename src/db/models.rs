//! Database Models
//!
//! Client / Credit 레코드와 열거형 타입.
//! 두 엔티티 모두 soft delete (`deleted` 플래그) 방식이며 실제 삭제 경로는 없음.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;
use crate::types::Projectable;

// ============ Enums ============

/// 대출 상태
///
/// 허용되는 전이는 `services::lifecycle::TRANSITIONS` 참고
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "credit_status", rename_all = "snake_case")]
pub enum CreditStatus {
    #[default]
    InProcess,
    Active,
    PastDue,
    Paid,
    Cancelled,
    Rejected,
}

impl CreditStatus {
    pub const ALL: [CreditStatus; 6] = [
        CreditStatus::InProcess,
        CreditStatus::Active,
        CreditStatus::PastDue,
        CreditStatus::Paid,
        CreditStatus::Cancelled,
        CreditStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::InProcess => "in_process",
            CreditStatus::Active => "active",
            CreditStatus::PastDue => "past_due",
            CreditStatus::Paid => "paid",
            CreditStatus::Cancelled => "cancelled",
            CreditStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CreditStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CreditStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ApiError::InvalidRequest(format!("Unknown credit status '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "gender", rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    PreferNotToSay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "marital_status", rename_all = "snake_case")]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
    Widowed,
    DomesticPartnership,
    Separated,
    PreferNotToSay,
}

// ============ Records ============

/// 주소 (모든 필드 옵션)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[sqlx(rename = "address_street")]
    pub street: Option<String>,
    #[sqlx(rename = "address_neighborhood")]
    pub neighborhood: Option<String>,
    #[sqlx(rename = "address_city")]
    pub city: Option<String>,
    #[sqlx(rename = "address_state")]
    pub state: Option<String>,
    #[sqlx(rename = "address_postal_code")]
    pub postal_code: Option<String>,
}

/// 고객 (대출 신청자)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub rfc: String,
    pub curp: String,
    pub gender: Option<Gender>,
    pub marital_status: Option<MaritalStatus>,
    #[sqlx(flatten)]
    pub address: Address,
    pub requested_amount: f64,
    pub monthly_income: f64,
    /// 단방향 플래그 (false → true)
    pub deleted: bool,
    /// 생성 시 1회 설정, 이후 불변
    pub created_at: DateTime<Utc>,
}

/// 대출
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Credit {
    pub id: Uuid,
    /// 소유 고객 (생성 후 불변)
    pub client_id: Uuid,
    pub amount: f64,
    /// 연 이자율 (0 ~ 1)
    pub annual_interest_rate: f64,
    pub term_months: i32,
    pub status: CreditStatus,
    pub created_at: DateTime<Utc>,
    /// `active` 진입 시각
    pub approval_date: Option<DateTime<Utc>>,
    /// `rejected` 진입 시 사유
    pub rejection_reason: Option<String>,
    pub deleted: bool,
}

impl Projectable for Client {
    const FIELDS: &'static [&'static str] = &[
        "id",
        "firstName",
        "lastName",
        "email",
        "birthDate",
        "rfc",
        "curp",
        "gender",
        "maritalStatus",
        "address",
        "requestedAmount",
        "monthlyIncome",
        "deleted",
        "createdAt",
    ];
}

impl Projectable for Credit {
    const FIELDS: &'static [&'static str] = &[
        "id",
        "clientId",
        "amount",
        "annualInterestRate",
        "termMonths",
        "status",
        "createdAt",
        "approvalDate",
        "rejectionReason",
        "deleted",
    ];
}

// ============ Validation ============

const FIRST_NAME_MAX: usize = 50;
const LAST_NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 256;
const RFC_LEN: usize = 13;
const CURP_LEN: usize = 18;

impl Client {
    /// 쓰기 전 필드 검증
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text("firstName", &self.first_name, FIRST_NAME_MAX)?;
        require_text("lastName", &self.last_name, LAST_NAME_MAX)?;
        require_text("email", &self.email, EMAIL_MAX)?;

        if !is_valid_email(&self.email) {
            return Err(ApiError::ValidationError("email must be a valid email address".to_string()));
        }
        if !is_valid_rfc(&self.rfc) {
            return Err(ApiError::ValidationError("rfc has an invalid format".to_string()));
        }
        if !is_valid_curp(&self.curp) {
            return Err(ApiError::ValidationError("curp has an invalid format".to_string()));
        }
        require_non_negative("requestedAmount", self.requested_amount)?;
        require_non_negative("monthlyIncome", self.monthly_income)?;

        Ok(())
    }
}

impl Credit {
    pub const MIN_AMOUNT: f64 = 1.0;
    pub const MIN_TERM_MONTHS: i32 = 1;

    /// 쓰기 전 필드 검증
    pub fn validate(&self) -> Result<(), ApiError> {
        if !self.amount.is_finite() || self.amount < Self::MIN_AMOUNT {
            return Err(ApiError::ValidationError("amount must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.annual_interest_rate) {
            return Err(ApiError::ValidationError(
                "annualInterestRate must be between 0 and 1".to_string(),
            ));
        }
        if self.term_months < Self::MIN_TERM_MONTHS {
            return Err(ApiError::ValidationError("termMonths must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::ValidationError(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(ApiError::ValidationError(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> Result<(), ApiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::ValidationError(format!("{} must be zero or greater", field)));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

/// `^[A-ZÑ&]{4}\d{6}[A-Z\d]{3}$`
fn is_valid_rfc(rfc: &str) -> bool {
    let chars: Vec<char> = rfc.chars().collect();
    chars.len() == RFC_LEN
        && chars[..4].iter().all(|c| c.is_ascii_uppercase() || *c == 'Ñ' || *c == '&')
        && chars[4..10].iter().all(char::is_ascii_digit)
        && chars[10..].iter().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// `^[A-Z]{4}\d{6}[HM][A-Z]{5}[A-Z\d]{2}$` (대소문자 무시)
fn is_valid_curp(curp: &str) -> bool {
    let upper = curp.to_ascii_uppercase();
    let chars: Vec<char> = upper.chars().collect();
    chars.len() == CURP_LEN
        && chars[..4].iter().all(char::is_ascii_uppercase)
        && chars[4..10].iter().all(char::is_ascii_digit)
        && matches!(chars[10], 'H' | 'M')
        && chars[11..16].iter().all(char::is_ascii_uppercase)
        && chars[16..].iter().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
