//! Credit Lifecycle Engine
//!
//! # Interview Q&A
//!
//! Q: 상태 전이 규칙을 왜 테이블로 표현했는가?
//! A: 중첩 조건문 대신 데이터
//!
//!    ```text
//!    in_process ──▶ active, past_due, paid, cancelled, rejected
//!    active     ──▶ past_due, paid, cancelled
//!    past_due   ──▶ active, paid, cancelled
//!    paid / cancelled / rejected ──▶ (종료 상태)
//!    ```
//!
//!    - 상태/전이 추가 = 테이블 한 줄 수정
//!    - 테이블 자체를 테스트로 전수 검증 가능
//!
//! Q: 요청에 없는 필드와 값이 0인 필드는 어떻게 구분하는가?
//! A: 모든 patch 필드를 `Option`으로 받음
//!    - `None`: 요청에 없음 → 기존 값 유지
//!    - `Some(0.0)`: 명시적인 값 → 그대로 반영 (이자율 0 등)
//!
//! 이 모듈은 순수 함수만 가짐 (저장소 접근 없음, 현재 시각도 인자로 받음)

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::guard;
use crate::db::{Credit, CreditStatus};
use crate::error::ApiError;

use CreditStatus::*;

/// 상태 전이 테이블 (현재 상태 → 이동 가능한 상태)
pub const TRANSITIONS: &[(CreditStatus, &[CreditStatus])] = &[
    (InProcess, &[Active, PastDue, Paid, Cancelled, Rejected]),
    (Active, &[PastDue, Paid, Cancelled]),
    (PastDue, &[Active, Paid, Cancelled]),
    (Paid, &[]),
    (Cancelled, &[]),
    (Rejected, &[]),
];

/// `from`에서 이동 가능한 상태 목록
pub fn allowed_targets(from: CreditStatus) -> &'static [CreditStatus] {
    TRANSITIONS
        .iter()
        .find(|(source, _)| *source == from)
        .map(|(_, targets)| *targets)
        .unwrap_or(&[])
}

/// 상태 전이 가능 여부 (동일 상태는 전이가 아니므로 여기서 다루지 않음)
pub fn can_transition(from: CreditStatus, to: CreditStatus) -> bool {
    allowed_targets(from).contains(&to)
}

/// 대출 수정 요청
///
/// 모든 필드는 옵션. 알 수 없는 필드는 무시됨
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditPatch {
    pub amount: Option<f64>,
    #[serde(alias = "interestRate")]
    pub annual_interest_rate: Option<f64>,
    pub term_months: Option<i32>,
    pub status: Option<CreditStatus>,
    pub rejection_reason: Option<String>,
    /// 설정 불가. 값과 상관없이 존재하면 거부
    pub deleted: Option<bool>,
}

/// 현재 대출에 patch 적용
///
/// # Rules (순서대로 평가, 첫 위반에서 중단)
///
/// 1. `deleted` 포함 → `InvalidRequest`
/// 2. 현재 `in_process`: 금액/이자율/기간 반영,
///    이번 요청에서 `active`로 가면 승인일 기록, `rejected`로 가면 사유 기록
/// 3. 상태 변경 요청이 현재와 다르면 전이 테이블 확인 → 불가 시 `InvalidTransition`
/// 4. 현재 `in_process`가 아니면 금액/이자율/기간은 조용히 무시
///
/// 반환값은 새 레코드. 저장은 호출자 책임
pub fn apply_update(
    current: &Credit,
    patch: &CreditPatch,
    now: DateTime<Utc>,
) -> Result<Credit, ApiError> {
    guard::forbid_deleted_field(patch.deleted)?;

    let mut next = current.clone();

    if current.status == InProcess {
        if let Some(amount) = patch.amount {
            next.amount = amount;
        }
        if let Some(rate) = patch.annual_interest_rate {
            next.annual_interest_rate = rate;
        }
        if let Some(term) = patch.term_months {
            next.term_months = term;
        }

        match patch.status {
            Some(Active) => next.approval_date = Some(now),
            Some(Rejected) => {
                if let Some(reason) = &patch.rejection_reason {
                    next.rejection_reason = Some(reason.clone());
                }
            }
            _ => {}
        }
    }

    if let Some(target) = patch.status.filter(|target| *target != current.status) {
        if !can_transition(current.status, target) {
            return Err(ApiError::InvalidTransition { from: current.status });
        }
        next.status = target;
    }

    Ok(next)
}
