//! Common Types Module
//!
//! 애플리케이션 전반에서 사용되는 공통 타입 정의

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// API 응답 래퍼
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            results: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }
}

impl ApiResponse<()> {
    /// data 없이 메시지만
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            results: None,
            data: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(items: Vec<T>) -> Self {
        Self {
            results: Some(items.len()),
            ..Self::success(items)
        }
    }
}

/// 정렬 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// 정렬 키 하나 (`-amount` → amount DESC)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey<F> {
    pub field: F,
    pub direction: SortDirection,
}

/// 정렬 가능한 필드 (화이트리스트)
///
/// SQL에 직접 들어가므로 임의 문자열은 절대 허용하지 않음
pub trait SortField: Sized + Copy {
    /// API 이름 (camelCase)
    fn parse(name: &str) -> Option<Self>;
    /// 컬럼 이름
    fn column(&self) -> &'static str;
}

/// 목록 조회 쿼리 파라미터 (페이지네이션 + 정렬)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// 페이지 (1부터 시작)
    pub page: Option<u32>,
    /// 페이지 크기
    pub limit: Option<u32>,
    /// `createdAt,-amount` 형식
    pub sort: Option<String>,
    /// `firstName,email` 형식. `id`는 항상 포함
    pub fields: Option<String>,
}

/// 검증된 페이지 정보
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl ListQuery {
    /// 페이지 정보 계산
    ///
    /// page 최소 1, limit는 1 ~ max_limit 범위로 보정
    pub fn page(&self, default_limit: u32, max_limit: u32) -> Page {
        Page {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(default_limit).clamp(1, max_limit.max(1)),
        }
    }

    /// 정렬 파라미터 파싱. 없으면 `default` 사용
    pub fn sort_keys<F: SortField>(&self, default: SortKey<F>) -> Result<Vec<SortKey<F>>, ApiError> {
        let Some(raw) = self.sort.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Ok(vec![default]);
        };

        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (name, direction) = match part.strip_prefix('-') {
                    Some(name) => (name, SortDirection::Desc),
                    None => (part, SortDirection::Asc),
                };
                F::parse(name)
                    .map(|field| SortKey { field, direction })
                    .ok_or_else(|| ApiError::InvalidRequest(format!("Cannot sort by '{}'", name)))
            })
            .collect()
    }

    /// 필드 선택 파라미터 파싱. 없으면 `None` (전체 필드)
    pub fn selected_fields<T: Projectable>(&self) -> Result<Option<Vec<&'static str>>, ApiError> {
        let Some(raw) = self.fields.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };

        raw.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                T::FIELDS
                    .iter()
                    .find(|field| **field == name)
                    .copied()
                    .ok_or_else(|| ApiError::InvalidRequest(format!("Cannot select '{}'", name)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

/// 목록 응답에서 필드 선택이 가능한 레코드
pub trait Projectable: Serialize {
    /// 선택 가능한 JSON 키 (camelCase)
    const FIELDS: &'static [&'static str];
}

/// 레코드를 JSON으로 바꾸면서 선택된 키만 남김 (`id`는 항상 유지)
pub fn project<T: Projectable>(
    items: Vec<T>,
    fields: Option<&[&'static str]>,
) -> Result<Vec<Value>, ApiError> {
    items
        .into_iter()
        .map(|item| {
            let mut value = serde_json::to_value(item).map_err(|err| {
                tracing::error!(error = %err, "failed to serialize list item");
                ApiError::InternalError
            })?;
            if let (Some(fields), Value::Object(map)) = (fields, &mut value) {
                map.retain(|key, _| key == "id" || fields.contains(&key.as_str()));
            }
            Ok(value)
        })
        .collect()
}
