//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//! - `/health` - 헬스 체크
//! - `/api/v1/client/*` - 고객 관리
//! - `/api/v1/client/:client_id/credit/*` - 대출 관리

pub mod clients;
pub mod credits;
pub mod extract;
pub mod health;
pub mod rate_limit;

use axum::{
    http::{header, HeaderValue, Method, Uri},
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::{error::ApiError, AppState};

/// 라우터 생성
///
/// 모든 요청(404 포함)이 IP별 rate limit 대상
///
/// # Route Structure
///
/// ```text
/// GET    /health                                        - 서버 상태 확인
///
/// POST   /api/v1/client                                 - 고객 생성
/// GET    /api/v1/client                                 - 고객 목록
/// GET    /api/v1/client/:client_id                      - 고객 조회
/// PUT    /api/v1/client/:client_id                      - 고객 수정
/// DELETE /api/v1/client/:client_id                      - 고객 삭제 (soft)
///
/// POST   /api/v1/client/:client_id/credit               - 대출 생성
/// GET    /api/v1/client/:client_id/credit               - 대출 목록
/// GET    /api/v1/client/:client_id/credit/:credit_id    - 대출 조회
/// PUT    /api/v1/client/:client_id/credit/:credit_id    - 대출 수정 / 상태 전이
/// DELETE /api/v1/client/:client_id/credit/:credit_id    - 대출 삭제 (soft)
/// ```
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state);
    let body_limit = RequestBodyLimitLayer::new(state.config.max_body_bytes);

    let api = Router::new()
        .route("/client", get(clients::list_clients).post(clients::create_client))
        .route(
            "/client/:client_id",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route(
            "/client/:client_id/credit",
            get(credits::list_credits).post(credits::create_credit),
        )
        .route(
            "/client/:client_id/credit/:credit_id",
            get(credits::get_credit)
                .put(credits::update_credit)
                .delete(credits::delete_credit),
        );

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .nest("/api/v1", api)
        .fallback(route_not_found)

        // 미들웨어
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit::limit_requests))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)

        // 상태 주입
        .with_state(state)
}

/// CORS 설정
///
/// 프로덕션: `ALLOWED_ORIGINS`에 지정된 도메인만 허용
/// 개발: localhost 허용
fn cors_layer(state: &AppState) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

    if state.config.is_production() {
        let origins: Vec<HeaderValue> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
    } else {
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:5173"),
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:5173"),
            ])
            .allow_methods(methods)
            .allow_headers(Any)
    }
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("{} route", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{fixtures, mock::MockStore, CreditStatus, Gender};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app_with(config: Config) -> (Router, Arc<MockStore>) {
        let store = Arc::new(MockStore::new());
        let state = AppState::with_store(store.clone(), config);
        (router(state), store)
    }

    fn app() -> (Router, Arc<MockStore>) {
        app_with(Config::default())
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn client_body() -> Value {
        json!({
            "firstName": "María",
            "lastName": "Hernández Ruiz",
            "email": "maria@example.com",
            "birthDate": "1992-08-30",
            "rfc": "HERM920830K21",
            "curp": "HERM920830MDFRZR05",
            "maritalStatus": "married",
            "requestedAmount": 30000,
            "monthlyIncome": 25000
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"]["connected"], true);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (app, _) = app();
        let (status, body) = send(&app, "GET", "/api/v1/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "/api/v1/nope route not found");
    }

    #[tokio::test]
    async fn test_security_headers_present() {
        let (app, _) = app();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
    }

    #[tokio::test]
    async fn test_client_crud_flow() {
        let (app, _) = app();

        let (status, body) = send(&app, "POST", "/api/v1/client", Some(client_body())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["deleted"], false);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/v1/client/{id}"),
            Some(json!({ "monthlyIncome": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["monthlyIncome"], 0.0);

        let (status, body) = send(&app, "GET", "/api/v1/client", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"], 1);

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/client/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", &format!("/api/v1/client/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_deleted_in_payload_is_bad_request() {
        let (app, _) = app();
        let mut body = client_body();
        body["deleted"] = json!(false);

        let (status, body) = send(&app, "POST", "/api/v1/client", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let (app, _) = app();
        let (status, body) = send(&app, "GET", "/api/v1/client/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_unknown_status_value_is_bad_request() {
        let (app, store) = app();
        let client = store.insert_client(fixtures::client());
        let credit = store.insert_credit(fixtures::credit(client.id, CreditStatus::InProcess));

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/v1/client/{}/credit/{}", client.id, credit.id),
            Some(json!({ "status": "liquidated" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_credit_lifecycle_over_http() {
        let (app, store) = app();
        let client = store.insert_client(fixtures::client());
        let base = format!("/api/v1/client/{}/credit", client.id);

        let (status, body) = send(
            &app,
            "POST",
            &base,
            Some(json!({ "amount": 1000, "interestRate": 0.2, "termMonths": 12 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "in_process");
        let credit_id = body["data"]["id"].as_str().unwrap().to_string();
        let credit_url = format!("{base}/{credit_id}");

        let (status, body) = send(
            &app,
            "PUT",
            &credit_url,
            Some(json!({ "amount": 500, "status": "active" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["amount"], 500.0);
        assert_eq!(body["data"]["status"], "active");
        assert!(body["data"]["approvalDate"].is_string());

        let (status, body) =
            send(&app, "PUT", &credit_url, Some(json!({ "status": "rejected" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_TRANSITION");

        let (status, body) = send(&app, "DELETE", &credit_url, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, _) =
            send(&app, "DELETE", &format!("/api/v1/client/{}", client.id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) =
            send(&app, "PUT", &credit_url, Some(json!({ "status": "cancelled" }))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) =
            send(&app, "DELETE", &format!("/api/v1/client/{}", client.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(store.client(client.id).unwrap().deleted);
    }

    #[tokio::test]
    async fn test_credit_of_other_client_is_not_found() {
        let (app, store) = app();
        let owner = store.insert_client(fixtures::client());
        let other = store.insert_client(fixtures::client());
        let credit = store.insert_credit(fixtures::credit(owner.id, CreditStatus::InProcess));

        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/v1/client/{}/credit/{}", other.id, credit.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/v1/client/{}/credit/{}", Uuid::new_v4(), credit.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_credit_list_with_status_filter() {
        let (app, store) = app();
        let client = store.insert_client(fixtures::client());
        store.insert_credit(fixtures::credit(client.id, CreditStatus::Active));
        store.insert_credit(fixtures::credit(client.id, CreditStatus::Paid));

        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/v1/client/{}/credit?status=paid", client.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"], 1);
        assert_eq!(body["data"][0]["status"], "paid");
    }

    #[tokio::test]
    async fn test_bad_sort_field_is_bad_request() {
        let (app, _) = app();
        let (status, body) = send(&app, "GET", "/api/v1/client?sort=password", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cannot sort by 'password'");
    }

    #[tokio::test]
    async fn test_create_with_missing_field_is_validation_error() {
        let (app, store) = app();
        let client = store.insert_client(fixtures::client());

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/client/{}/credit", client.id),
            Some(json!({ "interestRate": 0.2, "termMonths": 12 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["details"].as_str().unwrap().contains("amount"));
    }

    #[tokio::test]
    async fn test_create_with_wrong_type_is_validation_error() {
        let (app, store) = app();
        let client = store.insert_client(fixtures::client());

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/client/{}/credit", client.id),
            Some(json!({ "amount": "abc", "interestRate": 0.2, "termMonths": 12 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let mut client_body = client_body();
        client_body["monthlyIncome"] = json!("a lot");
        let (status, body) = send(&app, "POST", "/api/v1/client", Some(client_body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_request() {
        let (app, _) = app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/client")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"firstName\": "))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_invalid_request() {
        let (app, _) = app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/client")
            .body(Body::from(client_body().to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_rate_limit_returns_429_after_quota() {
        let config = Config { rate_limit_max: 2, ..Config::default() };
        let (app, _) = app_with(config);

        for _ in 0..2 {
            let (status, _) = send(&app, "GET", "/health", None).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(&app, "GET", "/api/v1/client", None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["code"], "RATE_LIMITED");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_client_list_filters_and_fields() {
        let (app, store) = app();
        for (income, gender) in [(0.0, Gender::Female), (30_000.0, Gender::Female), (50_000.0, Gender::Male)] {
            let mut client = fixtures::client();
            client.monthly_income = income;
            client.gender = Some(gender);
            store.insert_client(client);
        }

        let (status, body) = send(
            &app,
            "GET",
            "/api/v1/client?gender=female&minMonthlyIncome=10000&fields=firstName,monthlyIncome",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"], 1);

        let item = body["data"][0].as_object().unwrap();
        let mut keys: Vec<&str> = item.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, ["firstName", "id", "monthlyIncome"]);
        assert_eq!(item["monthlyIncome"], 30_000.0);
    }

    #[tokio::test]
    async fn test_credit_list_fields_projection() {
        let (app, store) = app();
        let client = store.insert_client(fixtures::client());
        store.insert_credit(fixtures::credit(client.id, CreditStatus::Active));

        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/v1/client/{}/credit?fields=status", client.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["status"], "active");
        assert!(body["data"][0]["id"].is_string());
        assert!(body["data"][0].get("amount").is_none());

        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/v1/client/{}/credit?fields=secret", client.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cannot select 'secret'");
    }
}
