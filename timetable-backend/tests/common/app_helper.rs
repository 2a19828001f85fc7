// tests/common/app_helper.rs
use super::fixtures::{service_at, ServiceContext};
use axum::{
    body::{self, Body},
    http::{header, Method, Request, Response},
    Router,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use timetable_backend::api::{app_router, AppState};
use timetable_backend::config::AppConfig;
use timetable_backend::extractors::current_user::USER_ID_HEADER;
use uuid::Uuid;

pub struct TestApp {
    pub router: Router,
    pub context: ServiceContext,
}

/// メモリ上の保存先を使うアプリを組み立てる
pub fn setup_app(now: NaiveDateTime) -> TestApp {
    let context = service_at(now);
    let app_state = AppState::new(context.service.clone(), &AppConfig::for_testing());
    TestApp {
        router: app_router(app_state),
        context,
    }
}

/// ユーザーヘッダー付きの JSON リクエストを作成
pub fn create_request<T: Serialize>(
    method: &str,
    uri: &str,
    user_id: Uuid,
    body: Option<&T>,
) -> Request<Body> {
    let method = Method::from_bytes(method.as_bytes()).unwrap();
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_ID_HEADER, user_id.to_string());

    match body {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(payload).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn get_request(uri: &str, user_id: Uuid) -> Request<Body> {
    create_request::<Value>("GET", uri, user_id, None)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
