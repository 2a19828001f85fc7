// timetable-backend/src/api/mod.rs
use crate::api::handlers::timetable_handler::timetable_router;
use crate::config::AppConfig;
use crate::logging::{inject_request_context, logging_middleware};
use crate::service::timetable_service::TimetableService;
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod dto;
pub mod handlers;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub timetable_service: Arc<TimetableService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(timetable_service: Arc<TimetableService>, config: &AppConfig) -> Self {
        Self {
            timetable_service,
            config: Arc::new(config.clone()),
        }
    }
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(crate::extractors::current_user::USER_ID_HEADER),
        ])
}

/// ルーターにミドルウェアを重ねる
pub fn app_router(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);

    timetable_router(app_state)
        // 進捗は頻繁に変わるのでキャッシュさせない
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        ))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(inject_request_context))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
