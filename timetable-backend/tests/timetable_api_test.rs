// tests/timetable_api_test.rs
mod common;

use axum::http::{header, StatusCode};
use common::app_helper::{body_json, create_request, get_request, setup_app};
use common::fixtures::wednesday;
use common::init_test_env;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn create_timetable(app: &axum::Router, user_id: Uuid, body: Value) -> Value {
    let response = app
        .clone()
        .oneshot(create_request("POST", "/api/timetables", user_id, Some(&body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

#[tokio::test]
async fn test_missing_user_header_is_unauthorized() {
    init_test_env();
    let app = setup_app(wednesday());

    let request = axum::http::Request::builder()
        .uri("/api/timetables/current-week")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error_type"], "unauthorized");
}

#[tokio::test]
async fn test_current_week_bootstraps_and_disables_caching() {
    init_test_env();
    let app = setup_app(wednesday());
    let user_id = Uuid::new_v4();

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/timetables/current-week", user_id))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cache_control = response
        .headers()
        .get(header::CACHE_CONTROL)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cache_control.contains("no-store"));

    let body = body_json(response).await;
    let week = &body["data"]["currentWeek"];
    assert_eq!(body["data"]["timetableName"], "Default Timetable");
    assert_eq!(week["weekStartDate"], "2025-08-04T00:00:00");
    assert_eq!(week["activities"].as_array().unwrap().len(), 2);
    assert_eq!(week["activities"][0]["activity"]["time"], "18:00-00:00");
    assert_eq!(week["overallCompletionRate"], 0.0);
}

#[tokio::test]
async fn test_toggle_flow_and_error_kinds() {
    init_test_env();
    let app = setup_app(wednesday());
    let user_id = Uuid::new_v4();
    let timetable = create_timetable(
        &app.router,
        user_id,
        json!({
            "name": "Study",
            "defaultActivities": [
                { "name": "Coding", "time": "09-11", "category": "Dev" },
                { "name": "Reading", "time": "20-21", "category": "Learning" }
            ]
        }),
    )
    .await;
    let id = timetable["id"].as_str().unwrap().to_string();
    let activity_id = timetable["currentWeek"]["activities"][0]["id"].clone();
    let uri = format!("/api/timetables/{}/toggle", id);

    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            &uri,
            user_id,
            Some(&json!({ "activityId": activity_id, "dayIndex": 0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["activity"]["dailyStatus"][0], true);
    let rate = body["data"]["overallCompletionRate"].as_f64().unwrap();
    assert!((rate - 100.0 / 14.0).abs() < 1e-9);

    // 範囲外の曜日は検証エラー
    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            &uri,
            user_id,
            Some(&json!({ "activityId": activity_id, "dayIndex": 7 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_type"], "validation_error");

    // 存在しない行は NotFound
    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            &uri,
            user_id,
            Some(&json!({ "activityId": Uuid::new_v4(), "dayIndex": 1 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_validation_and_conflict() {
    init_test_env();
    let app = setup_app(wednesday());
    let user_id = Uuid::new_v4();

    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/api/timetables",
            user_id,
            Some(&json!({
                "name": "Study",
                "defaultActivities": [{ "name": "", "time": "09-11", "category": "Dev" }]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_type"], "validation_errors");
    assert!(body["validation_errors"]
        .as_object()
        .unwrap()
        .keys()
        .any(|field| field.ends_with("[0].name")));

    create_timetable(&app.router, user_id, json!({ "name": "Study" })).await;
    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/api/timetables",
            user_id,
            Some(&json!({ "name": "Study" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_history_paging_parameters() {
    init_test_env();
    let app = setup_app(wednesday());
    let user_id = Uuid::new_v4();
    let timetable = create_timetable(
        &app.router,
        user_id,
        json!({
            "name": "Study",
            "defaultActivities": [{ "name": "Coding", "time": "09-11", "category": "Dev" }]
        }),
    )
    .await;
    let id = timetable["id"].as_str().unwrap().to_string();

    for _ in 0..3 {
        let response = app
            .router
            .clone()
            .oneshot(create_request::<Value>(
                "POST",
                &format!("/api/timetables/{}/new-week", id),
                user_id,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .router
        .clone()
        .oneshot(get_request(
            &format!("/api/timetables/{}/history?page=2&limit=2", id),
            user_id,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["history"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["currentPage"], 2);
    assert_eq!(body["data"]["totalPages"], 2);
    assert_eq!(body["data"]["totalWeeks"], 3);

    let response = app
        .router
        .clone()
        .oneshot(get_request(
            &format!("/api/timetables/{}/history?limit=101", id),
            user_id,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .router
        .clone()
        .oneshot(get_request(
            &format!("/api/timetables/{}/history?page=0", id),
            user_id,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_and_query_are_validation_errors() {
    init_test_env();
    let app = setup_app(wednesday());
    let user_id = Uuid::new_v4();
    let timetable = create_timetable(
        &app.router,
        user_id,
        json!({
            "name": "Study",
            "defaultActivities": [{ "name": "Coding", "time": "09-11", "category": "Dev" }]
        }),
    )
    .await;
    let id = timetable["id"].as_str().unwrap().to_string();
    let activity_id = timetable["currentWeek"]["activities"][0]["id"].clone();

    // dayIndex がない
    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            &format!("/api/timetables/{}/toggle", id),
            user_id,
            Some(&json!({ "activityId": activity_id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error_type"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("dayIndex"));

    // 負のページ番号
    let response = app
        .router
        .clone()
        .oneshot(get_request(
            &format!("/api/timetables/{}/history?page=-1", id),
            user_id,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_type"], "validation_error");

    // 行は変わっていない
    let response = app
        .router
        .clone()
        .oneshot(get_request(&format!("/api/timetables/{}/current-week", id), user_id))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(
        body["data"]["currentWeek"]["activities"][0]["dailyStatus"],
        json!([false, false, false, false, false, false, false])
    );
}

#[tokio::test]
async fn test_stats_endpoint_shape() {
    init_test_env();
    let app = setup_app(wednesday());
    let user_id = Uuid::new_v4();
    let timetable = create_timetable(
        &app.router,
        user_id,
        json!({
            "name": "Study",
            "defaultActivities": [{ "name": "Coding", "time": "09-11", "category": "Dev" }]
        }),
    )
    .await;
    let id = timetable["id"].as_str().unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get_request(&format!("/api/timetables/{}/stats", id), user_id))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["overall"]["totalWeeks"], 1);
    assert_eq!(
        body["data"]["currentWeek"]["byCategory"]["Dev"]["total"],
        7
    );
    assert_eq!(
        body["data"]["overall"]["bestWeek"]["weekStartDate"],
        "2025-08-04T00:00:00"
    );
}

#[tokio::test]
async fn test_delete_last_timetable_is_refused_and_invalid_id_rejected() {
    init_test_env();
    let app = setup_app(wednesday());
    let user_id = Uuid::new_v4();
    let timetable = create_timetable(&app.router, user_id, json!({ "name": "Only" })).await;
    let id = timetable["id"].as_str().unwrap();

    let response = app
        .router
        .clone()
        .oneshot(create_request::<Value>(
            "DELETE",
            &format!("/api/timetables/{}", id),
            user_id,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/timetables/not-a-uuid", user_id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_and_categories() {
    init_test_env();
    let app = setup_app(wednesday());
    let user_id = Uuid::new_v4();
    create_timetable(
        &app.router,
        user_id,
        json!({
            "name": "Study",
            "defaultActivities": [
                { "name": "Coding", "time": "09-11", "category": "Dev" },
                { "name": "Reading", "time": "20-21", "category": "Learning" }
            ]
        }),
    )
    .await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/timetables", user_id))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["activitiesCount"], 2);
    assert_eq!(body["data"][0]["isActive"], true);

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/timetables/categories", user_id))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["categories"], json!(["Dev", "Learning"]));
}

#[tokio::test]
async fn test_health_check() {
    init_test_env();
    let app = setup_app(wednesday());

    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
