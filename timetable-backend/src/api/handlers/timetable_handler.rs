// src/api/handlers/timetable_handler.rs
use crate::api::dto::timetable_dto::{
    CategoriesResponse, CreateTimetableRequest, CurrentWeekResponse, HistoryQuery,
    ReplaceActivitiesRequest, TimetableSummaryResponse, ToggleDayRequest, ToggleDayResponse,
    UpdateTimetableRequest, WeekNotesRequest,
};
use crate::api::AppState;
use crate::domain::activity::DayIndex;
use crate::domain::timetable::{HistoryPage, TimetableAggregate};
use crate::domain::timetable_stats::{CurrentWeekStats, HistoricalStats, TimetableStats};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, JsonBody, QueryParams, UuidPath};
use crate::types::ApiResponse;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use tracing::info;
use validator::Validate;

// --- Timetable CRUD ---

pub async fn list_timetables_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Vec<TimetableSummaryResponse>>> {
    let timetables = app_state
        .timetable_service
        .list_timetables(user.user_id())
        .await?;

    let summaries = timetables
        .iter()
        .map(TimetableSummaryResponse::from)
        .collect();
    Ok(ApiResponse::success(summaries))
}

pub async fn create_timetable_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
    JsonBody(payload): JsonBody<CreateTimetableRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    info!(
        user_id = %user.user_id(),
        name = %payload.name,
        "Creating new timetable"
    );

    let timetable = app_state
        .timetable_service
        .create_timetable(user.user_id(), payload.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::success(timetable).with_message("Timetable created"),
    ))
}

pub async fn get_timetable_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
) -> AppResult<ApiResponse<TimetableAggregate>> {
    let timetable = app_state
        .timetable_service
        .get_timetable(user.user_id(), id)
        .await?;
    Ok(ApiResponse::success(timetable))
}

pub async fn update_timetable_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
    JsonBody(payload): JsonBody<UpdateTimetableRequest>,
) -> AppResult<ApiResponse<TimetableAggregate>> {
    payload.validate()?;

    let timetable = app_state
        .timetable_service
        .update_timetable(user.user_id(), id, payload.into())
        .await?;
    Ok(ApiResponse::success(timetable).with_message("Timetable updated"))
}

pub async fn delete_timetable_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
) -> AppResult<ApiResponse<()>> {
    app_state
        .timetable_service
        .delete_timetable(user.user_id(), id)
        .await?;
    Ok(ApiResponse::success(()).with_message("Timetable deleted"))
}

pub async fn list_categories_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<CategoriesResponse>> {
    let categories = app_state
        .timetable_service
        .list_categories(user.user_id())
        .await?;
    Ok(ApiResponse::success(CategoriesResponse { categories }))
}

// --- Current week ---

pub async fn get_active_current_week_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<CurrentWeekResponse>> {
    let timetable = app_state
        .timetable_service
        .get_current_week(user.user_id(), None)
        .await?;
    Ok(ApiResponse::success(CurrentWeekResponse::from(&timetable)))
}

pub async fn get_current_week_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
) -> AppResult<ApiResponse<CurrentWeekResponse>> {
    let timetable = app_state
        .timetable_service
        .get_current_week(user.user_id(), Some(id))
        .await?;
    Ok(ApiResponse::success(CurrentWeekResponse::from(&timetable)))
}

pub async fn toggle_activity_day_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
    JsonBody(payload): JsonBody<ToggleDayRequest>,
) -> AppResult<ApiResponse<ToggleDayResponse>> {
    // 範囲外の曜日は読み込み前に弾く
    let day = DayIndex::try_from(payload.day_index)?;

    let (timetable, activity) = app_state
        .timetable_service
        .toggle_activity_day(user.user_id(), id, payload.activity_id, day)
        .await?;

    Ok(ApiResponse::success(ToggleDayResponse {
        activity,
        overall_completion_rate: timetable.current_week().overall_completion_rate(),
    }))
}

pub async fn replace_activities_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
    JsonBody(payload): JsonBody<ReplaceActivitiesRequest>,
) -> AppResult<ApiResponse<TimetableAggregate>> {
    payload.validate()?;

    let timetable = app_state
        .timetable_service
        .replace_catalog(user.user_id(), id, payload.into_catalog())
        .await?;
    Ok(ApiResponse::success(timetable).with_message("Activities updated"))
}

pub async fn advance_week_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
) -> AppResult<ApiResponse<CurrentWeekResponse>> {
    let timetable = app_state
        .timetable_service
        .advance_week_manually(user.user_id(), id)
        .await?;
    Ok(ApiResponse::success(CurrentWeekResponse::from(&timetable)).with_message("New week started"))
}

pub async fn set_week_notes_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
    JsonBody(payload): JsonBody<WeekNotesRequest>,
) -> AppResult<ApiResponse<CurrentWeekResponse>> {
    let timetable = app_state
        .timetable_service
        .set_week_notes(user.user_id(), id, payload.notes)
        .await?;
    Ok(ApiResponse::success(CurrentWeekResponse::from(&timetable)))
}

// --- History & stats ---

pub async fn get_history_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
    QueryParams(query): QueryParams<HistoryQuery>,
) -> AppResult<ApiResponse<HistoryPage>> {
    query.validate()?;

    let max = app_state.config.history_page_size_max;
    if query.limit() > max {
        return Err(AppError::ValidationError(format!(
            "limit: Limit must be {} or less",
            max
        )));
    }

    let page = app_state
        .timetable_service
        .get_history_page(user.user_id(), id, query.page(), query.limit())
        .await?;
    Ok(ApiResponse::success(page))
}

pub async fn get_stats_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
) -> AppResult<ApiResponse<TimetableStats>> {
    let stats = app_state
        .timetable_service
        .get_timetable_stats(user.user_id(), id)
        .await?;
    Ok(ApiResponse::success(stats))
}

pub async fn get_current_week_stats_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
) -> AppResult<ApiResponse<CurrentWeekStats>> {
    let stats = app_state
        .timetable_service
        .get_current_week_stats(user.user_id(), id)
        .await?;
    Ok(ApiResponse::success(stats))
}

pub async fn get_historical_stats_handler(
    State(app_state): State<AppState>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
) -> AppResult<ApiResponse<HistoricalStats>> {
    let stats = app_state
        .timetable_service
        .get_historical_stats(user.user_id(), id)
        .await?;
    Ok(ApiResponse::success(stats))
}

pub async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn timetable_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/timetables",
            get(list_timetables_handler).post(create_timetable_handler),
        )
        // 静的セグメントは {id} より優先される
        .route(
            "/api/timetables/current-week",
            get(get_active_current_week_handler),
        )
        .route("/api/timetables/categories", get(list_categories_handler))
        .route(
            "/api/timetables/{id}",
            get(get_timetable_handler)
                .put(update_timetable_handler)
                .delete(delete_timetable_handler),
        )
        .route(
            "/api/timetables/{id}/current-week",
            get(get_current_week_handler),
        )
        .route(
            "/api/timetables/{id}/current-week/notes",
            put(set_week_notes_handler),
        )
        .route("/api/timetables/{id}/history", get(get_history_handler))
        .route(
            "/api/timetables/{id}/toggle",
            post(toggle_activity_day_handler),
        )
        .route(
            "/api/timetables/{id}/activities",
            put(replace_activities_handler),
        )
        .route("/api/timetables/{id}/new-week", post(advance_week_handler))
        .route("/api/timetables/{id}/stats", get(get_stats_handler))
        .route(
            "/api/timetables/{id}/stats/current-week",
            get(get_current_week_stats_handler),
        )
        .route(
            "/api/timetables/{id}/stats/history",
            get(get_historical_stats_handler),
        )
        .route("/health", get(health_check_handler))
        .with_state(app_state)
}
