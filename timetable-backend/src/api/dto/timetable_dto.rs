// src/api/dto/timetable_dto.rs
use crate::domain::activity::Activity;
use crate::domain::timetable::{NewTimetable, TimetableAggregate};
use crate::domain::week_period::{ActivityProgress, WeekPeriod};
use crate::service::timetable_service::TimetableChanges;
use crate::utils::validation::{activity, timetable, validate_not_blank};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// --- Request DTOs ---

#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
pub struct ActivityDto {
    #[validate(
        length(
            max = activity::FIELD_MAX_LENGTH,
            message = "Activity name must be 100 characters or less"
        ),
        custom(function = validate_not_blank)
    )]
    pub name: String,

    #[validate(
        length(
            max = activity::FIELD_MAX_LENGTH,
            message = "Activity time must be 100 characters or less"
        ),
        custom(function = validate_not_blank)
    )]
    pub time: String,

    #[validate(
        length(
            max = activity::FIELD_MAX_LENGTH,
            message = "Activity category must be 100 characters or less"
        ),
        custom(function = validate_not_blank)
    )]
    pub category: String,
}

impl From<ActivityDto> for Activity {
    fn from(dto: ActivityDto) -> Self {
        Activity::new(dto.name.trim(), dto.time.trim(), dto.category.trim())
    }
}

fn into_catalog(activities: Vec<ActivityDto>) -> Vec<Activity> {
    activities.into_iter().map(Activity::from).collect()
}

#[derive(Deserialize, Serialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimetableRequest {
    #[validate(
        length(
            min = timetable::NAME_MIN_LENGTH,
            max = timetable::NAME_MAX_LENGTH,
            message = "Timetable name must be between 1 and 100 characters"
        ),
        custom(function = validate_not_blank)
    )]
    pub name: String,

    #[validate(length(
        max = timetable::DESCRIPTION_MAX_LENGTH,
        message = "Description must be 500 characters or less"
    ))]
    pub description: Option<String>,

    #[serde(default, alias = "activities")]
    #[validate(
        length(
            max = activity::CATALOG_MAX_SIZE,
            message = "A timetable can track at most 50 activities"
        ),
        nested
    )]
    pub default_activities: Option<Vec<ActivityDto>>,

    pub is_active: Option<bool>,
}

impl From<CreateTimetableRequest> for NewTimetable {
    fn from(request: CreateTimetableRequest) -> Self {
        NewTimetable {
            name: request.name,
            description: request.description,
            catalog: into_catalog(request.default_activities.unwrap_or_default()),
            is_active: request.is_active.unwrap_or(true),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTimetableRequest {
    #[validate(
        length(
            min = timetable::NAME_MIN_LENGTH,
            max = timetable::NAME_MAX_LENGTH,
            message = "Timetable name must be between 1 and 100 characters"
        ),
        custom(function = validate_not_blank)
    )]
    pub name: Option<String>,

    #[validate(length(
        max = timetable::DESCRIPTION_MAX_LENGTH,
        message = "Description must be 500 characters or less"
    ))]
    pub description: Option<String>,

    pub is_active: Option<bool>,
}

impl From<UpdateTimetableRequest> for TimetableChanges {
    fn from(request: UpdateTimetableRequest) -> Self {
        TimetableChanges {
            name: request.name,
            description: request.description,
            is_active: request.is_active,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct ReplaceActivitiesRequest {
    #[validate(
        length(
            max = activity::CATALOG_MAX_SIZE,
            message = "A timetable can track at most 50 activities"
        ),
        nested
    )]
    pub activities: Vec<ActivityDto>,
}

impl ReplaceActivitiesRequest {
    pub fn into_catalog(self) -> Vec<Activity> {
        into_catalog(self.activities)
    }
}

/// `dayIndex` の範囲は `DayIndex::try_from` で検証する
#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ToggleDayRequest {
    pub activity_id: Uuid,
    pub day_index: i64,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct WeekNotesRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default, Validate)]
pub struct HistoryQuery {
    #[validate(range(min = 1, message = "Page must be 1 or greater"))]
    pub page: Option<u64>,

    #[validate(range(min = 1, message = "Limit must be 1 or greater"))]
    pub limit: Option<u64>,
}

impl HistoryQuery {
    pub const DEFAULT_PAGE: u64 = 1;
    pub const DEFAULT_LIMIT: u64 = 10;

    pub fn page(&self) -> u64 {
        self.page.unwrap_or(Self::DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

// --- Response DTOs ---

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimetableSummaryResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub activities_count: usize,
    pub completion_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TimetableAggregate> for TimetableSummaryResponse {
    fn from(timetable: &TimetableAggregate) -> Self {
        Self {
            id: timetable.id,
            name: timetable.name.clone(),
            description: timetable.description.clone(),
            is_active: timetable.is_active,
            activities_count: timetable.catalog().len(),
            completion_rate: timetable.current_week().overall_completion_rate(),
            created_at: timetable.created_at,
            updated_at: timetable.updated_at,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeekResponse {
    pub timetable_id: Uuid,
    pub timetable_name: String,
    pub is_active: bool,
    pub current_week: WeekPeriod,
}

impl From<&TimetableAggregate> for CurrentWeekResponse {
    fn from(timetable: &TimetableAggregate) -> Self {
        Self {
            timetable_id: timetable.id,
            timetable_name: timetable.name.clone(),
            is_active: timetable.is_active,
            current_week: timetable.current_week().clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ToggleDayResponse {
    pub activity: ActivityProgress,
    pub overall_completion_rate: f64,
}

#[derive(Serialize, Debug, Clone)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}
