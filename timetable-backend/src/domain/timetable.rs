// timetable-backend/src/domain/timetable.rs

use crate::domain::activity::{Activity, DayIndex};
use crate::domain::clock::{Clock, IdGenerator};
use crate::domain::week_period::{ActivityProgress, WeekPeriod};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ユーザーが初めて現在の週を要求したときに作られるタイムテーブル名
pub const DEFAULT_TIMETABLE_NAME: &str = "Default Timetable";

/// タイムテーブル集約
///
/// カタログ、現在の週、履歴（古い順、追記のみ）をひとまとめに扱う。
/// 永続化は常に集約単位で行い、`version` で楽観的ロックをかける。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableAggregate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(rename = "defaultActivities")]
    catalog: Vec<Activity>,
    current_week: WeekPeriod,
    history: Vec<WeekPeriod>,
    #[serde(skip)]
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 履歴の1ページ分
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub history: Vec<WeekPeriod>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_weeks: u64,
}

/// 新規作成時の入力
#[derive(Debug, Clone)]
pub struct NewTimetable {
    pub name: String,
    pub description: Option<String>,
    pub catalog: Vec<Activity>,
    pub is_active: bool,
}

impl TimetableAggregate {
    /// 新しいタイムテーブルを作り、現在時刻を含む週を開始する
    pub fn create(
        id: Uuid,
        user_id: Uuid,
        input: NewTimetable,
        clock: &dyn Clock,
        ids: &dyn IdGenerator,
    ) -> Self {
        let current_week = WeekPeriod::starting_at(clock.now(), &input.catalog, ids);
        let timestamp = clock.timestamp();
        Self {
            id,
            user_id,
            name: input.name,
            description: input.description,
            is_active: input.is_active,
            catalog: input.catalog,
            current_week,
            history: Vec::new(),
            version: 0,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// 組み込みカタログを持つ既定タイムテーブル（アクティブ）
    pub fn bootstrap(user_id: Uuid, clock: &dyn Clock, ids: &dyn IdGenerator) -> Self {
        let input = NewTimetable {
            name: DEFAULT_TIMETABLE_NAME.to_string(),
            description: None,
            catalog: Activity::default_catalog(),
            is_active: true,
        };
        Self::create(ids.new_id(), user_id, input, clock, ids)
    }

    /// 永続化層から復元する
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        user_id: Uuid,
        name: String,
        description: Option<String>,
        is_active: bool,
        catalog: Vec<Activity>,
        current_week: WeekPeriod,
        history: Vec<WeekPeriod>,
        version: i32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            name,
            description,
            is_active,
            catalog,
            current_week,
            history,
            version,
            created_at,
            updated_at,
        }
    }

    pub fn catalog(&self) -> &[Activity] {
        &self.catalog
    }

    pub fn current_week(&self) -> &WeekPeriod {
        &self.current_week
    }

    pub fn history(&self) -> &[WeekPeriod] {
        &self.history
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// 現在の週が終わっていればロールオーバーする。実行したら true
    pub fn roll_over_if_due(&mut self, clock: &dyn Clock, ids: &dyn IdGenerator) -> bool {
        if !self.current_week.is_expired(clock.now()) {
            return false;
        }
        self.advance_week(clock, ids);
        true
    }

    /// 現在の週を履歴へ送り、カタログから新しい週を作る
    ///
    /// 行が1つもない週は履歴に積まない。
    pub fn advance_week(&mut self, clock: &dyn Clock, ids: &dyn IdGenerator) {
        let next_week = WeekPeriod::starting_at(clock.now(), &self.catalog, ids);
        let finished = std::mem::replace(&mut self.current_week, next_week);
        if !finished.is_empty() {
            self.history.push(finished);
        }
        self.touch(clock.timestamp());
    }

    pub fn toggle_activity_day(
        &mut self,
        activity_id: Uuid,
        day: DayIndex,
        at: DateTime<Utc>,
    ) -> AppResult<&ActivityProgress> {
        let row = self.current_week.toggle_day(activity_id, day)?;
        self.updated_at = at;
        Ok(row)
    }

    /// カタログを置き換え、現在の週の行を突き合わせ直す
    pub fn replace_catalog(
        &mut self,
        catalog: Vec<Activity>,
        ids: &dyn IdGenerator,
        at: DateTime<Utc>,
    ) {
        self.current_week.reconcile(&catalog, ids);
        self.catalog = catalog;
        self.touch(at);
    }

    pub fn set_week_notes(&mut self, notes: Option<String>, at: DateTime<Utc>) {
        self.current_week.set_notes(notes);
        self.touch(at);
    }

    pub fn rename(&mut self, name: String, at: DateTime<Utc>) {
        self.name = name;
        self.touch(at);
    }

    pub fn set_description(&mut self, description: Option<String>, at: DateTime<Utc>) {
        self.description = description;
        self.touch(at);
    }

    pub fn set_active(&mut self, is_active: bool, at: DateTime<Utc>) {
        self.is_active = is_active;
        self.touch(at);
    }

    /// 履歴を保存順（古い順）で1始まりのページに切り出す
    ///
    /// 範囲外のページは空になるだけでエラーにはしない。
    pub fn history_page(&self, page: u64, page_size: u64) -> AppResult<HistoryPage> {
        if page == 0 {
            return Err(AppError::ValidationError(
                "page: Page must be 1 or greater".to_string(),
            ));
        }
        if page_size == 0 {
            return Err(AppError::ValidationError(
                "limit: Page size must be 1 or greater".to_string(),
            ));
        }

        let total_weeks = self.history.len() as u64;
        let total_pages = total_weeks.div_ceil(page_size);
        let start = (page - 1).saturating_mul(page_size).min(total_weeks) as usize;
        let end = page.saturating_mul(page_size).min(total_weeks) as usize;

        Ok(HistoryPage {
            history: self.history[start..end].to_vec(),
            current_page: page,
            total_pages,
            total_weeks,
        })
    }

    /// カタログに含まれるカテゴリ（出現順、重複なし）
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for activity in &self.catalog {
            if !categories.contains(&activity.category.as_str()) {
                categories.push(&activity.category);
            }
        }
        categories
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::testing::StoppedClock;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use std::sync::atomic::{AtomicU64, Ordering};

    struct SequentialIds(AtomicU64);

    impl IdGenerator for SequentialIds {
        fn new_id(&self) -> Uuid {
            Uuid::from_u128(u128::from(self.0.fetch_add(1, Ordering::SeqCst)))
        }
    }

    fn ids() -> SequentialIds {
        SequentialIds(AtomicU64::new(100))
    }

    fn wednesday() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 6)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn timetable_with(catalog: Vec<Activity>, ids: &SequentialIds) -> TimetableAggregate {
        TimetableAggregate::create(
            Uuid::from_u128(1),
            Uuid::from_u128(2),
            NewTimetable {
                name: "Study".to_string(),
                description: None,
                catalog,
                is_active: true,
            },
            &StoppedClock(wednesday()),
            ids,
        )
    }

    fn stamp() -> DateTime<Utc> {
        wednesday().and_utc()
    }

    fn study_catalog() -> Vec<Activity> {
        vec![
            Activity::new("Coding", "09-11", "Dev"),
            Activity::new("Reading", "20-21", "Learning"),
        ]
    }

    fn day(index: i64) -> DayIndex {
        DayIndex::try_from(index).unwrap()
    }

    #[test]
    fn test_bootstrap_uses_builtin_catalog() {
        let ids = ids();
        let timetable =
            TimetableAggregate::bootstrap(Uuid::from_u128(9), &StoppedClock(wednesday()), &ids);

        assert_eq!(timetable.name, DEFAULT_TIMETABLE_NAME);
        assert!(timetable.is_active);
        assert_eq!(timetable.catalog(), Activity::default_catalog().as_slice());
        assert_eq!(timetable.current_week().activities().len(), 2);
        assert!(timetable.history().is_empty());
    }

    #[test]
    fn test_advance_week_archives_week_with_rows() {
        let ids = ids();
        let mut timetable = timetable_with(study_catalog(), &ids);
        let coding_id = timetable.current_week().activities()[0].id;
        timetable.toggle_activity_day(coding_id, day(0), stamp()).unwrap();
        let archived = timetable.current_week().clone();

        timetable.advance_week(&StoppedClock(wednesday() + Duration::days(7)), &ids);

        assert_eq!(timetable.history(), &[archived]);
        assert_eq!(timetable.current_week().activities().len(), 2);
        assert!(timetable
            .current_week()
            .activities()
            .iter()
            .all(|row| row.daily_status().is_empty() && row.id != coding_id));
    }

    #[test]
    fn test_timestamps_follow_the_clock() {
        let ids = ids();
        let mut timetable = timetable_with(study_catalog(), &ids);
        assert_eq!(timetable.created_at, stamp());
        assert_eq!(timetable.updated_at, stamp());

        let next_week = wednesday() + Duration::days(7);
        timetable.advance_week(&StoppedClock(next_week), &ids);
        assert_eq!(timetable.created_at, stamp());
        assert_eq!(timetable.updated_at, next_week.and_utc());

        let later = next_week.and_utc() + Duration::hours(1);
        timetable.rename("Renamed".to_string(), later);
        assert_eq!(timetable.updated_at, later);
    }

    #[test]
    fn test_advance_week_archives_zero_percent_week() {
        let ids = ids();
        let mut timetable = timetable_with(study_catalog(), &ids);

        timetable.advance_week(&StoppedClock(wednesday()), &ids);

        assert_eq!(timetable.history().len(), 1);
        assert_eq!(timetable.history()[0].overall_completion_rate(), 0.0);
    }

    #[test]
    fn test_advance_week_skips_week_without_rows() {
        let ids = ids();
        let mut timetable = timetable_with(Vec::new(), &ids);

        timetable.advance_week(&StoppedClock(wednesday() + Duration::days(7)), &ids);

        assert!(timetable.history().is_empty());
    }

    #[test]
    fn test_roll_over_only_after_week_end() {
        let ids = ids();
        let mut timetable = timetable_with(study_catalog(), &ids);
        let sunday_night = NaiveDate::from_ymd_opt(2025, 8, 10)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();

        assert!(!timetable.roll_over_if_due(&StoppedClock(sunday_night), &ids));
        assert!(timetable.history().is_empty());

        let next_tuesday = wednesday() + Duration::days(6);
        assert!(timetable.roll_over_if_due(&StoppedClock(next_tuesday), &ids));
        assert_eq!(timetable.history().len(), 1);
        assert_eq!(
            timetable.current_week().start_date().date(),
            NaiveDate::from_ymd_opt(2025, 8, 11).unwrap()
        );
    }

    #[test]
    fn test_replace_catalog_reconciles_current_week() {
        let ids = ids();
        let mut timetable = timetable_with(study_catalog(), &ids);
        let reading = timetable.current_week().activities()[1].clone();
        timetable.toggle_activity_day(reading.id, day(6), stamp()).unwrap();

        let catalog = vec![
            Activity::new("Reading", "20-21", "Learning"),
            Activity::new("Gym", "07-08", "Health"),
        ];
        timetable.replace_catalog(catalog.clone(), &ids, stamp());

        assert_eq!(timetable.catalog(), catalog.as_slice());
        let rows = timetable.current_week().activities();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, reading.id);
        assert!(rows[0].daily_status().get(day(6)));
        assert!(rows[1].daily_status().is_empty());
    }

    #[test]
    fn test_history_paging_slices_in_stored_order() {
        let ids = ids();
        let mut timetable = timetable_with(study_catalog(), &ids);
        for week in 0..25 {
            let clock = StoppedClock(wednesday() + Duration::days(7 * (week + 1)));
            timetable.advance_week(&clock, &ids);
        }
        assert_eq!(timetable.history().len(), 25);

        let first = timetable.history_page(1, 10).unwrap();
        assert_eq!(first.history.as_slice(), &timetable.history()[0..10]);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_weeks, 25);

        let third = timetable.history_page(3, 10).unwrap();
        assert_eq!(third.history.as_slice(), &timetable.history()[20..25]);

        let fourth = timetable.history_page(4, 10).unwrap();
        assert!(fourth.history.is_empty());
        assert_eq!(fourth.total_pages, 3);
    }

    #[test]
    fn test_history_paging_rejects_zero_page_size() {
        let ids = ids();
        let timetable = timetable_with(study_catalog(), &ids);

        assert!(matches!(
            timetable.history_page(1, 0),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            timetable.history_page(0, 10),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_empty_history_has_zero_pages() {
        let ids = ids();
        let timetable = timetable_with(study_catalog(), &ids);

        let page = timetable.history_page(1, 10).unwrap();
        assert!(page.history.is_empty());
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.total_weeks, 0);
    }

    #[test]
    fn test_categories_are_unique_in_catalog_order() {
        let ids = ids();
        let timetable = timetable_with(
            vec![
                Activity::new("Go", "10-12", "Backend"),
                Activity::new("Java", "12-14", "Backend"),
                Activity::new("Algo", "18-20", "Core"),
            ],
            &ids,
        );

        assert_eq!(timetable.categories(), vec!["Backend", "Core"]);
    }
}
