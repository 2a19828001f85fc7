// timetable-backend/src/domain/week_period.rs

use crate::domain::activity::{Activity, DayFlags, DayIndex, DAYS_PER_WEEK};
use crate::domain::clock::IdGenerator;
use crate::error::{AppError, AppResult};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 完了フラグの数から達成率（%）を算出する。分母が0なら0
pub fn completion_percentage(completed: usize, possible: usize) -> f64 {
    if possible == 0 {
        return 0.0;
    }
    completed as f64 / possible as f64 * 100.0
}

/// 指定日時を含む週の月曜 00:00 を返す（日曜はオフセット6、月曜は0）
pub fn week_start_for(now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date();
    let days_since_monday = i64::from(today.weekday().num_days_from_monday());
    start_of_day(today - Duration::days(days_since_monday))
}

/// 週の開始日から6日後の日の終わりを返す
pub fn week_end_for(start: NaiveDate) -> NaiveDateTime {
    // 翌週月曜 00:00 の 1ns 前。日曜のどの時刻も終了時刻を超えない
    start_of_day(start + Duration::days(DAYS_PER_WEEK as i64)) - Duration::nanoseconds(1)
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    // NaiveTime の既定値は 00:00:00
    date.and_time(NaiveTime::default())
}

/// Week Tracker の1行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ActivityProgressRecord")]
pub struct ActivityProgress {
    pub id: Uuid,
    pub activity: Activity,
    daily_status: DayFlags,
    completion_rate: f64,
}

impl ActivityProgress {
    /// すべて未完了の新しい行
    pub fn fresh(id: Uuid, activity: Activity) -> Self {
        Self::with_flags(id, activity, DayFlags::default())
    }

    pub fn with_flags(id: Uuid, activity: Activity, daily_status: DayFlags) -> Self {
        let completion_rate = completion_percentage(daily_status.completed_days(), DAYS_PER_WEEK);
        Self {
            id,
            activity,
            daily_status,
            completion_rate,
        }
    }

    pub fn daily_status(&self) -> &DayFlags {
        &self.daily_status
    }

    pub fn completion_rate(&self) -> f64 {
        self.completion_rate
    }

    pub fn completed_days(&self) -> usize {
        self.daily_status.completed_days()
    }

    fn toggle(&mut self, day: DayIndex) {
        self.daily_status.toggle(day);
        self.completion_rate =
            completion_percentage(self.daily_status.completed_days(), DAYS_PER_WEEK);
    }
}

// 保存済みの達成率は信用せず、読み込み時にフラグから再計算する
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityProgressRecord {
    id: Uuid,
    activity: Activity,
    daily_status: DayFlags,
}

impl From<ActivityProgressRecord> for ActivityProgress {
    fn from(record: ActivityProgressRecord) -> Self {
        Self::with_flags(record.id, record.activity, record.daily_status)
    }
}

/// 1週間分の達成状況（現在の週、または履歴の週）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WeekPeriodRecord")]
pub struct WeekPeriod {
    #[serde(rename = "weekStartDate")]
    start_date: NaiveDateTime,
    #[serde(rename = "weekEndDate")]
    end_date: NaiveDateTime,
    activities: Vec<ActivityProgress>,
    overall_completion_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl WeekPeriod {
    /// `now` を含む週を、カタログ順のまっさらな行で作る
    pub fn starting_at(now: NaiveDateTime, catalog: &[Activity], ids: &dyn IdGenerator) -> Self {
        let start_date = week_start_for(now);
        let activities = catalog
            .iter()
            .map(|activity| ActivityProgress::fresh(ids.new_id(), activity.clone()))
            .collect();
        Self::from_parts(start_date, activities, None)
    }

    /// 開始日時と行から週を組み立てる。終了日時と全体達成率は導出する
    pub fn from_parts(
        start_date: NaiveDateTime,
        activities: Vec<ActivityProgress>,
        notes: Option<String>,
    ) -> Self {
        let mut week = Self {
            start_date,
            end_date: week_end_for(start_date.date()),
            activities,
            overall_completion_rate: 0.0,
            notes,
        };
        week.recompute_overall();
        week
    }

    pub fn start_date(&self) -> NaiveDateTime {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDateTime {
        self.end_date
    }

    pub fn activities(&self) -> &[ActivityProgress] {
        &self.activities
    }

    pub fn overall_completion_rate(&self) -> f64 {
        self.overall_completion_rate
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// `now` が週の終了時刻を厳密に過ぎていればロールオーバーが必要
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        now > self.end_date
    }

    /// 1行の1日分のフラグを反転し、行と週の達成率を再計算する
    pub fn toggle_day(&mut self, activity_id: Uuid, day: DayIndex) -> AppResult<&ActivityProgress> {
        let index = self
            .activities
            .iter()
            .position(|row| row.id == activity_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Activity with id {} not found", activity_id))
            })?;

        self.activities[index].toggle(day);
        self.recompute_overall();
        Ok(&self.activities[index])
    }

    /// 新しいカタログに合わせて行を組み直す
    ///
    /// 3フィールドが完全一致する既存行は識別子とフラグを引き継ぐ。それ以外は
    /// 新しい未完了行になり、カタログから消えた行は捨てる。並びは新カタログ順。
    /// 名前などを変えたアクティビティは削除と追加の扱いになり、進捗は失われる。
    pub fn reconcile(&mut self, catalog: &[Activity], ids: &dyn IdGenerator) {
        let mut previous: Vec<Option<ActivityProgress>> =
            std::mem::take(&mut self.activities).into_iter().map(Some).collect();

        self.activities = catalog
            .iter()
            .map(|activity| {
                // 同じ定義が重複していても、既存行を引き継ぐのは1回だけ
                let matched = previous.iter_mut().find_map(|slot| {
                    if slot.as_ref().is_some_and(|row| &row.activity == activity) {
                        slot.take()
                    } else {
                        None
                    }
                });
                matched.unwrap_or_else(|| ActivityProgress::fresh(ids.new_id(), activity.clone()))
            })
            .collect();

        self.recompute_overall();
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    /// 全行の完了数の合計
    pub fn completed_days(&self) -> usize {
        self.activities.iter().map(ActivityProgress::completed_days).sum()
    }

    /// 全行で達成可能な日数（7 × 行数）
    pub fn possible_days(&self) -> usize {
        self.activities.len() * DAYS_PER_WEEK
    }

    fn recompute_overall(&mut self) {
        self.overall_completion_rate =
            completion_percentage(self.completed_days(), self.possible_days());
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeekPeriodRecord {
    week_start_date: NaiveDateTime,
    #[serde(default)]
    activities: Vec<ActivityProgress>,
    #[serde(default)]
    notes: Option<String>,
}

impl From<WeekPeriodRecord> for WeekPeriod {
    fn from(record: WeekPeriodRecord) -> Self {
        Self::from_parts(record.week_start_date, record.activities, record.notes)
    }
}
