// timetable-backend/src/domain/activity.rs

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 1週間の日数
pub const DAYS_PER_WEEK: usize = 7;

/// タイムテーブルが追跡するアクティビティの定義
///
/// カタログ自体は識別子を持たないため、3つのフィールドすべての完全一致で同一性を判断する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    /// 表示用の時間帯ラベル（例: "09:00-11:00"）。時刻としては解釈しない
    #[serde(rename = "time")]
    pub time_label: String,
    pub category: String,
}

impl Activity {
    pub fn new(
        name: impl Into<String>,
        time_label: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            time_label: time_label.into(),
            category: category.into(),
        }
    }

    /// 既定タイムテーブルを作るときの組み込みカタログ
    pub fn default_catalog() -> Vec<Activity> {
        vec![
            Activity::new("DS & Algo", "18:00-00:00", "Core"),
            Activity::new("Backend", "10:00-12:00", "Backend"),
        ]
    }
}

/// 曜日のインデックス（0 = 月曜 … 6 = 日曜）
///
/// 範囲外の値は丸めずに検証エラーとする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayIndex(usize);

impl DayIndex {
    pub fn value(self) -> usize {
        self.0
    }
}

impl TryFrom<i64> for DayIndex {
    type Error = AppError;

    fn try_from(value: i64) -> AppResult<Self> {
        if (0..DAYS_PER_WEEK as i64).contains(&value) {
            Ok(Self(value as usize))
        } else {
            Err(AppError::ValidationError(format!(
                "dayIndex: Day index must be between 0 and 6, got {}",
                value
            )))
        }
    }
}

impl fmt::Display for DayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 月曜から日曜までの達成フラグ。長さは常に7
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayFlags([bool; DAYS_PER_WEEK]);

impl DayFlags {
    pub fn new(flags: [bool; DAYS_PER_WEEK]) -> Self {
        Self(flags)
    }

    pub fn get(&self, day: DayIndex) -> bool {
        self.0[day.value()]
    }

    /// 指定した曜日のフラグだけを反転し、新しい値を返す
    pub fn toggle(&mut self, day: DayIndex) -> bool {
        let flag = &mut self.0[day.value()];
        *flag = !*flag;
        *flag
    }

    pub fn completed_days(&self) -> usize {
        self.0.iter().filter(|done| **done).count()
    }

    pub fn is_empty(&self) -> bool {
        self.completed_days() == 0
    }

    pub fn as_array(&self) -> &[bool; DAYS_PER_WEEK] {
        &self.0
    }
}
