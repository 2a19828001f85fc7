// timetable-backend/src/domain/timetable_stats.rs

//! タイムテーブルの集計
//!
//! 集約を読むだけで変更はしない。

use crate::domain::activity::DAYS_PER_WEEK;
use crate::domain::timetable::TimetableAggregate;
use crate::domain::week_period::{completion_percentage, WeekPeriod};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

/// カテゴリ別の達成状況
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub total: usize,
    pub completed: usize,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeekStats {
    pub completion_rate: f64,
    pub by_category: BTreeMap<String, CategoryStats>,
}

/// ベスト／ワースト週の要約
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummary {
    pub week_start_date: NaiveDateTime,
    pub completion_rate: f64,
}

impl From<&WeekPeriod> for WeekSummary {
    fn from(week: &WeekPeriod) -> Self {
        Self {
            week_start_date: week.start_date(),
            completion_rate: week.overall_completion_rate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalStats {
    pub total_weeks: usize,
    pub average_completion_rate: f64,
    pub best_week: Option<WeekSummary>,
    pub worst_week: Option<WeekSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableStats {
    pub current_week: CurrentWeekStats,
    pub overall: HistoricalStats,
}

/// 現在の週をカテゴリごとに集計する
pub fn current_week_stats(timetable: &TimetableAggregate) -> CurrentWeekStats {
    let week = timetable.current_week();
    let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();

    for row in week.activities() {
        let entry = counts.entry(row.activity.category.clone()).or_default();
        entry.0 += DAYS_PER_WEEK;
        entry.1 += row.completed_days();
    }

    let by_category = counts
        .into_iter()
        .map(|(category, (total, completed))| {
            let stats = CategoryStats {
                total,
                completed,
                completion_rate: completion_percentage(completed, total),
            };
            (category, stats)
        })
        .collect();

    CurrentWeekStats {
        completion_rate: week.overall_completion_rate(),
        by_category,
    }
}

/// 履歴と現在の週（未完了でも含める）を通した集計
pub fn historical_stats(timetable: &TimetableAggregate) -> HistoricalStats {
    let all_weeks: Vec<&WeekPeriod> = timetable
        .history()
        .iter()
        .chain(std::iter::once(timetable.current_week()))
        .collect();

    let (best_week, worst_week) = best_and_worst(&all_weeks);

    HistoricalStats {
        total_weeks: all_weeks.len(),
        average_completion_rate: average_rate(&all_weeks),
        best_week: best_week.map(WeekSummary::from),
        worst_week: worst_week.map(WeekSummary::from),
    }
}

pub fn timetable_stats(timetable: &TimetableAggregate) -> TimetableStats {
    TimetableStats {
        current_week: current_week_stats(timetable),
        overall: historical_stats(timetable),
    }
}

fn average_rate(weeks: &[&WeekPeriod]) -> f64 {
    if weeks.is_empty() {
        return 0.0;
    }
    let sum: f64 = weeks.iter().map(|week| week.overall_completion_rate()).sum();
    sum / weeks.len() as f64
}

/// 古い順に1回だけ走査し、厳密な大小比較で最初に現れた週を採用する
fn best_and_worst<'a>(
    weeks: &[&'a WeekPeriod],
) -> (Option<&'a WeekPeriod>, Option<&'a WeekPeriod>) {
    let mut best: Option<&WeekPeriod> = None;
    let mut worst: Option<&WeekPeriod> = None;

    for &week in weeks {
        let rate = week.overall_completion_rate();
        let beats_best = match best {
            Some(current) => rate > current.overall_completion_rate(),
            None => true,
        };
        if beats_best {
            best = Some(week);
        }

        let beats_worst = match worst {
            Some(current) => rate < current.overall_completion_rate(),
            None => true,
        };
        if beats_worst {
            worst = Some(week);
        }
    }

    (best, worst)
}
