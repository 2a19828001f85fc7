// src/service/timetable_service.rs

use crate::domain::activity::{Activity, DayIndex};
use crate::domain::clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::domain::timetable::{HistoryPage, NewTimetable, TimetableAggregate};
use crate::domain::timetable_stats::{
    current_week_stats, historical_stats, timetable_stats, CurrentWeekStats, HistoricalStats,
    TimetableStats,
};
use crate::domain::week_period::ActivityProgress;
use crate::error::{AppError, AppResult};
use crate::repository::timetable_store::TimetableStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const WEEK_NOTES_MAX_CHARS: usize = 1000;

/// タイムテーブル更新の入力。`None` の項目は変更しない
#[derive(Debug, Clone, Default)]
pub struct TimetableChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl TimetableChanges {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.is_active.is_none()
    }
}

pub struct TimetableService {
    store: Arc<dyn TimetableStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

fn normalize_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(
            "name: Timetable name is required".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

impl TimetableService {
    pub fn new(
        store: Arc<dyn TimetableStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self { store, clock, ids }
    }

    pub fn with_system_clock(store: Arc<dyn TimetableStore>) -> Self {
        Self::new(store, Arc::new(SystemClock), Arc::new(UuidGenerator))
    }

    /// 期限切れの週をロールオーバーし、変化があれば保存する
    async fn persist_rollover(&self, mut timetable: TimetableAggregate) -> AppResult<TimetableAggregate> {
        let now = self.clock.now();
        if !timetable.roll_over_if_due(self.clock.as_ref(), self.ids.as_ref()) {
            return Ok(timetable);
        }

        info!(
            timetable_id = %timetable.id,
            user_id = %timetable.user_id,
            history_weeks = timetable.history().len(),
            "Current week rolled over"
        );

        match self.store.save(&timetable).await {
            Ok(saved) => Ok(saved),
            Err(AppError::Conflict(message)) => {
                // 並行リクエストが先にロールオーバーを保存していればそれを使う
                let reloaded = self.store.load(timetable.id, timetable.user_id).await?;
                if reloaded.current_week().is_expired(now) {
                    return Err(AppError::Conflict(message));
                }
                warn!(timetable_id = %timetable.id, "Rollover already saved by another request");
                Ok(reloaded)
            }
            Err(e) => Err(e),
        }
    }

    async fn load_current(&self, user_id: Uuid, timetable_id: Uuid) -> AppResult<TimetableAggregate> {
        let timetable = self.store.load(timetable_id, user_id).await?;
        self.persist_rollover(timetable).await
    }

    /// 書き込み前に期限切れの週を進めておく
    async fn load_for_update(
        &self,
        user_id: Uuid,
        timetable_id: Uuid,
    ) -> AppResult<TimetableAggregate> {
        let mut timetable = self.store.load(timetable_id, user_id).await?;
        timetable.roll_over_if_due(self.clock.as_ref(), self.ids.as_ref());
        Ok(timetable)
    }

    /// アクティブ → 任意の1件（アクティブ化）→ 既定タイムテーブル作成、の順で探す
    pub async fn ensure_timetable_exists(&self, user_id: Uuid) -> AppResult<TimetableAggregate> {
        if let Some(active) = self.store.find_active(user_id).await? {
            return self.persist_rollover(active).await;
        }

        if let Some(mut first) = self.store.list_by_user(user_id).await?.into_iter().next() {
            info!(user_id = %user_id, timetable_id = %first.id, "Activating existing timetable");
            first.set_active(true, self.clock.timestamp());
            first.roll_over_if_due(self.clock.as_ref(), self.ids.as_ref());
            return self.store.save_active(&first).await;
        }

        let timetable =
            TimetableAggregate::bootstrap(user_id, self.clock.as_ref(), self.ids.as_ref());
        info!(user_id = %user_id, timetable_id = %timetable.id, "Creating default timetable");

        match self.store.save_active(&timetable).await {
            Err(AppError::Conflict(message)) => {
                // 同時に既定タイムテーブルが作られた
                self.store
                    .find_active(user_id)
                    .await?
                    .ok_or(AppError::Conflict(message))
            }
            result => result,
        }
    }

    pub async fn get_current_week(
        &self,
        user_id: Uuid,
        timetable_id: Option<Uuid>,
    ) -> AppResult<TimetableAggregate> {
        match timetable_id {
            Some(id) => self.load_current(user_id, id).await,
            None => self.ensure_timetable_exists(user_id).await,
        }
    }

    pub async fn get_timetable(&self, user_id: Uuid, timetable_id: Uuid) -> AppResult<TimetableAggregate> {
        self.load_current(user_id, timetable_id).await
    }

    pub async fn list_timetables(&self, user_id: Uuid) -> AppResult<Vec<TimetableAggregate>> {
        self.store.list_by_user(user_id).await
    }

    pub async fn toggle_activity_day(
        &self,
        user_id: Uuid,
        timetable_id: Uuid,
        activity_id: Uuid,
        day: DayIndex,
    ) -> AppResult<(TimetableAggregate, ActivityProgress)> {
        let mut timetable = self.load_for_update(user_id, timetable_id).await?;
        let row = timetable
            .toggle_activity_day(activity_id, day, self.clock.timestamp())?
            .clone();
        let saved = self.store.save(&timetable).await?;

        info!(
            user_id = %user_id,
            timetable_id = %timetable_id,
            activity_id = %activity_id,
            day = %day,
            completed = row.daily_status().get(day),
            "Activity day toggled"
        );
        Ok((saved, row))
    }

    pub async fn replace_catalog(
        &self,
        user_id: Uuid,
        timetable_id: Uuid,
        catalog: Vec<Activity>,
    ) -> AppResult<TimetableAggregate> {
        let mut timetable = self.load_for_update(user_id, timetable_id).await?;
        timetable.replace_catalog(catalog, self.ids.as_ref(), self.clock.timestamp());
        let saved = self.store.save(&timetable).await?;

        info!(
            user_id = %user_id,
            timetable_id = %timetable_id,
            activities = saved.catalog().len(),
            "Timetable catalog replaced"
        );
        Ok(saved)
    }

    /// 期限に関係なく現在の週を履歴へ送る
    pub async fn advance_week_manually(
        &self,
        user_id: Uuid,
        timetable_id: Uuid,
    ) -> AppResult<TimetableAggregate> {
        // 先にロールオーバーすると同じ週が二重に積まれるので、ここでは直接進める
        let mut timetable = self.store.load(timetable_id, user_id).await?;
        timetable.advance_week(self.clock.as_ref(), self.ids.as_ref());
        let saved = self.store.save(&timetable).await?;

        info!(
            user_id = %user_id,
            timetable_id = %timetable_id,
            history_weeks = saved.history().len(),
            "Week advanced manually"
        );
        Ok(saved)
    }

    pub async fn set_week_notes(
        &self,
        user_id: Uuid,
        timetable_id: Uuid,
        notes: Option<String>,
    ) -> AppResult<TimetableAggregate> {
        let notes = normalize_optional_text(notes);
        if let Some(text) = &notes {
            if text.chars().count() > WEEK_NOTES_MAX_CHARS {
                return Err(AppError::ValidationError(format!(
                    "notes: Notes must be {} characters or less",
                    WEEK_NOTES_MAX_CHARS
                )));
            }
        }

        let mut timetable = self.load_for_update(user_id, timetable_id).await?;
        timetable.set_week_notes(notes, self.clock.timestamp());
        self.store.save(&timetable).await
    }

    pub async fn get_current_week_stats(
        &self,
        user_id: Uuid,
        timetable_id: Uuid,
    ) -> AppResult<CurrentWeekStats> {
        let timetable = self.load_current(user_id, timetable_id).await?;
        Ok(current_week_stats(&timetable))
    }

    pub async fn get_historical_stats(
        &self,
        user_id: Uuid,
        timetable_id: Uuid,
    ) -> AppResult<HistoricalStats> {
        let timetable = self.load_current(user_id, timetable_id).await?;
        Ok(historical_stats(&timetable))
    }

    pub async fn get_timetable_stats(
        &self,
        user_id: Uuid,
        timetable_id: Uuid,
    ) -> AppResult<TimetableStats> {
        let timetable = self.load_current(user_id, timetable_id).await?;
        Ok(timetable_stats(&timetable))
    }

    pub async fn get_history_page(
        &self,
        user_id: Uuid,
        timetable_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> AppResult<HistoryPage> {
        // ページ指定の誤りは読み込み前に弾く
        if page == 0 || page_size == 0 {
            return Err(AppError::ValidationError(
                "page: Page and page size must be 1 or greater".to_string(),
            ));
        }
        let timetable = self.load_current(user_id, timetable_id).await?;
        timetable.history_page(page, page_size)
    }

    pub async fn create_timetable(
        &self,
        user_id: Uuid,
        input: NewTimetable,
    ) -> AppResult<TimetableAggregate> {
        let name = normalize_name(&input.name)?;
        if self.store.name_exists(user_id, &name, None).await? {
            return Err(AppError::Conflict(format!(
                "A timetable named '{}' already exists",
                name
            )));
        }

        // 最初のタイムテーブルは常にアクティブにする
        let has_active = self.store.find_active(user_id).await?.is_some();
        let input = NewTimetable {
            name,
            description: normalize_optional_text(input.description),
            is_active: input.is_active || !has_active,
            catalog: input.catalog,
        };

        let timetable = TimetableAggregate::create(
            self.ids.new_id(),
            user_id,
            input,
            self.clock.as_ref(),
            self.ids.as_ref(),
        );

        let saved = if timetable.is_active {
            self.store.save_active(&timetable).await?
        } else {
            self.store.save(&timetable).await?
        };

        info!(
            user_id = %user_id,
            timetable_id = %saved.id,
            is_active = saved.is_active,
            "Timetable created"
        );
        Ok(saved)
    }

    pub async fn update_timetable(
        &self,
        user_id: Uuid,
        timetable_id: Uuid,
        changes: TimetableChanges,
    ) -> AppResult<TimetableAggregate> {
        if changes.is_empty() {
            return Err(AppError::ValidationError(
                "At least one of name, description or isActive must be provided".to_string(),
            ));
        }

        let mut timetable = self.load_for_update(user_id, timetable_id).await?;

        if let Some(name) = &changes.name {
            let name = normalize_name(name)?;
            if name != timetable.name {
                if self
                    .store
                    .name_exists(user_id, &name, Some(timetable_id))
                    .await?
                {
                    return Err(AppError::Conflict(format!(
                        "A timetable named '{}' already exists",
                        name
                    )));
                }
                timetable.rename(name, self.clock.timestamp());
            }
        }

        if changes.description.is_some() {
            timetable.set_description(
                normalize_optional_text(changes.description),
                self.clock.timestamp(),
            );
        }

        let saved = match changes.is_active {
            Some(true) => {
                timetable.set_active(true, self.clock.timestamp());
                self.store.save_active(&timetable).await?
            }
            Some(false) if timetable.is_active => {
                return Err(AppError::ValidationError(
                    "isActive: Activate another timetable instead of deactivating the active one"
                        .to_string(),
                ));
            }
            _ => self.store.save(&timetable).await?,
        };

        info!(user_id = %user_id, timetable_id = %timetable_id, "Timetable updated");
        Ok(saved)
    }

    pub async fn delete_timetable(&self, user_id: Uuid, timetable_id: Uuid) -> AppResult<()> {
        let target = self.store.load(timetable_id, user_id).await?;
        let others: Vec<TimetableAggregate> = self
            .store
            .list_by_user(user_id)
            .await?
            .into_iter()
            .filter(|timetable| timetable.id != timetable_id)
            .collect();

        if others.is_empty() {
            return Err(AppError::ValidationError(
                "Cannot delete the last remaining timetable".to_string(),
            ));
        }

        if target.is_active {
            if let Some(mut successor) = others.into_iter().next() {
                successor.set_active(true, self.clock.timestamp());
                let successor = self.store.save_active(&successor).await?;
                info!(
                    user_id = %user_id,
                    timetable_id = %successor.id,
                    "Timetable activated after deleting the active one"
                );
            }
        }

        self.store.delete(timetable_id).await?;
        info!(user_id = %user_id, timetable_id = %timetable_id, "Timetable deleted");
        Ok(())
    }

    /// ユーザーの全カタログのカテゴリ（重複なし、昇順）
    pub async fn list_categories(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        let timetables = self.store.list_by_user(user_id).await?;
        let categories: BTreeSet<String> = timetables
            .iter()
            .flat_map(|timetable| timetable.categories())
            .map(str::to_string)
            .collect();
        Ok(categories.into_iter().collect())
    }
}
