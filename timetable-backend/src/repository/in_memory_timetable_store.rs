// src/repository/in_memory_timetable_store.rs

use crate::domain::timetable::TimetableAggregate;
use crate::error::{AppError, AppResult};
use crate::repository::timetable_store::TimetableStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// プロセス内のメモリに保持する保存先（開発・テスト用）
#[derive(Clone, Default)]
pub struct InMemoryTimetableStore {
    timetables: Arc<RwLock<HashMap<Uuid, TimetableAggregate>>>,
}

impl InMemoryTimetableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.timetables.read().await.len()
    }
}

fn write_locked(
    timetables: &mut HashMap<Uuid, TimetableAggregate>,
    aggregate: &TimetableAggregate,
) -> AppResult<TimetableAggregate> {
    let name_taken = timetables.values().any(|existing| {
        existing.user_id == aggregate.user_id
            && existing.id != aggregate.id
            && existing.name == aggregate.name
    });
    if name_taken {
        return Err(AppError::Conflict(format!(
            "A timetable named '{}' already exists",
            aggregate.name
        )));
    }

    match timetables.get(&aggregate.id) {
        None if aggregate.version == 0 => {}
        Some(stored) if stored.version == aggregate.version && aggregate.version > 0 => {}
        _ => {
            return Err(AppError::Conflict(format!(
                "Timetable {} was modified concurrently",
                aggregate.id
            )));
        }
    }

    let mut saved = aggregate.clone();
    saved.version += 1;
    timetables.insert(saved.id, saved.clone());
    Ok(saved)
}

fn deactivate_locked(
    timetables: &mut HashMap<Uuid, TimetableAggregate>,
    user_id: Uuid,
    keep_id: Uuid,
) -> u64 {
    let mut deactivated = 0;
    for timetable in timetables.values_mut() {
        if timetable.user_id == user_id && timetable.id != keep_id && timetable.is_active {
            // PostgreSQL 側と同じく updated_at は変えない
            timetable.is_active = false;
            timetable.version += 1;
            deactivated += 1;
        }
    }
    deactivated
}

fn sorted_for_user(
    timetables: &HashMap<Uuid, TimetableAggregate>,
    user_id: Uuid,
) -> Vec<TimetableAggregate> {
    let mut owned: Vec<TimetableAggregate> = timetables
        .values()
        .filter(|timetable| timetable.is_owned_by(user_id))
        .cloned()
        .collect();
    owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    owned
}

#[async_trait]
impl TimetableStore for InMemoryTimetableStore {
    async fn load(&self, id: Uuid, user_id: Uuid) -> AppResult<TimetableAggregate> {
        let timetables = self.timetables.read().await;
        timetables
            .get(&id)
            .filter(|timetable| timetable.is_owned_by(user_id))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Timetable with id {} not found", id)))
    }

    async fn find_active(&self, user_id: Uuid) -> AppResult<Option<TimetableAggregate>> {
        let timetables = self.timetables.read().await;
        Ok(sorted_for_user(&timetables, user_id)
            .into_iter()
            .find(|timetable| timetable.is_active))
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<TimetableAggregate>> {
        let timetables = self.timetables.read().await;
        Ok(sorted_for_user(&timetables, user_id))
    }

    async fn name_exists(
        &self,
        user_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<bool> {
        let timetables = self.timetables.read().await;
        Ok(timetables.values().any(|timetable| {
            timetable.is_owned_by(user_id)
                && timetable.name == name
                && Some(timetable.id) != exclude
        }))
    }

    async fn save(&self, aggregate: &TimetableAggregate) -> AppResult<TimetableAggregate> {
        let mut timetables = self.timetables.write().await;
        write_locked(&mut timetables, aggregate)
    }

    async fn deactivate_all_except(&self, user_id: Uuid, keep_id: Uuid) -> AppResult<u64> {
        let mut timetables = self.timetables.write().await;
        Ok(deactivate_locked(&mut timetables, user_id, keep_id))
    }

    async fn save_active(&self, aggregate: &TimetableAggregate) -> AppResult<TimetableAggregate> {
        let mut timetables = self.timetables.write().await;

        // 書き込みが失敗したら非アクティブ化も巻き戻す
        let snapshot = timetables.clone();
        let deactivated = deactivate_locked(&mut timetables, aggregate.user_id, aggregate.id);
        match write_locked(&mut timetables, aggregate) {
            Ok(saved) => {
                debug!(timetable_id = %aggregate.id, deactivated, "Timetable activated exclusively");
                Ok(saved)
            }
            Err(e) => {
                *timetables = snapshot;
                Err(e)
            }
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut timetables = self.timetables.write().await;
        timetables
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Timetable with id {} not found", id)))
    }
}
