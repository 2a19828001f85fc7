// src/repository/timetable_repository.rs
use crate::domain::timetable::TimetableAggregate;
use crate::domain::timetable_model::{self, ActiveModel as TimetableActiveModel, Entity as TimetableEntity};
use crate::error::{AppError, AppResult};
use crate::repository::timetable_store::TimetableStore;
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DbConn, DbErr, PaginatorTrait, QueryFilter, QueryOrder,
    Set, SqlErr, TransactionTrait,
};
use tracing::{debug, error};
use uuid::Uuid;

/// PostgreSQL 上の `timetables` テーブルを使う保存先
pub struct TimetableRepository {
    db: DbConn,
}

impl TimetableRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn count_for_user(&self, user_id: Uuid) -> Result<u64, DbErr> {
        TimetableEntity::find()
            .filter(timetable_model::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
    }
}

fn to_aggregate(model: timetable_model::Model) -> AppResult<TimetableAggregate> {
    let decode_error = |field: &str, e: serde_json::Error| {
        error!(timetable_id = %model.id, field, error = %e, "Failed to decode timetable column");
        AppError::InternalServerError(format!("Corrupted timetable column '{}'", field))
    };

    let catalog = serde_json::from_value(model.catalog.clone())
        .map_err(|e| decode_error("catalog", e))?;
    let current_week = serde_json::from_value(model.current_week.clone())
        .map_err(|e| decode_error("current_week", e))?;
    let history = serde_json::from_value(model.history.clone())
        .map_err(|e| decode_error("history", e))?;

    Ok(TimetableAggregate::restore(
        model.id,
        model.user_id,
        model.name,
        model.description,
        model.is_active,
        catalog,
        current_week,
        history,
        model.version,
        model.created_at,
        model.updated_at,
    ))
}

fn to_active_model(aggregate: &TimetableAggregate, version: i32) -> AppResult<TimetableActiveModel> {
    let encode = |value: serde_json::Result<serde_json::Value>| {
        value.map_err(|e| AppError::InternalServerError(format!("Failed to encode timetable: {}", e)))
    };

    Ok(TimetableActiveModel {
        id: Set(aggregate.id),
        user_id: Set(aggregate.user_id),
        name: Set(aggregate.name.clone()),
        description: Set(aggregate.description.clone()),
        is_active: Set(aggregate.is_active),
        catalog: Set(encode(serde_json::to_value(aggregate.catalog()))?),
        current_week: Set(encode(serde_json::to_value(aggregate.current_week()))?),
        history: Set(encode(serde_json::to_value(aggregate.history()))?),
        version: Set(version),
        created_at: Set(aggregate.created_at),
        updated_at: Set(aggregate.updated_at),
    })
}

fn map_write_error(err: DbErr, aggregate: &TimetableAggregate) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(format!(
            "A timetable named '{}' already exists",
            aggregate.name
        )),
        _ => AppError::DbErr(err),
    }
}

async fn deactivate_others<C>(conn: &C, user_id: Uuid, keep_id: Uuid) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let result = TimetableEntity::update_many()
        .col_expr(timetable_model::Column::IsActive, Expr::value(false))
        .col_expr(
            timetable_model::Column::Version,
            Expr::col(timetable_model::Column::Version).add(1),
        )
        .filter(timetable_model::Column::UserId.eq(user_id))
        .filter(timetable_model::Column::Id.ne(keep_id))
        .filter(timetable_model::Column::IsActive.eq(true))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

async fn write_aggregate<C>(conn: &C, aggregate: &TimetableAggregate) -> AppResult<TimetableAggregate>
where
    C: ConnectionTrait,
{
    let next_version = aggregate.version + 1;
    let active_model = to_active_model(aggregate, next_version)?;

    if aggregate.version == 0 {
        let model = active_model
            .insert(conn)
            .await
            .map_err(|e| map_write_error(e, aggregate))?;
        return to_aggregate(model);
    }

    // 読み込んだ時点の version と一致する場合のみ更新する
    let result = TimetableEntity::update_many()
        .set(active_model)
        .filter(timetable_model::Column::Id.eq(aggregate.id))
        .filter(timetable_model::Column::Version.eq(aggregate.version))
        .exec(conn)
        .await
        .map_err(|e| map_write_error(e, aggregate))?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(format!(
            "Timetable {} was modified concurrently",
            aggregate.id
        )));
    }

    let mut saved = aggregate.clone();
    saved.version = next_version;
    Ok(saved)
}

#[async_trait]
impl TimetableStore for TimetableRepository {
    async fn load(&self, id: Uuid, user_id: Uuid) -> AppResult<TimetableAggregate> {
        let model = TimetableEntity::find_by_id(id)
            .filter(timetable_model::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Timetable with id {} not found", id)))?;
        to_aggregate(model)
    }

    async fn find_active(&self, user_id: Uuid) -> AppResult<Option<TimetableAggregate>> {
        TimetableEntity::find()
            .filter(timetable_model::Column::UserId.eq(user_id))
            .filter(timetable_model::Column::IsActive.eq(true))
            .order_by_asc(timetable_model::Column::CreatedAt)
            .one(&self.db)
            .await?
            .map(to_aggregate)
            .transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<TimetableAggregate>> {
        TimetableEntity::find()
            .filter(timetable_model::Column::UserId.eq(user_id))
            .order_by_asc(timetable_model::Column::CreatedAt)
            .order_by_asc(timetable_model::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_aggregate)
            .collect()
    }

    async fn name_exists(
        &self,
        user_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<bool> {
        let mut query = TimetableEntity::find()
            .filter(timetable_model::Column::UserId.eq(user_id))
            .filter(timetable_model::Column::Name.eq(name));
        if let Some(exclude_id) = exclude {
            query = query.filter(timetable_model::Column::Id.ne(exclude_id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    async fn save(&self, aggregate: &TimetableAggregate) -> AppResult<TimetableAggregate> {
        write_aggregate(&self.db, aggregate).await
    }

    async fn deactivate_all_except(&self, user_id: Uuid, keep_id: Uuid) -> AppResult<u64> {
        Ok(deactivate_others(&self.db, user_id, keep_id).await?)
    }

    async fn save_active(&self, aggregate: &TimetableAggregate) -> AppResult<TimetableAggregate> {
        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin transaction");
            AppError::DbErr(e)
        })?;

        let deactivated = deactivate_others(&txn, aggregate.user_id, aggregate.id).await?;
        let saved = write_aggregate(&txn, aggregate).await?;

        txn.commit().await?;
        debug!(
            timetable_id = %aggregate.id,
            deactivated,
            "Timetable activated exclusively"
        );
        Ok(saved)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = TimetableEntity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "Timetable with id {} not found",
                id
            )));
        }
        Ok(())
    }
}
