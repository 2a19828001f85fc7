// timetable-backend/src/domain/timetable_model.rs
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `timetables` テーブル。カタログ・現在の週・履歴は JSONB で丸ごと保存する
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "timetables")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub is_active: bool,
    #[sea_orm(column_type = "JsonBinary")]
    pub catalog: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub current_week: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub history: Json,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// created_at / updated_at は集約側で注入された時計から設定する
impl ActiveModelBehavior for ActiveModel {}
