// migration/src/lib.rs
pub use sea_orm_migration::prelude::*;

// タイムテーブル関連マイグレーション
mod m20250801_000001_create_timetables_table;
mod m20250801_000002_add_timetable_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            // 1. 基本テーブル作成
            Box::new(m20250801_000001_create_timetables_table::Migration),
            // 2. インデックス追加
            Box::new(m20250801_000002_add_timetable_indexes::Migration),
        ]
    }
}
