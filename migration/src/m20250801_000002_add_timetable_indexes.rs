use sea_orm_migration::prelude::*;

use crate::m20250801_000001_create_timetables_table::Timetables;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ユーザーごとにタイムテーブル名は一意
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(Timetables::Table)
                    .name("idx_timetables_user_id_name")
                    .col(Timetables::UserId)
                    .col(Timetables::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // アクティブなタイムテーブルの検索用
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(Timetables::Table)
                    .name("idx_timetables_user_id_is_active")
                    .col(Timetables::UserId)
                    .col(Timetables::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .name("idx_timetables_user_id_is_active")
                    .table(Timetables::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .name("idx_timetables_user_id_name")
                    .table(Timetables::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
