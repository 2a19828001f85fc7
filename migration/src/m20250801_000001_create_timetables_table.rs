use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Timetables::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Timetables::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Timetables::UserId).uuid().not_null())
                    .col(ColumnDef::new(Timetables::Name).text().not_null())
                    .col(ColumnDef::new(Timetables::Description).text())
                    .col(
                        ColumnDef::new(Timetables::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    // 週の雛形となるアクティビティ一覧
                    .col(
                        ColumnDef::new(Timetables::Catalog)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Timetables::CurrentWeek).json_binary().not_null())
                    // 過去の週（古い順）
                    .col(
                        ColumnDef::new(Timetables::History)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    // 楽観的ロック用のバージョン
                    .col(
                        ColumnDef::new(Timetables::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Timetables::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Timetables::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Timetables::Table).to_owned())
            .await
    }
}

/// Iden Enum for the 'timetables' table and its columns
#[derive(DeriveIden)]
pub enum Timetables {
    Table,
    Id,
    UserId,
    Name,
    Description,
    IsActive,
    Catalog,
    CurrentWeek,
    History,
    Version,
    CreatedAt,
    UpdatedAt,
}
