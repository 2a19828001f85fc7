// src/db.rs
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

fn connect_options(database_url: &str) -> ConnectOptions {
    let mut opt = ConnectOptions::new(database_url.to_string());
    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .max_lifetime(Duration::from_secs(8 * 60))
        .sqlx_logging(false);
    opt
}

pub async fn create_db_pool(database_url: &str) -> Result<DbPool, DbErr> {
    Database::connect(connect_options(database_url)).await
}

// スキーマを指定して接続する。プールの全接続に search_path が設定される
pub async fn create_db_pool_with_schema(database_url: &str, schema: &str) -> Result<DbPool, DbErr> {
    let mut opt = connect_options(database_url);
    opt.set_schema_search_path(schema.to_string());
    Database::connect(opt).await
}

pub async fn schema_exists(conn: &DbPool, schema: &str) -> Result<bool, DbErr> {
    let result_opt = conn
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1);",
            [schema.into()],
        ))
        .await?;

    // 結果がない場合は false とみなす
    match result_opt {
        Some(result) => result.try_get("", "exists"),
        None => Ok(false),
    }
}

pub async fn create_schema(conn: &DbPool, schema: &str) -> Result<(), DbErr> {
    let create_schema = format!("CREATE SCHEMA IF NOT EXISTS \"{}\";", schema.replace('"', ""));
    conn.execute(Statement::from_string(
        sea_orm::DatabaseBackend::Postgres,
        create_schema,
    ))
    .await?;
    Ok(())
}
