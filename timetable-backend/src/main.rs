// src/main.rs
use migration::{Migrator, MigratorTrait};
use std::error::Error;
use std::sync::Arc;
use timetable_backend::api::{app_router, AppState};
use timetable_backend::config::{AppConfig, StoreBackend};
use timetable_backend::db::{create_db_pool, create_db_pool_with_schema, create_schema, schema_exists, DbPool};
use timetable_backend::logging::init_tracing;
use timetable_backend::repository::{InMemoryTimetableStore, TimetableRepository, TimetableStore};
use timetable_backend::service::timetable_service::TimetableService;
use tokio::net::TcpListener;

async fn connect_database(config: &AppConfig) -> Result<DbPool, Box<dyn Error>> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or("DATABASE_URL must be set when STORE_BACKEND=postgres")?;

    let db_pool = match &config.database_schema {
        Some(schema) => {
            tracing::info!("Using schema: {}", schema);

            // スキーマがなければ作成してから、スキーマ指定のプールを作る
            let base_pool = create_db_pool(database_url).await?;
            if !schema_exists(&base_pool, schema).await? {
                tracing::info!("Schema does not exist, creating it: {}", schema);
                create_schema(&base_pool, schema).await?;
            }
            base_pool.close().await?;

            create_db_pool_with_schema(database_url, schema).await?
        }
        None => create_db_pool(database_url).await?,
    };

    tracing::info!("Database pool created successfully.");

    if config.auto_migrate {
        Migrator::up(&db_pool, None).await?;
        tracing::info!("Database migrations applied.");
    }

    Ok(db_pool)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    tracing::info!("Starting Timetable Backend server...");

    let app_config = AppConfig::from_env()?;
    tracing::info!(
        environment = %app_config.environment,
        store_backend = ?app_config.store_backend,
        "Configuration loaded"
    );

    let store: Arc<dyn TimetableStore> = match app_config.store_backend {
        StoreBackend::Postgres => {
            let db_pool = connect_database(&app_config).await?;
            Arc::new(TimetableRepository::new(db_pool))
        }
        StoreBackend::Memory => {
            if app_config.is_production() {
                tracing::warn!("In-memory store is not persistent; data is lost on restart");
            }
            Arc::new(InMemoryTimetableStore::new())
        }
    };

    let timetable_service = Arc::new(TimetableService::with_system_clock(store));
    let app_state = AppState::new(timetable_service, &app_config);
    let router = app_router(app_state);

    let addr = app_config.server_addr();
    tracing::info!("Router configured. Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
