// src/config.rs
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

/// タイムテーブルの保存先
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(format!("Invalid STORE_BACKEND value: {}", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub store_backend: StoreBackend,
    /// `store_backend` が Postgres のときのみ必須
    pub database_url: Option<String>,
    pub database_schema: Option<String>,
    pub auto_migrate: bool,
    pub history_page_size_max: u64,
}

pub const DEFAULT_HISTORY_PAGE_SIZE_MAX: u64 = 100;

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(format!("Invalid {} value", key)),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok(); // .env ファイルがなくてもエラーにしない

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let store_backend: StoreBackend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err("DATABASE_URL must be set when STORE_BACKEND=postgres".to_string());
        }

        let history_page_size_max: u64 = env::var("HISTORY_PAGE_SIZE_MAX")
            .unwrap_or_else(|_| DEFAULT_HISTORY_PAGE_SIZE_MAX.to_string())
            .parse()
            .map_err(|_| "Invalid HISTORY_PAGE_SIZE_MAX value")?;
        if history_page_size_max == 0 {
            return Err("HISTORY_PAGE_SIZE_MAX must be 1 or greater".to_string());
        }

        Ok(Self {
            environment,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| "Invalid PORT value")?,
            cors_allowed_origins: parse_origins(
                &env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            ),
            store_backend,
            database_url,
            database_schema: env::var("DB_SCHEMA").ok().filter(|s| !s.trim().is_empty()),
            auto_migrate: parse_bool(
                "AUTO_MIGRATE",
                &env::var("AUTO_MIGRATE").unwrap_or_else(|_| "true".to_string()),
            )?,
            history_page_size_max,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// テスト用の設定（メモリ上の保存先を使う）
    pub fn for_testing() -> Self {
        Self {
            environment: "test".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_allowed_origins: vec!["http://localhost:3001".to_string()],
            store_backend: StoreBackend::Memory,
            database_url: None,
            database_schema: None,
            auto_migrate: false,
            history_page_size_max: DEFAULT_HISTORY_PAGE_SIZE_MAX,
        }
    }
}
