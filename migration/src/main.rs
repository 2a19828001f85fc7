// migration/src/main.rs
use migration::Migrator;
use sea_orm_migration::prelude::*;

// async-std ランタイムで sea-orm-migration の CLI を実行する
#[async_std::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
