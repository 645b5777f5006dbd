//! Migration runner.
//!
//! Wraps the sea-orm-migration CLI around the crate's embedded migrator, so
//! `migration up`, `migration down`, `migration status` and `migration fresh`
//! all work against `DATABASE_URL`. When `DATABASE_URL` is unset the value is
//! taken from the layered application config.

use tradedesk_api::{config, migrator::Migrator};

#[tokio::main]
async fn main() {
    if std::env::var("DATABASE_URL").is_err() {
        match config::load_config() {
            Ok(cfg) => std::env::set_var("DATABASE_URL", cfg.database_url()),
            Err(e) => eprintln!("config not loaded ({}); expecting DATABASE_URL", e),
        }
    }

    sea_orm_migration::cli::run_cli(Migrator).await;
}
