//! Test database setup
#![allow(dead_code)]

use robosust::app_config::DatabaseConfig;
use sea_orm::{DatabaseConnection, DbErr};

/// Fresh in-memory SQLite database with the full schema.
///
/// Every call returns an isolated database, so tests need no cleanup and can
/// run in parallel.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    robosust::db::init_db("sqlite::memory:", &DatabaseConfig::default()).await
}
