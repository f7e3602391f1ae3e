//! Relational store (MySQL) connection pool.

use std::time::Duration;

use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;

use crate::config::MySqlConfig;

/// Creates a MySQL pool; `connect` opens the first connection eagerly.
pub async fn connect(config: &MySqlConfig) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .connect(&config.url)
        .await
}
