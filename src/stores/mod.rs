//! Datastore connections opened at startup.
//!
//! `Stores::connect_all` runs once, after the HTTP listener is bound. It opens
//! the document store, bootstraps the validated `users` collection on it, then
//! opens the relational store and the cache, in that order. Each step is
//! awaited before the next one starts and logs its own success or failure; a
//! failed store leaves its slot empty and never stops the process.

mod cache;
mod document;
mod relational;

use std::sync::OnceLock;

use mongodb::Database;
use redis::aio::MultiplexedConnection;
use sqlx::MySqlPool;

use crate::config::AppConfig;
use crate::schema::{bootstrap_collection, CollectionOutcome, ValidatedCollectionSpec};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("MySQL error: {0}")]
    MySql(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Which stores came up during `connect_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectSummary {
    pub mongo: bool,
    /// `None` when the document store never connected.
    pub collection: Option<CollectionOutcome>,
    pub mysql: bool,
    pub redis: bool,
}

/// Connected store handles, each published at most once.
#[derive(Default)]
pub struct Stores {
    mongo: OnceLock<Database>,
    mysql: OnceLock<MySqlPool>,
    redis: OnceLock<MultiplexedConnection>,
}

impl Stores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mongo(&self) -> Option<&Database> {
        self.mongo.get()
    }

    pub fn mysql(&self) -> Option<&MySqlPool> {
        self.mysql.get()
    }

    /// A clone of the multiplexed connection; clones share one socket.
    pub fn redis(&self) -> Option<MultiplexedConnection> {
        self.redis.get().cloned()
    }

    /// Opens every store in sequence, logging each result independently.
    pub async fn connect_all(
        &self,
        config: &AppConfig,
        users: &ValidatedCollectionSpec,
    ) -> ConnectSummary {
        let (mongo, collection) = match self.connect_mongo(config, users).await {
            Ok(outcome) => {
                tracing::info!("MongoDB connection opened");
                (true, Some(outcome))
            }
            Err(e) => {
                tracing::error!(error = %e, "Error opening MongoDB connection: {}", e);
                (false, None)
            }
        };

        let mysql = match self.connect_mysql(config).await {
            Ok(()) => {
                tracing::info!("MySQL connection opened");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Error opening MySQL connection: {}", e);
                false
            }
        };

        let redis = match self.connect_redis(config).await {
            Ok(()) => {
                tracing::info!("Redis connection opened");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Error opening Redis connection: {}", e);
                false
            }
        };

        ConnectSummary {
            mongo,
            collection,
            mysql,
            redis,
        }
    }

    async fn connect_mongo(
        &self,
        config: &AppConfig,
        users: &ValidatedCollectionSpec,
    ) -> Result<CollectionOutcome, StoreError> {
        tracing::info!(database = %config.mongo.database, "Connecting to MongoDB");
        let database = document::connect(&config.mongo).await?;
        let outcome = bootstrap_collection(&database, users).await;
        publish(&self.mongo, database, "MongoDB");
        Ok(outcome)
    }

    async fn connect_mysql(&self, config: &AppConfig) -> Result<(), StoreError> {
        tracing::info!(max_connections = config.mysql.max_connections, "Connecting to MySQL");
        let pool = relational::connect(&config.mysql).await?;
        publish(&self.mysql, pool, "MySQL");
        Ok(())
    }

    async fn connect_redis(&self, config: &AppConfig) -> Result<(), StoreError> {
        tracing::info!("Connecting to Redis");
        let connection = cache::connect(&config.redis).await?;
        publish(&self.redis, connection, "Redis");
        Ok(())
    }
}

/// Stores `value` in `slot` unless an earlier connect already filled it.
///
/// The first handle wins; a later one is dropped with a warning.
fn publish<T>(slot: &OnceLock<T>, value: T, store: &str) -> bool {
    match slot.set(value) {
        Ok(()) => true,
        Err(_) => {
            tracing::warn!(store, "{} already connected, dropping the new handle", store);
            false
        }
    }
}
