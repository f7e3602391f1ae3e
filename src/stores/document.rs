//! Document store (MongoDB) connection.

use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

use crate::config::MongoConfig;

/// Connects to MongoDB and confirms the deployment answers a `ping`.
pub async fn connect(config: &MongoConfig) -> Result<Database, mongodb::error::Error> {
    let mut options = ClientOptions::parse(config.uri.as_str()).await?;
    options.app_name = Some(config.app_name.clone());
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_seconds));

    let client = Client::with_options(options)?;
    let database = client.database(&config.database);
    database.run_command(doc! { "ping": 1 }).await?;

    tracing::debug!(database = %config.database, "MongoDB answered ping");
    Ok(database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_uri_fails_before_connecting() {
        let config = MongoConfig {
            uri: "not-a-mongodb-uri".to_string(),
            ..MongoConfig::default()
        };
        assert!(connect(&config).await.is_err());
    }

    // Run with: MONGO_URI=mongodb://localhost:27017 cargo test -- --ignored
    #[tokio::test]
    #[ignore = "requires MongoDB"]
    async fn test_connects_to_live_server() {
        let config = MongoConfig {
            uri: std::env::var("MONGO_URI").expect("MONGO_URI required"),
            ..MongoConfig::default()
        };
        connect(&config).await.expect("connection failed");
    }
}
