//! Cache (Redis) connection.

use redis::aio::MultiplexedConnection;

use crate::config::RedisConfig;

/// Opens a multiplexed connection and confirms the server answers `PING`.
pub async fn connect(config: &RedisConfig) -> Result<MultiplexedConnection, redis::RedisError> {
    let client = redis::Client::open(config.url.as_str())?;
    let mut connection = client.get_multiplexed_async_connection().await?;

    let pong: String = redis::cmd("PING").query_async(&mut connection).await?;
    tracing::debug!(reply = %pong, "Redis answered ping");

    Ok(connection)
}
