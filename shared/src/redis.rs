use anyhow::Result;
use redis::{aio::MultiplexedConnection, Client};
use tracing::info;

pub type Redis = Client;

pub fn get_redis_client(redis_url: &str) -> Result<Redis> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Opens the shared multiplexed connection used for session lookups.
pub async fn get_redis_connection(redis_url: &str) -> Result<MultiplexedConnection> {
    let client = get_redis_client(redis_url)?;
    let conn = client.get_multiplexed_async_connection().await?;
    info!("Connected to redis");
    Ok(conn)
}
