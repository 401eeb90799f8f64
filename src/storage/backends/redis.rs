use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::Deserialize;

use crate::storage::template::CacheStore;

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub connection_uri: String,

    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Seconds before a cached record expires on its own.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: usize,
}

const fn default_pool_size() -> usize {
    4
}

const fn default_ttl_secs() -> usize {
    600
}

struct RedisPool {
    connections: Vec<ConnectionManager>,
    index: AtomicUsize,
}

impl RedisPool {
    async fn connect(uri: &str, pool_size: usize) -> Result<Self> {
        let client = redis::Client::open(uri)?;
        let mut connections = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            connections.push(client.get_tokio_connection_manager().await?);
        }

        Ok(Self {
            connections,
            index: AtomicUsize::new(0),
        })
    }

    fn get(&self) -> ConnectionManager {
        let index = self.index.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        self.connections[index].clone()
    }
}

pub struct RedisCacheStore {
    pool: RedisPool,
    ttl: usize,
}

impl RedisCacheStore {
    pub async fn connect(cfg: RedisConfig) -> Result<Self> {
        let pool = RedisPool::connect(&cfg.connection_uri, cfg.pool_size).await?;

        Ok(Self {
            pool,
            ttl: cfg.ttl_secs,
        })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut conn = self.pool.get();
        let _: () = conn.set_ex(key, value, self.ttl).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.pool.get();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.pool.get();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
