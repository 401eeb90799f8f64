use std::sync::Arc;

use serde::Deserialize;

use crate::storage::backends::blob_storage::{BlobStorageBackend, BlobStorageConfig};
use crate::storage::backends::memory::{MemoryCacheStore, MemoryObjectStore, MemoryTableStore};
use crate::storage::backends::redis::{RedisCacheStore, RedisConfig};
use crate::storage::backends::scylladb::{ScyllaConfig, ScyllaTableStore};
use crate::storage::template::{CacheStore, ObjectStore, TableStore};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "config")]
pub enum TableBackendConfig {
    Scylla(ScyllaConfig),
    Memory,
}

impl TableBackendConfig {
    pub async fn connect(&self) -> anyhow::Result<Arc<dyn TableStore>> {
        match self {
            Self::Scylla(cfg) => Ok(Arc::new(ScyllaTableStore::connect(cfg.clone()).await?)),
            Self::Memory => Ok(Arc::new(MemoryTableStore::default())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "config")]
pub enum CacheBackendConfig {
    Redis(RedisConfig),
    Memory,
}

impl CacheBackendConfig {
    pub async fn connect(&self) -> anyhow::Result<Arc<dyn CacheStore>> {
        match self {
            Self::Redis(cfg) => Ok(Arc::new(RedisCacheStore::connect(cfg.clone()).await?)),
            Self::Memory => Ok(Arc::new(MemoryCacheStore::default())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "config")]
pub enum ObjectBackendConfig {
    Blob(BlobStorageConfig),
    Memory,
}

impl ObjectBackendConfig {
    pub async fn connect(&self) -> anyhow::Result<Arc<dyn ObjectStore>> {
        match self {
            Self::Blob(cfg) => Ok(Arc::new(BlobStorageBackend::new(cfg)?)),
            Self::Memory => Ok(Arc::new(MemoryObjectStore::default())),
        }
    }
}
