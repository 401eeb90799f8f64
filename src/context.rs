use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::RuntimeConfig;
use crate::storage::template::{CacheStore, ObjectStore, TableStore};

/// The store handles every handler works through.
///
/// Connected once at startup and injected explicitly so tests can
/// substitute in-memory backends.
pub struct StorageContext {
    pub tables: Arc<dyn TableStore>,
    pub cache: Arc<dyn CacheStore>,
    pub objects: Arc<dyn ObjectStore>,
}

impl StorageContext {
    pub async fn connect(cfg: &RuntimeConfig) -> Result<Self> {
        let tables = cfg.tables.connect().await?;
        info!("primary table store connected");

        let cache = cfg.cache.connect().await?;
        info!("cache connected");

        let objects = cfg.objects.connect().await?;
        info!("object storage connected");

        Ok(Self {
            tables,
            cache,
            objects,
        })
    }
}
