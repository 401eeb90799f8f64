//! In-process backends used for tests and local development.

use std::sync::RwLock;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use hashbrown::HashMap;

use crate::storage::template::{CacheStore, ObjectStore, TableStore};

pub struct MemoryTableStore {
    tables: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl Default for MemoryTableStore {
    fn default() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn put(&self, table: &str, id: &str, record: String) -> Result<()> {
        self.tables
            .write()
            .expect("lock poisoned")
            .entry(table.to_string())
            .or_default()
            .insert(id.to_string(), record);
        Ok(())
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<String>> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables.get(table).and_then(|t| t.get(id)).cloned())
    }

    async fn scan(&self, table: &str) -> Result<Vec<String>> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables
            .get(table)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<()> {
        if let Some(t) = self
            .tables
            .write()
            .expect("lock poisoned")
            .get_mut(table)
        {
            t.remove(id);
        }
        Ok(())
    }
}

pub struct MemoryCacheStore {
    cache: moka::sync::Cache<String, String>,
}

impl MemoryCacheStore {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let cache = moka::sync::Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(600))
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.cache.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.cache.get(&key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(&key.to_string());
        Ok(())
    }
}

pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> Result<()> {
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), data);
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.objects.read().expect("lock poisoned").get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.write().expect("lock poisoned").remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{}", key)
    }
}
