use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::error::StoreError;
use crate::models::{ResourceKind, StoreRecord};
use crate::storage::template::{CacheStore, TableStore};

/// The dual-write adapter keeping the primary table store and the
/// cache in step.
///
/// Every write goes to the primary store first; the cache is only
/// touched once the primary write has committed. The stores offer no
/// cross-store transaction, so a failed cache write after a committed
/// primary write is surfaced to the caller as an error: the cache
/// entry is retried once and then invalidated rather than left stale.
#[derive(Clone)]
pub struct WriteThroughStore {
    tables: Arc<dyn TableStore>,
    cache: Arc<dyn CacheStore>,
}

impl WriteThroughStore {
    pub fn new(tables: Arc<dyn TableStore>, cache: Arc<dyn CacheStore>) -> Self {
        Self { tables, cache }
    }

    /// Persists the record to the primary table, then mirrors the
    /// same serialized form into the cache.
    ///
    /// A `put` is a full replace: fields absent from `record` are
    /// absent afterwards, regardless of what was stored before.
    pub async fn save<R: StoreRecord>(&self, record: &R) -> Result<(), StoreError> {
        let table = R::KIND.table();
        let payload =
            serde_json::to_string(record).map_err(|e| StoreError::PrimaryWrite(e.into()))?;

        self.tables
            .put(table, record.id(), payload.clone())
            .await
            .map_err(StoreError::PrimaryWrite)?;
        debug!(table = table, id = record.id(), "primary write committed");

        let key = R::KIND.cache_key(record.id());
        if let Err(first) = self.cache.set(&key, payload.clone()).await {
            warn!(key = %key, error = %first, "cache write failed after primary commit, retrying");

            if let Err(second) = self.cache.set(&key, payload).await {
                // The entry may now be stale. Drop it rather than
                // serve the old record until the TTL fires.
                if let Err(e) = self.cache.delete(&key).await {
                    error!(key = %key, error = %e, "failed to invalidate cache entry");
                }
                return Err(StoreError::CacheWrite(second));
            }
        }

        Ok(())
    }

    pub async fn get<R: StoreRecord>(&self, id: &str) -> Result<Option<R>, StoreError> {
        let raw = self
            .tables
            .get(R::KIND.table(), id)
            .await
            .map_err(StoreError::PrimaryRead)?;

        raw.map(|r| serde_json::from_str(&r))
            .transpose()
            .map_err(|e| StoreError::PrimaryRead(e.into()))
    }

    pub async fn fetch<R: StoreRecord>(&self, id: &str) -> Result<R, StoreError> {
        self.get(id)
            .await?
            .ok_or_else(|| StoreError::not_found(R::KIND, id))
    }

    pub async fn list<R: StoreRecord>(&self) -> Result<Vec<R>, StoreError> {
        let rows = self
            .tables
            .scan(R::KIND.table())
            .await
            .map_err(StoreError::PrimaryRead)?;

        rows.iter()
            .map(|r| serde_json::from_str(r).map_err(|e| StoreError::PrimaryRead(e.into())))
            .collect()
    }

    /// Removes the record from the primary store, then from the cache.
    /// Deleting an id that never existed succeeds silently.
    pub async fn delete(&self, kind: ResourceKind, id: &str) -> Result<(), StoreError> {
        self.tables
            .delete(kind.table(), id)
            .await
            .map_err(StoreError::PrimaryWrite)?;

        let key = kind.cache_key(id);
        if let Err(first) = self.cache.delete(&key).await {
            warn!(key = %key, error = %first, "cache delete failed after primary delete, retrying");
            self.cache
                .delete(&key)
                .await
                .map_err(StoreError::CacheWrite)?;
        }

        Ok(())
    }
}
