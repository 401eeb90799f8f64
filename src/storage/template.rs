use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// The primary, authoritative record store.
///
/// Records are stored as their canonical JSON serialization keyed by
/// record id. A `put` is a full replace of whatever was stored before.
#[async_trait]
pub trait TableStore: Send + Sync + 'static {
    async fn put(&self, table: &str, id: &str, record: String) -> Result<()>;

    async fn get(&self, table: &str, id: &str) -> Result<Option<String>>;

    /// Full unpaginated scan of a table.
    async fn scan(&self, table: &str) -> Result<Vec<String>>;

    /// Deleting a missing id is not an error.
    async fn delete(&self, table: &str, id: &str) -> Result<()>;
}

/// The secondary fast-lookup store mirroring primary-store content.
///
/// Entries expire on a backend-configured TTL as a safety net against
/// stale values left behind by a failed dual-write.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    async fn set(&self, key: &str, value: String) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Blob storage for encoded image variants.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<()>;

    async fn fetch(&self, key: &str) -> Result<Option<Bytes>>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// The URL the object resolves at for the outside world.
    fn public_url(&self, key: &str) -> String;
}
