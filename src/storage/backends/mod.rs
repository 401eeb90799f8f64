pub mod blob_storage;
pub mod memory;
pub mod redis;
pub mod scylladb;

mod register;

pub use register::{CacheBackendConfig, ObjectBackendConfig, TableBackendConfig};
