use std::path::Path;

use serde::Deserialize;

use crate::storage::backends::{CacheBackendConfig, ObjectBackendConfig, TableBackendConfig};

#[derive(Debug, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// The primary table store backing the catalog records.
    pub tables: TableBackendConfig,

    /// The cache records are mirrored into on every write.
    pub cache: CacheBackendConfig,

    /// The object store encoded image variants are uploaded to.
    pub objects: ObjectBackendConfig,

    #[serde(default)]
    pub presets: VariantPresets,
}

impl RuntimeConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&data)?)
    }
}

/// Dimensions for the resized renditions. The `original` variant is
/// never resized so it carries no preset.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VariantPresets {
    #[serde(default = "default_thumbnail")]
    pub thumbnail: ResizingConfig,

    #[serde(default = "default_medium")]
    pub medium: ResizingConfig,
}

impl Default for VariantPresets {
    fn default() -> Self {
        Self {
            thumbnail: default_thumbnail(),
            medium: default_medium(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResizingConfig {
    /// The width to resize the image to.
    pub width: u32,

    /// The height to resize the image to.
    pub height: u32,
}

const fn default_thumbnail() -> ResizingConfig {
    ResizingConfig {
        width: 128,
        height: 128,
    }
}

const fn default_medium() -> ResizingConfig {
    ResizingConfig {
        width: 512,
        height: 512,
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8000
}
