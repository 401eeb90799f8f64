use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use serde::Deserialize;
use tracing::debug;

use crate::storage::template::ObjectStore;

#[derive(Debug, Clone, Deserialize)]
pub struct BlobStorageConfig {
    /// The bucket name.
    pub name: String,

    pub region: String,

    pub endpoint: String,

    /// Base URL variants are served under, e.g. a CDN in front of
    /// the bucket.
    pub public_url: String,

    pub access_key: Option<String>,

    pub secret_key: Option<String>,

    pub security_token: Option<String>,

    pub session_token: Option<String>,

    pub request_timeout_secs: Option<u64>,
}

pub struct BlobStorageBackend {
    bucket: Bucket,
    public_url: String,
}

impl BlobStorageBackend {
    pub fn new(cfg: &BlobStorageConfig) -> Result<Self> {
        let creds = Credentials::new(
            cfg.access_key.as_deref(),
            cfg.secret_key.as_deref(),
            cfg.security_token.as_deref(),
            cfg.session_token.as_deref(),
            None,
        )?;
        let region = Region::Custom {
            region: cfg.region.clone(),
            endpoint: cfg.endpoint.clone(),
        };
        let mut bucket = Bucket::new(&cfg.name, region, creds)?;
        bucket.set_request_timeout(cfg.request_timeout_secs.map(Duration::from_secs));

        Ok(Self {
            bucket,
            public_url: cfg.public_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for BlobStorageBackend {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        debug!("storing object in bucket @ {}", key);
        let (_, code) = self
            .bucket
            .put_object_with_content_type(key, &data, content_type)
            .await?;
        if code != 200 {
            Err(anyhow!(
                "Remote storage bucket did not respond correctly, expected status 200 got {}",
                code
            ))
        } else {
            Ok(())
        }
    }

    async fn fetch(&self, key: &str) -> Result<Option<Bytes>> {
        debug!("retrieving object in bucket @ {}", key);
        let (data, code) = self.bucket.get_object(key).await?;
        if code == 404 {
            Ok(None)
        } else if code != 200 {
            Err(anyhow!(
                "Remote storage bucket did not respond correctly, expected status 200 got {}",
                code
            ))
        } else {
            Ok(Some(data.into()))
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        debug!("purging object in bucket @ {}", key);
        let (_, code) = self.bucket.delete_object(key).await?;
        if code != 200 && code != 204 && code != 404 {
            return Err(anyhow!(
                "Remote storage bucket did not respond correctly, expected status 204 got {}",
                code
            ));
        }

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}
