use std::sync::Arc;

use strum::IntoStaticStr;
use tracing::{debug, warn};

use crate::config::VariantPresets;
use crate::error::ImageError;
use crate::models::ImageVariants;
use crate::storage::template::ObjectStore;

pub mod encoder;
pub mod resizer;

/// The fixed set of renditions produced for every uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum VariantKind {
    Thumbnail,
    Medium,
    Original,
}

impl VariantKind {
    pub const ALL: [VariantKind; 3] = [
        VariantKind::Thumbnail,
        VariantKind::Medium,
        VariantKind::Original,
    ];

    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

/// Storage keys are namespaced by the identifier so repeated uploads
/// for the same record land on (and overwrite) the same objects.
fn object_key(identifier: &str, variant: VariantKind) -> String {
    format!("{}/{}.jpg", identifier, variant.as_str())
}

/// Turns raw uploaded bytes into the fixed variant set and pushes each
/// encoding to object storage.
#[derive(Clone)]
pub struct VariantGenerator {
    objects: Arc<dyn ObjectStore>,
    presets: VariantPresets,
}

impl VariantGenerator {
    pub fn new(objects: Arc<dyn ObjectStore>, presets: VariantPresets) -> Self {
        Self { objects, presets }
    }

    /// Either every variant is uploaded and the full mapping comes
    /// back, or the call fails and nothing it uploaded is left behind.
    pub async fn generate(
        &self,
        identifier: &str,
        data: Vec<u8>,
    ) -> Result<ImageVariants, ImageError> {
        let presets = self.presets;
        let encoded = tokio::task::spawn_blocking(move || {
            let resized = resizer::resize_to_variants(presets, &data)?;
            encoder::encode_variants(resized)
        })
        .await
        .expect("image processing task panicked")?;

        let mut variants = ImageVariants::with_capacity(encoded.len());
        let mut uploaded: Vec<String> = Vec::with_capacity(encoded.len());
        for variant in encoded {
            let key = object_key(identifier, variant.variant);
            debug!(key = %key, "uploading image variant");

            if let Err(e) = self
                .objects
                .put(&key, variant.buff, mime::IMAGE_JPEG.as_ref())
                .await
            {
                self.rollback(&uploaded).await;
                return Err(ImageError::Upload { key, cause: e });
            }

            variants.insert(
                variant.variant.as_str().to_string(),
                self.objects.public_url(&key),
            );
            uploaded.push(key);
        }

        Ok(variants)
    }

    async fn rollback(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.objects.delete(key).await {
                warn!(key = %key, error = %e, "failed to roll back uploaded variant");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;
    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::storage::backends::memory::MemoryObjectStore;

    pub(crate) fn test_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 40, 200]),
        ));
        let mut buff = Cursor::new(Vec::new());
        img.write_to(&mut buff, image::ImageFormat::Png)
            .expect("failed to encode test image");
        buff.into_inner()
    }

    struct FlakyObjectStore {
        inner: Arc<MemoryObjectStore>,
        fail_after: usize,
        puts: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStore for FlakyObjectStore {
        async fn put(&self, key: &str, data: Bytes, content_type: &str) -> anyhow::Result<()> {
            if self.puts.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
                return Err(anyhow!("bucket rejected the upload"));
            }
            self.inner.put(key, data, content_type).await
        }

        async fn fetch(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
            self.inner.fetch(key).await
        }

        async fn delete(&self, key: &str) -> anyhow::Result<()> {
            self.inner.delete(key).await
        }

        fn public_url(&self, key: &str) -> String {
            self.inner.public_url(key)
        }
    }

    #[tokio::test]
    async fn uploads_every_variant_under_the_identifier() {
        let objects = Arc::new(MemoryObjectStore::default());
        let generator = VariantGenerator::new(objects.clone(), VariantPresets::default());

        let variants = generator.generate("abc123", test_png(64, 64)).await.unwrap();

        assert_eq!(variants.len(), 3);
        for kind in VariantKind::ALL {
            let key = format!("abc123/{}.jpg", kind.as_str());
            assert_eq!(variants[kind.as_str()], format!("memory://{}", key));
            assert!(objects.fetch(&key).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn repeated_uploads_overwrite_the_same_keys() {
        let objects = Arc::new(MemoryObjectStore::default());
        let generator = VariantGenerator::new(objects.clone(), VariantPresets::default());

        let first = generator.generate("abc123", test_png(64, 64)).await.unwrap();
        let second = generator.generate("abc123", test_png(32, 32)).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_upload_returns_no_partial_mapping() {
        let inner = Arc::new(MemoryObjectStore::default());
        let flaky = Arc::new(FlakyObjectStore {
            inner: inner.clone(),
            fail_after: 1,
            puts: AtomicUsize::new(0),
        });
        let generator = VariantGenerator::new(flaky, VariantPresets::default());

        let err = generator
            .generate("abc123", test_png(64, 64))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::Upload { .. }));

        // The variant uploaded before the failure was rolled back.
        for kind in VariantKind::ALL {
            let key = format!("abc123/{}.jpg", kind.as_str());
            assert!(inner.fetch(&key).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn undecodable_bytes_fail_before_any_upload() {
        let objects = Arc::new(MemoryObjectStore::default());
        let generator = VariantGenerator::new(objects.clone(), VariantPresets::default());

        let err = generator
            .generate("abc123", b"not an image".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::Processing(_)));

        for kind in VariantKind::ALL {
            let key = format!("abc123/{}.jpg", kind.as_str());
            assert!(objects.fetch(&key).await.unwrap().is_none());
        }
    }
}
