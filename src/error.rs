use poem::http::StatusCode;
use thiserror::Error;
use tracing::error;

use crate::models::ResourceKind;

/// A request carried a field the server could not coerce into the
/// record's typed form. These never reach the stores.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("field `{0}` must be a number")]
    InvalidNumber(&'static str),

    #[error("field `{0}` must be `true` or `false`")]
    InvalidBool(&'static str),

    #[error("an image file is required")]
    MissingImage,

    #[error("failed to read the uploaded file: {0}")]
    UnreadableUpload(std::io::Error),
}

/// Failures raised by the image variant pipeline.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The uploaded bytes are not a decodable image.
    #[error("image bytes could not be decoded: {0}")]
    Processing(#[from] image::ImageError),

    /// A variant failed to reach object storage. Variants uploaded
    /// earlier in the same call have been rolled back (best effort).
    #[error("variant upload failed for `{key}`: {cause}")]
    Upload { key: String, cause: anyhow::Error },
}

/// Failures raised by the write-through store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("primary table write failed: {0}")]
    PrimaryWrite(anyhow::Error),

    #[error("primary table read failed: {0}")]
    PrimaryRead(anyhow::Error),

    /// The primary write committed but the cache could not be brought
    /// in line, even after a retry and an invalidation attempt.
    #[error("cache write failed after primary commit: {0}")]
    CacheWrite(anyhow::Error),

    #[error("no {} found with id `{id}`", .kind.singular())]
    NotFound { kind: ResourceKind, id: String },
}

impl StoreError {
    pub fn not_found(kind: ResourceKind, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<FormError> for poem::Error {
    fn from(e: FormError) -> Self {
        poem::Error::from_string(e.to_string(), StatusCode::BAD_REQUEST)
    }
}

impl From<ImageError> for poem::Error {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::Processing(_) => {
                poem::Error::from_string(e.to_string(), StatusCode::BAD_REQUEST)
            }
            ImageError::Upload { .. } => {
                error!(error = %e, "image variant upload failed");
                poem::Error::from_string(
                    "image upload failed".to_string(),
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
            }
        }
    }
}

impl From<StoreError> for poem::Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => {
                poem::Error::from_string(e.to_string(), StatusCode::NOT_FOUND)
            }
            other => {
                error!(error = %other, "storage operation failed");
                poem::Error::from_string(
                    "storage operation failed".to_string(),
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
            }
        }
    }
}
