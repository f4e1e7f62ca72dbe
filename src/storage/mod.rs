//! Object storage
//!
//! The origin reads source images from one store and writes transformed
//! variants to another. Both sit behind [`ObjectStore`] so the backend can
//! be S3, a local directory, or memory.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};

pub mod filesystem;
pub mod memory;
pub mod s3;

pub use filesystem::FilesystemObjectStore;
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object '{key}' not found")]
    NotFound { key: String },

    #[error("Invalid object key '{key}'")]
    InvalidKey { key: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Key/value blob store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object; a missing key is [`StorageError::NotFound`]
    async fn get_object(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Store an object, overwriting any existing one
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<(), StorageError>;
}

/// Source and variant stores, created once at startup
#[derive(Clone)]
pub struct Stores {
    pub originals: Arc<dyn ObjectStore>,
    pub variants: Arc<dyn ObjectStore>,
}

/// Directory names used by the filesystem backend when no bucket is set
const DEFAULT_ORIGINAL_DIR: &str = "originals";
const DEFAULT_VARIANT_DIR: &str = "variants";

/// Build the stores described by `config`
pub async fn build_stores(config: &StorageConfig) -> Result<Stores, StorageError> {
    match config.backend {
        StorageBackend::S3 => {
            let client = s3::build_client(config).await;
            tracing::info!(
                original_bucket = %config.original_bucket,
                variant_bucket = %config.variant_bucket,
                region = %config.region,
                endpoint = config.endpoint.as_deref().unwrap_or("default"),
                "Using S3 object storage"
            );
            Ok(Stores {
                originals: Arc::new(S3ObjectStore::new(
                    client.clone(),
                    config.original_bucket.clone(),
                )),
                variants: Arc::new(S3ObjectStore::new(client, config.variant_bucket.clone())),
            })
        }
        StorageBackend::Filesystem => {
            let root = config
                .root
                .as_deref()
                .ok_or_else(|| StorageError::Backend("storage.root is not set".to_string()))?;
            let dir = |bucket: &str, fallback: &str| {
                std::path::Path::new(root).join(if bucket.is_empty() { fallback } else { bucket })
            };
            let originals = dir(&config.original_bucket, DEFAULT_ORIGINAL_DIR);
            let variants = dir(&config.variant_bucket, DEFAULT_VARIANT_DIR);
            tracing::info!(
                originals = %originals.display(),
                variants = %variants.display(),
                "Using filesystem object storage"
            );
            Ok(Stores {
                originals: Arc::new(FilesystemObjectStore::new(originals)),
                variants: Arc::new(FilesystemObjectStore::new(variants)),
            })
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory object storage; variants are lost on restart");
            Ok(Stores {
                originals: Arc::new(MemoryObjectStore::new()),
                variants: Arc::new(MemoryObjectStore::new()),
            })
        }
    }
}
