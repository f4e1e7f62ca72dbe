//! Storage configuration types.
//!
//! Selects the object store backend for source images and transformed
//! variants:
//!
//! - **s3**: two buckets (`original_bucket`, `variant_bucket`) sharing one
//!   client, with optional static credentials and a custom endpoint for
//!   S3-compatible services
//! - **filesystem**: two directories under `root`
//! - **memory**: process-local maps, for tests and local development

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_REGION;

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    Filesystem,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Bucket (or directory under `root`) holding source images
    #[serde(default)]
    pub original_bucket: String,
    /// Bucket (or directory under `root`) receiving transformed variants
    #[serde(default)]
    pub variant_bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
    /// Base directory for the filesystem backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            original_bucket: String::new(),
            variant_bucket: String::new(),
            region: default_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            force_path_style: false,
            root: None,
        }
    }
}

impl StorageConfig {
    /// In-memory stores, no external dependencies
    pub fn memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            ..Self::default()
        }
    }

    /// Validate backend-specific requirements
    pub fn validate(&self) -> Result<(), String> {
        match self.backend {
            StorageBackend::S3 => {
                if self.original_bucket.trim().is_empty() {
                    return Err("storage.original_bucket cannot be empty for the s3 backend"
                        .to_string());
                }
                if self.variant_bucket.trim().is_empty() {
                    return Err(
                        "storage.variant_bucket cannot be empty for the s3 backend".to_string()
                    );
                }
                if self.access_key.is_some() != self.secret_key.is_some() {
                    return Err(
                        "storage.access_key and storage.secret_key must be set together"
                            .to_string(),
                    );
                }
            }
            StorageBackend::Filesystem => {
                if self.root.as_deref().map_or(true, |r| r.trim().is_empty()) {
                    return Err("storage.root is required for the filesystem backend".to_string());
                }
            }
            StorageBackend::Memory => {}
        }
        Ok(())
    }
}
