//! Origin tier: transform on cache miss
//!
//! Request flow:
//! 1. Check the shared-secret header and the method
//! 2. Split the path into source key and canonical suffix
//! 3. Fetch the source image
//! 4. Decode the suffix, configure and run the pipeline on a blocking thread
//! 5. Store the variant under `key/suffix` while the response is built
//!
//! Storing the variant is best effort: a failed write is logged and
//! counted, and the client still gets the image.

pub mod event;
pub mod validation;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::OriginConfig;
use crate::error::OriginError;
use crate::image_optimizer::{
    configure_pipeline, CanonicalPath, ImageError, ImagePipeline, Operation, OperationMap,
};
use crate::metrics::{Metrics, Stage};
use crate::storage::{ObjectStore, Stores};

pub use event::{OriginEvent, OriginEventResponse};

/// One inbound origin invocation
#[derive(Debug, Clone)]
pub struct OriginRequest {
    pub method: String,
    /// Raw request path, possibly percent-encoded
    pub path: String,
    /// Header names are stored lower-cased
    headers: HashMap<String, String>,
    request_id: String,
}

impl OriginRequest {
    /// Create a request with a fresh request id (UUID v4)
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    pub fn insert_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

/// Result of an origin invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginResponse {
    pub status: u16,
    pub body: Bytes,
    pub content_type: &'static str,
    /// Set for transformed images, so the event adapter knows to base64 the body
    pub is_image: bool,
}

impl OriginResponse {
    pub fn image(body: Bytes, content_type: &'static str) -> Self {
        Self {
            status: 200,
            body,
            content_type,
            is_image: true,
        }
    }

    pub fn from_error(err: &OriginError) -> Self {
        Self {
            status: err.to_http_status(),
            body: Bytes::from(err.response_body()),
            content_type: "text/plain; charset=utf-8",
            is_image: false,
        }
    }

    /// Render in the JSON event response shape
    pub fn into_event_response(self) -> OriginEventResponse {
        OriginEventResponse::from(self)
    }
}

/// Transforms source images into variants
#[derive(Clone)]
pub struct OriginService {
    originals: Arc<dyn ObjectStore>,
    variants: Arc<dyn ObjectStore>,
    secret: String,
    secret_header: String,
}

impl OriginService {
    pub fn new(stores: Stores, config: &OriginConfig) -> Self {
        Self {
            originals: stores.originals,
            variants: stores.variants,
            secret: config.secret.clone(),
            secret_header: config.secret_header.clone(),
        }
    }

    /// Serve one request; every failure becomes an error response
    pub async fn handle(&self, request: OriginRequest) -> OriginResponse {
        let span = info_span!(
            "origin_request",
            request_id = %request.request_id(),
            method = %request.method,
            path = %request.path,
        );

        async move {
            let response = match self.process(&request).await {
                Ok(response) => response,
                Err(e) => {
                    match e.to_http_status() {
                        401 | 405 => warn!(error = %e, "Rejected origin request"),
                        400 | 404 => info!(error = %e, "Origin request failed"),
                        _ => error!(error = %e, "Origin request failed"),
                    }
                    OriginResponse::from_error(&e)
                }
            };
            Metrics::global().record_response(response.status);
            response
        }
        .instrument(span)
        .await
    }

    async fn process(&self, request: &OriginRequest) -> Result<OriginResponse, OriginError> {
        validation::authorize(request, &self.secret_header, &self.secret)?;
        validation::require_get(request)?;

        let decoded = urlencoding::decode(&request.path)
            .map_err(|_| OriginError::BadPath(ImageError::invalid_path(&request.path)))?;
        let path = CanonicalPath::parse(&decoded).map_err(OriginError::BadPath)?;

        // Download
        let timer = Metrics::global().start_stage(Stage::Download);
        let source = self.originals.get_object(&path.object_key).await?;
        let elapsed = timer.observe();
        info!(
            key = %path.object_key,
            bytes = source.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Downloaded source image"
        );

        // Configure
        let mut operations = OperationMap::decode(&path.suffix);
        let descriptor = operations.derive_content_descriptor();
        let content_type = descriptor.content_type.ok_or_else(|| {
            OriginError::Transform(ImageError::unsupported_format(
                operations.get(Operation::Format).unwrap_or_default(),
            ))
        })?;

        let mut pipeline = ImagePipeline::new();
        configure_pipeline(&mut pipeline, &operations, &descriptor)
            .map_err(OriginError::Transform)?;
        debug!(operations = %operations.to_suffix(), ?pipeline, "Configured pipeline");

        // Transform
        let timer = Metrics::global().start_stage(Stage::Pipeline);
        let encoded = tokio::task::spawn_blocking(move || pipeline.execute(&source))
            .await
            .map_err(|e| {
                OriginError::Transform(ImageError::encode_failed(
                    content_type,
                    format!("pipeline task failed: {}", e),
                ))
            })?
            .map_err(OriginError::Transform)?;
        let elapsed = timer.observe();
        info!(
            bytes = encoded.data.len(),
            content_type,
            elapsed_ms = elapsed.as_millis() as u64,
            "Transformed image"
        );

        // Persist while the response is assembled
        let body = Bytes::from(encoded.data);
        let persist = self.spawn_persist(path.variant_key(), content_type, body.clone());
        let response = OriginResponse::image(body, content_type);

        if let Err(e) = persist.await {
            error!(error = %e, "Variant persistence task did not complete");
            Metrics::global().persist_failures.inc();
        }

        Ok(response)
    }

    fn spawn_persist(
        &self,
        key: String,
        content_type: &'static str,
        body: Bytes,
    ) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(&self.variants);

        tokio::spawn(
            async move {
                let timer = Metrics::global().start_stage(Stage::Upload);
                match store.put_object(&key, content_type, body).await {
                    Ok(()) => {
                        let elapsed = timer.observe();
                        info!(
                            key = %key,
                            elapsed_ms = elapsed.as_millis() as u64,
                            "Stored transformed variant"
                        );
                    }
                    Err(e) => {
                        error!(key = %key, error = %e, "Failed to store transformed variant");
                        Metrics::global().persist_failures.inc();
                    }
                }
            }
            .in_current_span(),
        )
    }
}
