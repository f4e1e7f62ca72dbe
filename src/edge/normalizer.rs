//! Query normalizer
//!
//! Rewrites a viewer request so that every recognized operation lives in the
//! path instead of the query string. The rewrite is computed first and only
//! applied once every handler has succeeded; on failure the request keeps
//! its original path and query string.

use tracing::{debug, warn};

use super::handlers::HandlerTable;
use super::{EdgeRequest, NormalizeError};
use crate::image_optimizer::OperationMap;

/// Rewrites viewer requests to canonical operation paths
#[derive(Debug, Default)]
pub struct QueryNormalizer {
    handlers: HandlerTable,
}

/// Changes to commit to a request
#[derive(Debug)]
struct Rewrite {
    /// Query keys, as received, that were turned into operations
    consumed: Vec<String>,
    /// `None` when no operation was recognized
    suffix: Option<String>,
}

impl QueryNormalizer {
    pub fn new(handlers: HandlerTable) -> Self {
        Self { handlers }
    }

    /// Normalize `request` in place and hand it back
    ///
    /// Never fails: a handler error leaves `uri` on the original path and
    /// the query string untouched.
    pub fn normalize<'a>(&self, request: &'a mut EdgeRequest) -> &'a mut EdgeRequest {
        if request.querystring.is_empty() {
            return request;
        }

        let original_uri = request.uri.clone();

        match self.plan(request) {
            Ok(rewrite) => {
                for key in &rewrite.consumed {
                    request.querystring.remove(key);
                }
                request.uri = match rewrite.suffix {
                    Some(suffix) => {
                        debug!(uri = %original_uri, suffix = %suffix, "Rewrote image request");
                        format!("{}/{}", original_uri, suffix)
                    }
                    None => original_uri,
                };
            }
            Err(e) => {
                warn!(
                    uri = %original_uri,
                    error = %e,
                    "Failed to perform url rewrite, serving original image"
                );
                request.uri = original_uri;
            }
        }

        request
    }

    fn plan(&self, request: &EdgeRequest) -> Result<Rewrite, NormalizeError> {
        let mut operations = OperationMap::new();
        let mut consumed = Vec::new();

        for (key, entry) in &request.querystring {
            let name = key.to_lowercase();
            let Some(handler) = self.handlers.get(&name) else {
                continue;
            };

            let raw = entry.value.as_deref().unwrap_or_default();
            let value = handler.normalize(raw, request)?;
            operations.insert(handler.operation(), value);
            consumed.push(key.clone());
        }

        let suffix = (!operations.is_empty()).then(|| operations.to_suffix());
        Ok(Rewrite { consumed, suffix })
    }
}
