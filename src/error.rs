// Error types module

use std::fmt;

use crate::constants::{NOT_FOUND_MESSAGE, TRANSFORM_FAILED_MESSAGE};
use crate::image_optimizer::ImageError;
use crate::storage::StorageError;

/// Why an origin invocation did not produce an image
///
/// Each variant maps to one HTTP status; the client only ever sees the
/// status and [`OriginError::response_body`], never the inner details.
#[derive(Debug)]
pub enum OriginError {
    /// Shared-secret header missing or wrong
    Unauthorized,

    /// Anything but GET
    MethodNotAllowed { method: String },

    /// Path has no object key in front of the operations
    BadPath(ImageError),

    /// Source object does not exist
    SourceNotFound { key: String },

    /// Source store failed for another reason
    SourceUnavailable(StorageError),

    /// Pipeline could not be configured or executed
    Transform(ImageError),
}

impl fmt::Display for OriginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginError::Unauthorized => write!(f, "Missing or invalid origin secret"),
            OriginError::MethodNotAllowed { method } => {
                write!(f, "Method {} is not allowed", method)
            }
            OriginError::BadPath(err) => write!(f, "Bad request path: {}", err),
            OriginError::SourceNotFound { key } => write!(f, "Source image '{}' not found", key),
            OriginError::SourceUnavailable(err) => write!(f, "Source store failed: {}", err),
            OriginError::Transform(err) => write!(f, "Transform failed: {}", err),
        }
    }
}

impl std::error::Error for OriginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OriginError::BadPath(err) | OriginError::Transform(err) => Some(err),
            OriginError::SourceUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl OriginError {
    pub fn to_http_status(&self) -> u16 {
        match self {
            OriginError::Unauthorized => 401,
            OriginError::MethodNotAllowed { .. } => 405,
            OriginError::BadPath(_) => 400,
            OriginError::SourceNotFound { .. } => 404,
            OriginError::SourceUnavailable(_) => 502,
            OriginError::Transform(_) => 500,
        }
    }

    /// Body sent to the client: a fixed message for 404 and 500, otherwise
    /// the status reason phrase
    pub fn response_body(&self) -> String {
        match self {
            OriginError::SourceNotFound { .. } => NOT_FOUND_MESSAGE.to_string(),
            OriginError::Transform(_) => TRANSFORM_FAILED_MESSAGE.to_string(),
            other => http::StatusCode::from_u16(other.to_http_status())
                .ok()
                .and_then(|status| status.canonical_reason())
                .unwrap_or_default()
                .to_string(),
        }
    }
}

impl From<StorageError> for OriginError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key } => OriginError::SourceNotFound { key },
            other => OriginError::SourceUnavailable(other),
        }
    }
}
