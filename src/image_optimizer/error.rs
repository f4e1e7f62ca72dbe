//! Image optimization error types
//!
//! Provides structured error handling with HTTP status mapping.

use std::fmt;

/// Errors that can occur while decoding a canonical path or transforming an image
#[derive(Debug, Clone)]
pub enum ImageError {
    // === Path Errors ===
    /// Request path has no object key in front of the suffix
    InvalidPath { path: String },

    // === Parameter Errors ===
    /// Operation value cannot be used to configure the pipeline
    InvalidParameter { param: String, message: String },
    /// Format token outside the strictly supported set
    UnsupportedFormat { format: String },

    // === Processing Errors ===
    /// Failed to decode the source image
    DecodeFailed { message: String },
    /// Resize operation failed
    ResizeFailed { message: String },
    /// Encoding to output format failed
    EncodeFailed { format: String, message: String },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::InvalidPath { path } => {
                write!(f, "Path '{}' has no object key before the operations", path)
            }
            ImageError::InvalidParameter { param, message } => {
                write!(f, "Invalid parameter '{}': {}", param, message)
            }
            ImageError::UnsupportedFormat { format } => {
                write!(f, "Unsupported image format: {}", format)
            }
            ImageError::DecodeFailed { message } => {
                write!(f, "Failed to decode image: {}", message)
            }
            ImageError::ResizeFailed { message } => {
                write!(f, "Resize failed: {}", message)
            }
            ImageError::EncodeFailed { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
        }
    }
}

impl std::error::Error for ImageError {}

impl ImageError {
    /// Maps image errors to HTTP status codes
    ///
    /// - InvalidPath → 400 (Bad Request)
    /// - everything else → 500, the edge tier only ever emits values the
    ///   pipeline accepts, so a bad value here is a contract violation
    pub fn to_http_status(&self) -> u16 {
        match self {
            ImageError::InvalidPath { .. } => 400,
            ImageError::InvalidParameter { .. }
            | ImageError::UnsupportedFormat { .. }
            | ImageError::DecodeFailed { .. }
            | ImageError::ResizeFailed { .. }
            | ImageError::EncodeFailed { .. } => 500,
        }
    }

    pub fn invalid_path(path: impl Into<String>) -> Self {
        ImageError::InvalidPath { path: path.into() }
    }

    pub fn invalid_param(param: impl Into<String>, message: impl Into<String>) -> Self {
        ImageError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_format(format: impl Into<String>) -> Self {
        ImageError::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        ImageError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn resize_failed(message: impl Into<String>) -> Self {
        ImageError::ResizeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        ImageError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }
}
