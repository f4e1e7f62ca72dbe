//! Image optimization module
//!
//! Shared operation vocabulary and the origin-side transform:
//! - Canonical suffix decoding and content type derivation
//! - Pipeline configuration from decoded operations
//! - Resize and format conversion (JPEG, PNG, WebP)
//! - Animated GIF and WebP sources, kept animated for WebP output
//!
//! # Canonical paths
//!
//! ```text
//! /images/cat.png/format=webp,quality=80,width=320
//! ```
//!
//! The last path segment lists the operations, sorted, and doubles as the
//! key suffix under which the transformed variant is stored.

pub mod animation;
pub mod encoder;
pub mod error;
pub mod params;
pub mod processor;

// Re-export commonly used types
pub use animation::AnimationFrame;
pub use encoder::{EncodedImage, EncoderFactory, EncoderQuality, ImageEncoder};
pub use error::ImageError;
pub use params::{CanonicalPath, ContentDescriptor, Operation, OperationMap, OutputFormat};
pub use processor::{configure_pipeline, ImagePipeline, ResizeOptions, TransformPipeline};
