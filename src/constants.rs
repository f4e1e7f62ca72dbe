// Constants module - centralized default values and protocol literals
//
// Bounds for the edge operation handlers live here so the edge tier and the
// origin tier agree on one value space.

// =============================================================================
// Operation bounds
// =============================================================================

/// Smallest width the edge tier will emit
pub const MIN_WIDTH: u32 = 16;

/// Largest width the edge tier will emit
pub const MAX_WIDTH: u32 = 1024;

/// Smallest height the edge tier will emit
pub const MIN_HEIGHT: u32 = 16;

/// Largest height the edge tier will emit
pub const MAX_HEIGHT: u32 = 1024;

/// Smallest quality the edge tier will emit
pub const MIN_QUALITY: u32 = 1;

/// Largest quality the edge tier will emit
pub const MAX_QUALITY: u32 = 100;

/// Quality used by lossy encoders when the path carries none
pub const DEFAULT_ENCODE_QUALITY: u8 = 80;

// =============================================================================
// Origin protocol
// =============================================================================

/// Header carrying the pre-shared secret between the CDN and the origin
pub const ORIGIN_SECRET_HEADER: &str = "x-origin-secret-header";

/// Body returned when the source object does not exist
pub const NOT_FOUND_MESSAGE: &str = "The requested image was not found.";

/// Body returned when the transform could not be configured or executed
pub const TRANSFORM_FAILED_MESSAGE: &str = "We failed to transform the image.";

// =============================================================================
// Server defaults
// =============================================================================

/// Default listen address
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Storage defaults
// =============================================================================

/// Default AWS region when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";
