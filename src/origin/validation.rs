// Request checks run before any path decoding

use super::OriginRequest;
use crate::error::OriginError;

/// Require the shared-secret header to match `secret`
pub fn authorize(request: &OriginRequest, header: &str, secret: &str) -> Result<(), OriginError> {
    match request.header(header) {
        Some(value) if constant_time_compare(value, secret) => Ok(()),
        _ => Err(OriginError::Unauthorized),
    }
}

/// Only GET is served
pub fn require_get(request: &OriginRequest) -> Result<(), OriginError> {
    if request.method == "GET" {
        Ok(())
    } else {
        Err(OriginError::MethodNotAllowed {
            method: request.method.clone(),
        })
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
