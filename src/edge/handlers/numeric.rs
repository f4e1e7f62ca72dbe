// Bounded integer operations: width, height, quality

use super::{decimal_len, parse_leading_int, truncate_chars, OperationHandler};
use crate::constants::{MAX_HEIGHT, MAX_QUALITY, MAX_WIDTH, MIN_HEIGHT, MIN_QUALITY, MIN_WIDTH};
use crate::edge::{EdgeRequest, NormalizeError};
use crate::image_optimizer::Operation;

/// Parses a leading integer and clamps it to `[min, max]`
///
/// Values with no leading digits resolve to `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedIntHandler {
    operation: Operation,
    min: u32,
    max: u32,
}

impl BoundedIntHandler {
    pub const fn new(operation: Operation, min: u32, max: u32) -> Self {
        Self { operation, min, max }
    }

    pub const fn width() -> Self {
        Self::new(Operation::Width, MIN_WIDTH, MAX_WIDTH)
    }

    pub const fn height() -> Self {
        Self::new(Operation::Height, MIN_HEIGHT, MAX_HEIGHT)
    }

    pub const fn quality() -> Self {
        Self::new(Operation::Quality, MIN_QUALITY, MAX_QUALITY)
    }

    /// One character more than the widest accepted value
    pub const fn window(&self) -> usize {
        decimal_len(self.max as u64) + 1
    }
}

impl OperationHandler for BoundedIntHandler {
    fn operation(&self) -> Operation {
        self.operation
    }

    fn normalize(&self, raw: &str, _request: &EdgeRequest) -> Result<String, NormalizeError> {
        let value = match parse_leading_int(truncate_chars(raw, self.window())) {
            Some(n) => n.clamp(i64::from(self.min), i64::from(self.max)),
            None => i64::from(self.min),
        };
        Ok(value.to_string())
    }
}
