//! Operation handlers
//!
//! Each handler maps a raw query value to a canonical token. Values are cut
//! to a short character window before parsing so oversized input costs
//! nothing.

mod format;
mod numeric;

use std::collections::BTreeMap;

pub use format::FormatHandler;
pub use numeric::BoundedIntHandler;

use super::{EdgeRequest, NormalizeError};
use crate::image_optimizer::Operation;

/// Normalizes the value of one operation
pub trait OperationHandler: Send + Sync {
    fn operation(&self) -> Operation;

    /// Canonical value for `raw` (empty when the parameter had no value)
    fn normalize(&self, raw: &str, request: &EdgeRequest) -> Result<String, NormalizeError>;
}

/// Immutable dispatch table from lower-cased parameter name to handler
pub struct HandlerTable {
    handlers: BTreeMap<Operation, Box<dyn OperationHandler>>,
}

impl HandlerTable {
    /// Table with no handlers; every parameter is left alone
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Width, height, quality and format
    pub fn standard() -> Self {
        Self::empty()
            .with(BoundedIntHandler::width())
            .with(BoundedIntHandler::height())
            .with(BoundedIntHandler::quality())
            .with(FormatHandler)
    }

    /// Register `handler`, replacing any handler for the same operation
    pub fn with(mut self, handler: impl OperationHandler + 'static) -> Self {
        self.handlers.insert(handler.operation(), Box::new(handler));
        self
    }

    /// Handler for an already lower-cased parameter name
    pub fn get(&self, name: &str) -> Option<&dyn OperationHandler> {
        let operation = name.parse::<Operation>().ok()?;
        self.handlers.get(&operation).map(|h| h.as_ref())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

/// First `max_chars` characters of `value`
pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// Leading integer of `value`
///
/// Skips leading whitespace, accepts one optional `+`/`-`, then reads the
/// decimal digit run. Anything after the digits is ignored. `None` when
/// there are no digits.
pub(crate) fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit);
    let mut seen = false;
    let mut magnitude: i64 = 0;
    for digit in digits {
        seen = true;
        magnitude = magnitude
            .saturating_mul(10)
            .saturating_add(i64::from(digit - b'0'));
    }

    seen.then_some(if negative { -magnitude } else { magnitude })
}

/// Number of decimal digits in `n`
pub(crate) const fn decimal_len(mut n: u64) -> usize {
    let mut len = 1;
    while n >= 10 {
        n /= 10;
        len += 1;
    }
    len
}
