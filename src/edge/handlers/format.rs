// Output format negotiation for the `format` operation

use super::{truncate_chars, OperationHandler};
use crate::edge::{EdgeRequest, NormalizeError};
use crate::image_optimizer::{Operation, OutputFormat};

const AUTO: &str = "auto";
const JPEG_SHORT_FORM: &str = "jpg";

/// Accepted tokens, in `Accept` header search order
const RECOGNIZED_TOKENS: [&str; 4] = ["webp", "jpeg", "png", JPEG_SHORT_FORM];

const fn longest(tokens: &[&str]) -> usize {
    let mut longest = 0;
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].len() > longest {
            longest = tokens[i].len();
        }
        i += 1;
    }
    longest
}

const FORMAT_WINDOW: usize = longest(&RECOGNIZED_TOKENS) + 1;

/// Canonicalizes the requested format to `webp`, `jpeg` or `png`
///
/// `auto` (or an empty value) picks the first recognized token found in the
/// `Accept` header. Anything unsupported becomes `webp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatHandler;

impl FormatHandler {
    fn negotiate(request: &EdgeRequest) -> &'static str {
        let accept = request.header("accept").unwrap_or_default().to_lowercase();
        RECOGNIZED_TOKENS
            .into_iter()
            .find(|token| accept.contains(token))
            .unwrap_or(OutputFormat::default().as_str())
    }
}

impl OperationHandler for FormatHandler {
    fn operation(&self) -> Operation {
        Operation::Format
    }

    fn normalize(&self, raw: &str, request: &EdgeRequest) -> Result<String, NormalizeError> {
        let requested = truncate_chars(raw, FORMAT_WINDOW).to_lowercase();

        let token = match requested.as_str() {
            "" | AUTO => Self::negotiate(request),
            other => other,
        };
        let token = if token == JPEG_SHORT_FORM {
            OutputFormat::Jpeg.as_str()
        } else {
            token
        };

        let format = OutputFormat::from_canonical(token).unwrap_or_default();
        Ok(format.as_str().to_string())
    }
}
