//! Image operation vocabulary shared by the edge and origin tiers
//!
//! The edge tier encodes recognized operations into a canonical suffix
//! appended to the object path:
//! ```text
//! /images/cat.png/format=webp,quality=80,width=320
//! ```
//! The origin tier decodes the same suffix back into an [`OperationMap`].
//! Tokens are sorted by their full `operation=value` text so that the same
//! set of operations always yields the same cache key.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::ImageError;

/// A recognized image transform operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Format,
    Height,
    Quality,
    Width,
}

impl Operation {
    /// Every recognized operation
    pub const ALL: [Operation; 4] = [
        Operation::Format,
        Operation::Height,
        Operation::Quality,
        Operation::Width,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::Height => "height",
            Self::Quality => "quality",
            Self::Width => "width",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ImageError;

    /// Exact, case-sensitive match on the canonical operation name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "format" => Ok(Operation::Format),
            "height" => Ok(Operation::Height),
            "quality" => Ok(Operation::Quality),
            "width" => Ok(Operation::Width),
            _ => Err(ImageError::invalid_param(s, "unknown operation")),
        }
    }
}

/// Strictly supported output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    WebP,
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Every strictly supported format
    pub const ALL: [OutputFormat; 3] = [OutputFormat::WebP, OutputFormat::Jpeg, OutputFormat::Png];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::WebP => "image/webp",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Whether a quality setting means anything for this format
    pub fn is_lossy(&self) -> bool {
        match self {
            Self::WebP | Self::Jpeg => true,
            Self::Png => false,
        }
    }

    /// Match a canonical token exactly (`jpg` is not canonical)
    pub fn from_canonical(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == token)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content type and lossiness derived from the `format` operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentDescriptor {
    /// `None` when the format token is outside the supported set
    pub content_type: Option<&'static str>,
    pub is_lossy: bool,
}

/// Operations and their canonical values, as carried in a canonical suffix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationMap {
    entries: BTreeMap<Operation, String>,
}

impl OperationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an operation value, replacing any previous one
    pub fn insert(&mut self, operation: Operation, value: impl Into<String>) {
        self.entries.insert(operation, value.into());
    }

    /// Raw value, including empty strings
    pub fn get(&self, operation: Operation) -> Option<&str> {
        self.entries.get(&operation).map(String::as_str)
    }

    /// Value if present and non-empty
    ///
    /// An empty value (e.g. `width=`) counts as absent for pipeline decisions.
    pub fn value(&self, operation: Operation) -> Option<&str> {
        self.get(operation).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Operation, &str)> {
        self.entries.iter().map(|(op, v)| (*op, v.as_str()))
    }

    /// Decode a canonical suffix (`format=jpeg,width=50`)
    ///
    /// Tokens are split on `,` and then on the first `=`; a token without
    /// `=` maps to an empty value. Names outside the recognized operations
    /// are dropped.
    pub fn decode(suffix: &str) -> Self {
        let mut map = Self::new();

        for token in suffix.split(',') {
            if token.is_empty() {
                continue;
            }
            let (name, value) = token.split_once('=').unwrap_or((token, ""));
            match name.parse::<Operation>() {
                Ok(operation) => map.insert(operation, value),
                Err(_) => tracing::debug!(token, "Ignoring unknown operation in suffix"),
            }
        }

        map
    }

    /// Encode as a canonical suffix
    ///
    /// Tokens are sorted by the joined `operation=value` string, not by the
    /// operation alone.
    pub fn to_suffix(&self) -> String {
        let mut tokens: Vec<String> = self
            .entries
            .iter()
            .map(|(op, value)| format!("{}={}", op, value))
            .collect();
        tokens.sort();
        tokens.join(",")
    }

    /// Derive the response content type and lossiness
    ///
    /// A missing or empty `format` is written back into the map as `jpeg`,
    /// so the pipeline built from this map converts to JPEG as well.
    pub fn derive_content_descriptor(&mut self) -> ContentDescriptor {
        if self.value(Operation::Format).is_none() {
            self.insert(Operation::Format, OutputFormat::Jpeg.as_str());
        }

        match self
            .get(Operation::Format)
            .and_then(OutputFormat::from_canonical)
        {
            Some(format) => ContentDescriptor {
                content_type: Some(format.content_type()),
                is_lossy: format.is_lossy(),
            },
            None => ContentDescriptor {
                content_type: None,
                is_lossy: false,
            },
        }
    }
}

impl FromIterator<(Operation, String)> for OperationMap {
    fn from_iter<I: IntoIterator<Item = (Operation, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// An origin request path split into source key and canonical suffix
///
/// `/images/rio/1.jpeg/format=webp,width=100` becomes key `images/rio/1.jpeg`
/// and suffix `format=webp,width=100`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPath {
    pub object_key: String,
    pub suffix: String,
}

impl CanonicalPath {
    /// Split a request path; the last segment is always the suffix
    pub fn parse(path: &str) -> Result<Self, ImageError> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let (object_key, suffix) = trimmed
            .rsplit_once('/')
            .ok_or_else(|| ImageError::invalid_path(path))?;

        if object_key.is_empty() {
            return Err(ImageError::invalid_path(path));
        }

        Ok(Self {
            object_key: object_key.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Storage key for the transformed variant
    pub fn variant_key(&self) -> String {
        format!("{}/{}", self.object_key, self.suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_from_str_is_exact() {
        assert_eq!("width".parse::<Operation>().unwrap(), Operation::Width);
        assert_eq!("format".parse::<Operation>().unwrap(), Operation::Format);
        assert!("Width".parse::<Operation>().is_err());
        assert!("w".parse::<Operation>().is_err());
    }

    #[test]
    fn test_output_format_from_canonical() {
        assert_eq!(OutputFormat::from_canonical("jpeg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_canonical("webp"), Some(OutputFormat::WebP));
        assert_eq!(OutputFormat::from_canonical("png"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_canonical("jpg"), None);
        assert_eq!(OutputFormat::from_canonical("PNG"), None);
    }

    #[test]
    fn test_decode_rebuilds_operation_map() {
        let map = OperationMap::decode("format=jpeg,width=50,height=50");
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(Operation::Format), Some("jpeg"));
        assert_eq!(map.get(Operation::Width), Some("50"));
        assert_eq!(map.get(Operation::Height), Some("50"));
        assert_eq!(map.get(Operation::Quality), None);
    }

    #[test]
    fn test_decode_token_without_equals_has_empty_value() {
        let map = OperationMap::decode("width");
        assert_eq!(map.get(Operation::Width), Some(""));
        assert_eq!(map.value(Operation::Width), None);
    }

    #[test]
    fn test_decode_drops_unknown_names() {
        let map = OperationMap::decode("original");
        assert!(map.is_empty());

        let map = OperationMap::decode("blur=3,width=20");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_to_suffix_sorts_by_token() {
        let mut map = OperationMap::new();
        map.insert(Operation::Width, "50");
        map.insert(Operation::Format, "jpeg");
        map.insert(Operation::Quality, "75");
        map.insert(Operation::Height, "40");
        assert_eq!(map.to_suffix(), "format=jpeg,height=40,quality=75,width=50");
    }

    #[test]
    fn test_descriptor_defaults_format_to_jpeg() {
        let mut map = OperationMap::decode("width=100");
        let descriptor = map.derive_content_descriptor();
        assert_eq!(descriptor.content_type, Some("image/jpeg"));
        assert!(descriptor.is_lossy);
        assert_eq!(map.get(Operation::Format), Some("jpeg"));
    }

    #[test]
    fn test_descriptor_per_format() {
        for (format, content_type, lossy) in [
            ("jpeg", "image/jpeg", true),
            ("webp", "image/webp", true),
            ("png", "image/png", false),
        ] {
            let mut map = OperationMap::new();
            map.insert(Operation::Format, format);
            let descriptor = map.derive_content_descriptor();
            assert_eq!(descriptor.content_type, Some(content_type));
            assert_eq!(descriptor.is_lossy, lossy);
        }
    }

    #[test]
    fn test_descriptor_unknown_format_has_no_content_type() {
        let mut map = OperationMap::decode("format=gif");
        let descriptor = map.derive_content_descriptor();
        assert_eq!(descriptor.content_type, None);
        assert!(!descriptor.is_lossy);
    }

    #[test]
    fn test_canonical_path_parse() {
        let path = CanonicalPath::parse("/images/rio/1.jpeg/format=auto,width=100").unwrap();
        assert_eq!(path.object_key, "images/rio/1.jpeg");
        assert_eq!(path.suffix, "format=auto,width=100");
        assert_eq!(
            path.variant_key(),
            "images/rio/1.jpeg/format=auto,width=100"
        );
    }

    #[test]
    fn test_canonical_path_requires_key_segment() {
        assert!(CanonicalPath::parse("/format=jpeg").is_err());
        assert!(CanonicalPath::parse("//format=jpeg").is_err());
        assert!(CanonicalPath::parse("").is_err());
    }
}
