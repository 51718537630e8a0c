//! Content-Format codes for `--content-format` and `--accept`.

use crate::error::UsageError;

const MEDIA_TYPES: &[(&str, u16)] = &[
    ("text/plain", 0),
    ("application/link-format", 40),
    ("application/xml", 41),
    ("application/octet-stream", 42),
    ("application/exi", 47),
    ("application/json", 50),
    ("application/cbor", 60),
];

/// Parse a Content-Format given as a decimal code or a media type name.
pub fn parse_content_format(value: &str) -> Result<u16, UsageError> {
    let value = value.trim();
    if let Ok(code) = value.parse::<u16>() {
        return Ok(code);
    }
    MEDIA_TYPES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(value))
        .map(|&(_, code)| code)
        .ok_or_else(|| UsageError::InvalidContentFormat(value.to_string()))
}
