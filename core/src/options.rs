//! Collects repeated `-O key,value` arguments into CoAP option groups.
//!
//! # Design
//! A raw argument is `key,value`, split at the first comma so values may
//! contain further commas. `key` is either a decimal option number or one of
//! the registered option names. Values prefixed with `0x` are hex, anything
//! else is taken as UTF-8 text.
//!
//! The transport sets all values of one option number in a single call, so
//! arguments sharing a number are merged into one [`OptionGroup`]. Groups keep
//! the order in which their number first appeared, values keep argument order.

use crate::error::UsageError;

/// Separator between option key and value.
pub const OPTION_SEPARATOR: char = ',';

/// Prefix marking a hex-encoded option value.
pub const HEX_PREFIX: &str = "0x";

/// Registered CoAP option names accepted as symbolic keys.
const OPTION_NAMES: &[(&str, u16)] = &[
    ("If-Match", 1),
    ("Uri-Host", 3),
    ("ETag", 4),
    ("If-None-Match", 5),
    ("Observe", 6),
    ("Uri-Port", 7),
    ("Location-Path", 8),
    ("Uri-Path", 11),
    ("Content-Format", 12),
    ("Max-Age", 14),
    ("Uri-Query", 15),
    ("Accept", 17),
    ("Location-Query", 20),
    ("Block2", 23),
    ("Block1", 27),
    ("Size2", 28),
    ("Proxy-Uri", 35),
    ("Proxy-Scheme", 39),
    ("Size1", 60),
    ("No-Response", 258),
];

/// A single decoded `-O` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolOption {
    pub number: u16,
    pub value: Vec<u8>,
}

/// All values given for one option number, in argument order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionGroup {
    pub number: u16,
    pub values: Vec<Vec<u8>>,
}

/// Resolve an option key to its number. Names match case-insensitively.
pub fn option_number(key: &str) -> Option<u16> {
    if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
        return key.parse().ok();
    }
    OPTION_NAMES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|&(_, number)| number)
}

/// Decode an option value: `0x`-prefixed hex, otherwise literal UTF-8 bytes.
pub fn decode_value(value: &str) -> Result<Vec<u8>, hex::FromHexError> {
    match value.strip_prefix(HEX_PREFIX) {
        Some(digits) => hex::decode(digits),
        None => Ok(value.as_bytes().to_vec()),
    }
}

/// Parse one raw `key,value` argument.
pub fn parse_option(raw: &str) -> Result<ProtocolOption, UsageError> {
    let invalid = || UsageError::InvalidOption(raw.to_string());

    let (key, value) = raw.split_once(OPTION_SEPARATOR).ok_or_else(invalid)?;
    if value.is_empty() {
        return Err(invalid());
    }
    let number = option_number(key).ok_or_else(invalid)?;
    let value = decode_value(value).map_err(|e| UsageError::InvalidOptionValue {
        option: raw.to_string(),
        reason: e.to_string(),
    })?;

    Ok(ProtocolOption { number, value })
}

/// Accumulates options and groups values sharing an option number.
#[derive(Debug, Clone, Default)]
pub struct OptionCollector {
    groups: Vec<OptionGroup>,
}

impl OptionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and append a raw argument.
    pub fn push_raw(&mut self, raw: &str) -> Result<(), UsageError> {
        let option = parse_option(raw)?;
        self.push(option);
        Ok(())
    }

    pub fn push(&mut self, option: ProtocolOption) {
        match self.groups.iter_mut().find(|g| g.number == option.number) {
            Some(group) => group.values.push(option.value),
            None => self.groups.push(OptionGroup {
                number: option.number,
                values: vec![option.value],
            }),
        }
    }

    pub fn into_groups(self) -> Vec<OptionGroup> {
        self.groups
    }
}

/// Collect every raw argument, stopping at the first invalid one.
pub fn collect_options<I, S>(raw: I) -> Result<Vec<OptionGroup>, UsageError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut collector = OptionCollector::new();
    for arg in raw {
        collector.push_raw(arg.as_ref())?;
    }
    Ok(collector.into_groups())
}
