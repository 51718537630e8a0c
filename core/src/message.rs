//! CoAP requests and responses described as plain data.
//!
//! # Design
//! The core builds a `RequestDescriptor` and consumes `ResponseEvent`s
//! without touching the network. The binary owns the socket: it encodes the
//! descriptor on the wire and decodes responses back into events.
//!
//! All fields use owned types so a descriptor can be moved into the transport
//! task as a whole.

use std::fmt;

use percent_encoding::percent_decode_str;

use crate::options::OptionGroup;

/// Default UDP port for the `coap` scheme.
pub const COAP_DEFAULT_PORT: u16 = 5683;

/// Request method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoapMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl CoapMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoapMethod::Get => "GET",
            CoapMethod::Post => "POST",
            CoapMethod::Put => "PUT",
            CoapMethod::Delete => "DELETE",
        }
    }

    /// Whether the method reads its body from standard input when `-p` is absent.
    pub fn takes_body(&self) -> bool {
        matches!(self, CoapMethod::Post | CoapMethod::Put)
    }
}

impl fmt::Display for CoapMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the request body comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Payload {
    #[default]
    None,
    /// Bytes given on the command line.
    Inline(Vec<u8>),
    /// Standard input is redirected and becomes the body.
    Piped,
}

impl Payload {
    /// Pick the body source for `method`.
    ///
    /// An explicit `-p` value always wins. Otherwise only PUT and POST read
    /// standard input, and only when it is not a terminal.
    pub fn resolve(method: CoapMethod, flag: Option<&str>, stdin_is_terminal: bool) -> Self {
        match flag {
            Some(text) => Payload::Inline(text.as_bytes().to_vec()),
            None if method.takes_body() && !stdin_is_terminal => Payload::Piped,
            None => Payload::None,
        }
    }
}

/// A fully validated request, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: CoapMethod,
    pub hostname: String,
    pub port: Option<u16>,
    /// Percent-encoded path as it appeared in the URL.
    pub path: String,
    pub query: Option<String>,
    pub confirmable: bool,
    pub observe: bool,
    pub accept: Option<u16>,
    pub content_format: Option<u16>,
    /// Block size exponent in `1..=6`.
    pub block2: Option<u8>,
    pub options: Vec<OptionGroup>,
    pub payload: Payload,
}

impl RequestDescriptor {
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(COAP_DEFAULT_PORT)
    }

    /// Decoded Uri-Path option values, one per non-empty path segment.
    pub fn uri_path_segments(&self) -> Vec<Vec<u8>> {
        decode_components(&self.path, '/')
    }

    /// Decoded Uri-Query option values, one per `&`-separated parameter.
    pub fn uri_query_params(&self) -> Vec<Vec<u8>> {
        self.query
            .as_deref()
            .map(|q| decode_components(q, '&'))
            .unwrap_or_default()
    }

    /// Block2 option value asking for block 0 with the configured size.
    pub fn block2_option_value(&self) -> Option<Vec<u8>> {
        self.block2.map(|szx| vec![szx])
    }

    /// Requested block size in bytes.
    pub fn block2_size(&self) -> Option<usize> {
        self.block2.map(|szx| 16usize << szx)
    }
}

fn decode_components(raw: &str, separator: char) -> Vec<Vec<u8>> {
    raw.split(separator)
        .filter(|part| !part.is_empty())
        .map(|part| percent_decode_str(part).collect())
        .collect()
}

/// One response or notification delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEvent {
    /// Response code in `c.dd` form, e.g. `2.05`.
    pub status_code: String,
    pub payload: Vec<u8>,
    /// No further events follow this one.
    pub is_final: bool,
}

impl ResponseEvent {
    pub fn new(
        status_code: impl Into<String>,
        payload: impl Into<Vec<u8>>,
        is_final: bool,
    ) -> Self {
        Self {
            status_code: status_code.into(),
            payload: payload.into(),
            is_final,
        }
    }
}

/// Format a raw CoAP code byte as `class.detail`.
pub fn format_code(code: u8) -> String {
    format!("{}.{:02}", code >> 5, code & 0x1f)
}
