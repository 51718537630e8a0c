//! Turns command-line intent into a `RequestDescriptor`.
//!
//! # Design
//! `CoapClient` holds only the invocation `Config`. `build_request` validates
//! and assembles the descriptor; `transformer` hands out the state machine
//! that formats the responses. The caller performs the exchange in between,
//! so nothing here does I/O.

use url::{Host, Url};

use crate::config::Config;
use crate::error::UsageError;
use crate::format::parse_content_format;
use crate::message::{CoapMethod, Payload, RequestDescriptor};
use crate::options::collect_options;
use crate::response::ResponseTransformer;

/// URL scheme accepted by the client.
pub const COAP_SCHEME: &str = "coap";

/// Valid range for the `--block2` size exponent.
pub const BLOCK2_RANGE: std::ops::RangeInclusive<u8> = 1..=6;

/// Stateless request builder for a single invocation.
#[derive(Debug, Clone)]
pub struct CoapClient {
    config: Config,
}

impl CoapClient {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate the flags and `url` and build the request descriptor.
    ///
    /// Option syntax is checked first, then the URL, the block size and the
    /// content formats.
    pub fn build_request(
        &self,
        method: CoapMethod,
        url: Option<&str>,
        payload: Payload,
    ) -> Result<RequestDescriptor, UsageError> {
        let options = collect_options(&self.config.coap_options)?;

        let url = url.ok_or(UsageError::MissingUrl)?;
        let url = Url::parse(url).map_err(|_| UsageError::InvalidUrl)?;
        let hostname = match url.host() {
            // `coap://` and `coap:///path` have an authority with no host in it.
            None if url.has_authority() => return Err(UsageError::WrongUrl),
            None => return Err(UsageError::InvalidUrl),
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
        };
        if url.scheme() != COAP_SCHEME || hostname.is_empty() {
            return Err(UsageError::WrongUrl);
        }

        let block2 = self
            .config
            .block2
            .map(|size| {
                u8::try_from(size)
                    .ok()
                    .filter(|szx| BLOCK2_RANGE.contains(szx))
                    .ok_or(UsageError::Block2OutOfRange(size))
            })
            .transpose()?;

        let accept = self.config.accept.as_deref().map(parse_content_format).transpose()?;
        let content_format = self
            .config
            .content_format
            .as_deref()
            .map(parse_content_format)
            .transpose()?;

        Ok(RequestDescriptor {
            method,
            hostname,
            port: url.port(),
            path: url.path().to_string(),
            query: url.query().map(str::to_string),
            confirmable: !self.config.non_confirmable,
            observe: self.config.observe,
            accept,
            content_format,
            block2,
            options,
            payload,
        })
    }

    /// A fresh transformer for the responses to one request.
    pub fn transformer(&self) -> ResponseTransformer {
        ResponseTransformer::new(&self.config)
    }
}
