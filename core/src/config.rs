//! Invocation settings, built once from the command line.

use std::time::Duration;

/// Exchange lifetime used when `--timeout` is not given.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Every flag that shapes the request or the output.
///
/// Constructed by the binary and passed by reference to the request builder
/// and the response transformer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub observe: bool,
    /// Append a line feed after each non-empty payload.
    pub new_line: bool,
    pub payload: Option<String>,
    /// Raw `--block2` value; checked against `[1, 6]` when the request is built.
    pub block2: Option<i64>,
    /// Suppress status-code markers.
    pub quiet: bool,
    pub non_confirmable: bool,
    /// Exchange lifetime in seconds.
    pub timeout: Option<u64>,
    pub show_timing: bool,
    /// Raw `-O key,value` arguments in the order given.
    pub coap_options: Vec<String>,
    pub content_format: Option<String>,
    pub accept: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            observe: false,
            new_line: true,
            payload: None,
            block2: None,
            quiet: false,
            non_confirmable: false,
            timeout: None,
            show_timing: false,
            coap_options: Vec::new(),
            content_format: None,
            accept: None,
        }
    }
}

impl Config {
    pub fn exchange_lifetime(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}
