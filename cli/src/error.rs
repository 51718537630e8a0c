//! Error types for the `coap` binary.
//!
//! # Design
//! `UsageError` comes from the core and is reported before any packet is
//! sent. `TransportError` covers everything that can go wrong on the socket.
//! Neither is retried; `CliError::exit_code` picks the process status.

use std::io;
use std::time::Duration;

use coap_cli_core::UsageError;
use thiserror::Error;

/// Exit status for usage errors (`-1` as an unsigned byte).
pub const USAGE_EXIT_CODE: u8 = 255;

/// Exit status for transport and output failures.
pub const FAILURE_EXIT_CODE: u8 = 1;

/// Errors raised while exchanging messages with the server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Name resolution failed.
    #[error("could not resolve {host}: {source}")]
    Resolve { host: String, source: io::Error },

    /// Resolution succeeded but returned no address.
    #[error("no address found for {0}")]
    NoAddress(String),

    /// The request could not be encoded as a CoAP message.
    #[error("could not encode request: {0}")]
    Encode(String),

    /// No response arrived within the exchange lifetime.
    #[error("no response within {} s", .0.as_secs())]
    Timeout(Duration),

    /// The server answered with a Reset message.
    #[error("request was reset by the server")]
    Reset,

    /// Reading the request body from standard input failed.
    #[error("could not read payload from standard input: {0}")]
    Payload(io::Error),

    /// Socket I/O failed.
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}

/// Top-level error for one invocation.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Writing to standard output or standard error failed.
    #[error("output error: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) => USAGE_EXIT_CODE,
            CliError::Transport(_) | CliError::Output(_) => FAILURE_EXIT_CODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_exit_with_255() {
        let err = CliError::from(UsageError::WrongUrl);
        assert_eq!(err.exit_code(), 255);
        assert_eq!(
            err.to_string(),
            "Wrong URL. Protocol is not coap or no hostname found."
        );
    }

    #[test]
    fn transport_errors_exit_with_1() {
        let err = CliError::from(TransportError::Timeout(Duration::from_secs(30)));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "no response within 30 s");
        assert_eq!(CliError::from(TransportError::Reset).exit_code(), 1);
    }
}
