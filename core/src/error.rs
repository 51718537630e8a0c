//! Usage errors detected before any network I/O.
//!
//! # Design
//! Every variant is fatal for the invocation. The `Display` text is the exact
//! message shown to the user, so the binary can print it verbatim and pick
//! the exit status. Nothing in the core exits the process itself.

use thiserror::Error;

/// Errors returned while turning command-line intent into a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    /// No URL was given, neither bare nor after a verb.
    #[error("no URL given")]
    MissingUrl,

    /// The URL could not be parsed or carries no scheme.
    #[error("Invalid URL. Protocol is not given or URL is malformed.")]
    InvalidUrl,

    /// The scheme is not `coap` or the host is missing.
    #[error("Wrong URL. Protocol is not coap or no hostname found.")]
    WrongUrl,

    /// `--block2` outside of `[1, 6]`.
    #[error("Invalid block2 size, valid range [1..6]\nblock2 1: 32 bytes payload, block2 2: 64 bytes payload...")]
    Block2OutOfRange(i64),

    /// A `-O` argument does not match `key,value`.
    #[error(
        "Error: Option '{0}' is invalid.\n\
         Please provide options in this way:\n\
         -O 2048,HelloWorld\n\
         OR --coap-option 2048,HelloWorld"
    )]
    InvalidOption(String),

    /// A `-O` value starting with `0x` is not valid hexadecimal.
    #[error("Error: Option '{option}' has an invalid hex value: {reason}")]
    InvalidOptionValue { option: String, reason: String },

    /// `--content-format` or `--accept` is neither a number nor a known media type.
    #[error("Invalid content format '{0}'")]
    InvalidContentFormat(String),
}
