//! Request construction and response formatting for the `coap` command-line client.
//!
//! # Overview
//! Builds `RequestDescriptor` values from command-line intent and turns
//! `ResponseEvent`s into terminal output without touching the network
//! (host-does-IO pattern). The binary executes the CoAP exchange and the
//! writes.
//!
//! # Design
//! - `CoapClient` holds only the invocation `Config`.
//! - Requests go through `build_request` (validation + descriptor) and
//!   responses through `ResponseTransformer::on_event` (one `Step` per event),
//!   so the I/O boundary is explicit.
//! - Nothing here exits the process. Usage problems come back as
//!   `UsageError` and the binary decides the exit status.

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod message;
pub mod options;
pub mod response;
pub mod timing;

pub use client::CoapClient;
pub use config::Config;
pub use error::UsageError;
pub use message::{format_code, CoapMethod, Payload, RequestDescriptor, ResponseEvent};
pub use options::{collect_options, parse_option, OptionGroup, ProtocolOption};
pub use response::{Next, ResponseTransformer, Step, StreamState};
pub use timing::{format_elapsed, RequestTimer};
