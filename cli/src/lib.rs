//! The `coap` command-line client.
//!
//! # Overview
//! Parses the command line into a `Config`, lets the core build the request,
//! performs the exchange over UDP and prints the responses. `run` returns an
//! `Outcome` or a `CliError`; only `main` turns that into an exit status.

pub mod args;
pub mod error;
pub mod output;
pub mod transport;

use std::io::IsTerminal;

use coap_cli_core::{CoapClient, Payload, RequestTimer};
use log::debug;

pub use args::Cli;
pub use error::{CliError, TransportError};
pub use output::{Outcome, Printer};
pub use transport::Exchange;

/// Execute one invocation against the real standard streams.
pub async fn run(cli: Cli) -> Result<Outcome, CliError> {
    let (method, url, config) = cli.into_parts();
    let client = CoapClient::new(config);
    let config = client.config();

    let payload = Payload::resolve(
        method,
        config.payload.as_deref(),
        std::io::stdin().is_terminal(),
    );
    let request = client.build_request(method, url.as_deref(), payload)?;
    debug!("request: {request:?}");

    let mut timer = RequestTimer::start();
    let exchange = Exchange::send(request, config.exchange_lifetime()).await?;

    let mut printer = Printer::new(tokio::io::stdout(), tokio::io::stderr(), config.show_timing);
    printer
        .drive(exchange.into_events(), client.transformer(), &mut timer)
        .await
}
