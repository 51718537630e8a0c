//! Command-line surface: `coap [options] [<verb>] <url>`.

use clap::{Args, Parser, Subcommand};
use coap_cli_core::{CoapMethod, Config};

#[derive(Debug, Parser)]
#[command(
    name = "coap",
    version,
    about = "A CLI for CoAP: GET, PUT, POST, DELETE and observe coap:// resources",
    subcommand_precedence_over_arg = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub verb: Option<Verb>,

    /// Resource to GET when no verb is given, e.g. coap://localhost/hello
    pub url: Option<String>,

    #[command(flatten)]
    pub flags: Flags,
}

#[derive(Debug, Subcommand)]
pub enum Verb {
    /// Performs a GET request
    Get { url: String },
    /// Performs a PUT request
    Put { url: String },
    /// Performs a POST request
    Post { url: String },
    /// Performs a DELETE request
    Delete { url: String },
}

#[derive(Debug, Args)]
pub struct Flags {
    /// Observe the given resource
    #[arg(short = 'o', long, global = true)]
    pub observe: bool,

    /// No new line at the end of the stream
    #[arg(short = 'n', long = "no-new-line", global = true)]
    pub no_new_line: bool,

    /// The payload for POST and PUT requests
    #[arg(short = 'p', long, global = true)]
    pub payload: Option<String>,

    /// Set the block2 size option (1: 32 bytes, 2: 64 bytes ... 6: 1024 bytes)
    #[arg(short = 'b', long, global = true, value_name = "SIZE", allow_negative_numbers = true)]
    pub block2: Option<i64>,

    /// Do not print status codes of received packets
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Send a non-confirmable request
    #[arg(short = 'c', long = "non-confirmable", global = true)]
    pub non_confirmable: bool,

    /// The maximum send time in seconds
    #[arg(short = 't', long, global = true, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Print request time, handy for simple performance tests
    #[arg(short = 'T', long = "show-timing", global = true)]
    pub show_timing: bool,

    /// Add a CoAP option to the request, e.g. -O 2048,HelloWorld (repeatable)
    #[arg(short = 'O', long = "coap-option", global = true, value_name = "KEY,VALUE")]
    pub coap_option: Vec<String>,

    /// Include a Content-Format option in the request
    #[arg(short = 'C', long = "content-format", global = true, value_name = "FORMAT")]
    pub content_format: Option<String>,

    /// Include an Accept option in the request
    #[arg(short = 'a', long, global = true, value_name = "FORMAT")]
    pub accept: Option<String>,
}

impl Cli {
    /// Split into the method, the URL (if any) and the invocation settings.
    pub fn into_parts(self) -> (CoapMethod, Option<String>, Config) {
        let (method, url) = match self.verb {
            Some(Verb::Get { url }) => (CoapMethod::Get, Some(url)),
            Some(Verb::Put { url }) => (CoapMethod::Put, Some(url)),
            Some(Verb::Post { url }) => (CoapMethod::Post, Some(url)),
            Some(Verb::Delete { url }) => (CoapMethod::Delete, Some(url)),
            None => (CoapMethod::Get, self.url),
        };
        (method, url, self.flags.into())
    }
}

impl From<Flags> for Config {
    fn from(flags: Flags) -> Self {
        Config {
            observe: flags.observe,
            new_line: !flags.no_new_line,
            payload: flags.payload,
            block2: flags.block2,
            quiet: flags.quiet,
            non_confirmable: flags.non_confirmable,
            timeout: flags.timeout,
            show_timing: flags.show_timing,
            coap_options: flags.coap_option,
            content_format: flags.content_format,
            accept: flags.accept,
        }
    }
}
