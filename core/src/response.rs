//! Formats response events for the terminal.
//!
//! # Design
//! `ResponseTransformer` is a small state machine fed one `ResponseEvent` at
//! a time. For each event it returns a `Step`: the bytes for the diagnostic
//! stream, the bytes for the primary output and what the caller should do
//! next. The caller writes the diagnostic bytes first, then the output, and
//! performs any exit itself.
//!
//! An empty first response (an acknowledgement-only reply such as `4.04`
//! without a body) ends the invocation at once with status 0. The transport
//! gives no reliable end-of-stream for such replies, so the caller must not
//! wait for one.

use crate::config::Config;
use crate::message::ResponseEvent;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    AwaitingFirstEvent,
    Streaming,
    Terminated,
}

/// What the caller does after writing a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Keep consuming events.
    Continue,
    /// The stream ended normally; let the process finish.
    Finished,
    /// Stop consuming and exit with this status right away.
    Exit(u8),
}

/// Output produced for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Set on the first event of the exchange.
    pub first_response: bool,
    pub diagnostic: Option<Vec<u8>>,
    pub output: Option<Vec<u8>>,
    pub next: Next,
}

impl Step {
    fn ignored() -> Self {
        Self {
            first_response: false,
            diagnostic: None,
            output: None,
            next: Next::Finished,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponseTransformer {
    quiet: bool,
    new_line: bool,
    state: StreamState,
}

impl ResponseTransformer {
    pub fn new(config: &Config) -> Self {
        Self {
            quiet: config.quiet,
            new_line: config.new_line,
            state: StreamState::AwaitingFirstEvent,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn on_event(&mut self, event: &ResponseEvent) -> Step {
        let first_response = match self.state {
            StreamState::Terminated => return Step::ignored(),
            StreamState::AwaitingFirstEvent => true,
            StreamState::Streaming => false,
        };

        if first_response && event.payload.is_empty() {
            self.state = StreamState::Terminated;
            return Step {
                first_response,
                diagnostic: self.marker(&event.status_code, "\n"),
                output: None,
                next: Next::Exit(0),
            };
        }

        let output = if event.payload.is_empty() {
            None
        } else {
            let mut chunk = event.payload.clone();
            if self.new_line {
                chunk.push(b'\n');
            }
            Some(chunk)
        };

        let next = if event.is_final {
            self.state = StreamState::Terminated;
            Next::Finished
        } else {
            self.state = StreamState::Streaming;
            Next::Continue
        };

        Step {
            first_response,
            diagnostic: self.marker(&event.status_code, "\t"),
            output,
            next,
        }
    }

    fn marker(&self, code: &str, terminator: &str) -> Option<Vec<u8>> {
        if self.quiet {
            return None;
        }
        Some(format!("{BOLD}({code}){RESET}{terminator}").into_bytes())
    }
}
