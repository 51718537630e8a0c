//! Drives the response stream into standard output and standard error.
//!
//! Every write is awaited and flushed before the next event is taken from
//! the stream.

use coap_cli_core::{format_elapsed, Next, RequestTimer, ResponseEvent, ResponseTransformer};
use futures::{pin_mut, Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{CliError, TransportError};

/// How the stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The transport finished the stream.
    Completed,
    /// Stop now with this exit status.
    Exit(u8),
}

/// Destination for payloads (`out`) and status markers (`diag`).
pub struct Printer<O, D> {
    out: O,
    diag: D,
    show_timing: bool,
}

impl<O, D> Printer<O, D>
where
    O: AsyncWrite + Unpin,
    D: AsyncWrite + Unpin,
{
    pub fn new(out: O, diag: D, show_timing: bool) -> Self {
        Self {
            out,
            diag,
            show_timing,
        }
    }

    /// Consume `events` until the transformer finishes or asks to exit.
    pub async fn drive<S>(
        &mut self,
        events: S,
        mut transformer: ResponseTransformer,
        timer: &mut RequestTimer,
    ) -> Result<Outcome, CliError>
    where
        S: Stream<Item = Result<ResponseEvent, TransportError>>,
    {
        pin_mut!(events);
        while let Some(event) = events.next().await {
            let step = transformer.on_event(&event?);

            if step.first_response {
                let elapsed = timer.mark_first_response();
                if self.show_timing {
                    self.diag.write_all(format_elapsed(elapsed).as_bytes()).await?;
                    self.diag.flush().await?;
                }
            }
            if let Some(marker) = step.diagnostic {
                self.diag.write_all(&marker).await?;
                self.diag.flush().await?;
            }
            if let Some(chunk) = step.output {
                self.out.write_all(&chunk).await?;
                self.out.flush().await?;
            }

            match step.next {
                Next::Continue => {}
                Next::Finished => break,
                Next::Exit(code) => return Ok(Outcome::Exit(code)),
            }
        }
        Ok(Outcome::Completed)
    }

    pub fn into_inner(self) -> (O, D) {
        (self.out, self.diag)
    }
}
