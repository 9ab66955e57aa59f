//! Opening a console session.
//!
//! ```text
//! in  -> input writer  | input reader  -> console
//! out <- output reader | output writer <- console
//! ```

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;

use crate::console::{Console, RemoteIo};
use crate::error::ConsoleError;
use crate::pipe::{pipe, PipeReader, PipeWriter};
use crate::stream::{ConsoleClient, ConsoleOptions, ConsoleStream, ConsoleTarget, StreamError};
use crate::terminal::Terminal;

/// Minutes to wait for the console to open when nothing else is configured.
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 5;

/// How a session that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Interrupted before the console was opened.
    Interrupted,
    /// Attached, then detached or closed without error.
    Detached,
}

/// A finished stream's result. The stream's pipe ends travel with it and only
/// close once the result has been picked up.
struct StreamEnd {
    result: Result<(), StreamError>,
    _pipes: (PipeReader, PipeWriter),
}

/// The line printed once the console is open.
pub fn connection_message(vmi: &str) -> String {
    format!("Successfully connected to {vmi} console. Press Ctrl+] or Ctrl+5 to exit console.\n")
}

/// Open the console of `target` and attach `console` to it.
///
/// Opening runs in its own task and races the console's interrupt source.
/// An interrupt that arrives first abandons the attempt: the task keeps
/// running in the background and its result is ignored. An open error is
/// returned without touching the terminal.
pub async fn open_session<C, T, I, O>(
    client: Arc<C>,
    mut console: Console<T, I, O>,
    target: ConsoleTarget,
    timeout_minutes: u64,
) -> Result<SessionOutcome, ConsoleError>
where
    C: ConsoleClient + 'static,
    T: Terminal,
    I: AsyncRead + Unpin + Send + 'static,
    O: AsyncWrite + Unpin + Send + 'static,
{
    let (input_reader, input_writer) = pipe();
    let (output_reader, output_writer) = pipe();

    let mut interrupt = console.interrupts().subscribe();
    let (opened_tx, opened_rx) = oneshot::channel::<Result<(), StreamError>>();
    let (done_tx, done_rx) = oneshot::channel::<StreamEnd>();

    let options = ConsoleOptions::from_minutes(timeout_minutes);
    let open_target = target.clone();
    tokio::spawn(async move {
        tracing::info!(
            "Opening console of {} (timeout {:?})",
            open_target,
            options.connection_timeout
        );
        let stream = match client.open(&open_target, &options).await {
            Ok(stream) => stream,
            Err(err) => {
                let _ = opened_tx.send(Err(err));
                return;
            }
        };
        if opened_tx.send(Ok(())).is_err() {
            tracing::debug!("Console of {} opened after the session was abandoned", open_target);
        }

        let mut pipes = (input_reader, output_writer);
        let result = stream.run(&mut pipes.0, &mut pipes.1).await;
        tracing::debug!("Console stream of {} finished: {:?}", open_target, result);
        let _ = done_tx.send(StreamEnd {
            result,
            _pipes: pipes,
        });
    });

    tokio::select! {
        _ = interrupt.recv() => {
            tracing::info!("Interrupted while waiting for the console of {}", target);
            console.newline().await;
            return Ok(SessionOutcome::Interrupted);
        }
        opened = opened_rx => {
            let opened = opened.unwrap_or(Err(StreamError::Aborted));
            if let Err(source) = opened {
                return Err(ConsoleError::Connection {
                    target: target.name,
                    source,
                });
            }
        }
    }

    tracing::info!("Connected to console of {}", target);
    let stream_done = async move {
        match done_rx.await {
            Ok(end) => end.result,
            Err(_) => Err(StreamError::Aborted),
        }
    };
    let remote = RemoteIo {
        sink: input_writer,
        source: output_reader,
    };
    console
        .attach(remote, &connection_message(&target.name), stream_done)
        .await?;
    Ok(SessionOutcome::Detached)
}
