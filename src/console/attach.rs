use std::future::Future;
use std::io::{self, Write};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, Stdin, Stdout};
use tokio::sync::mpsc;

use super::copier::{copy_input, copy_output};
use super::coordinator::first_termination;
use crate::error::ConsoleError;
use crate::interrupt::Interrupts;
use crate::stream::StreamError;
use crate::terminal::{setup_raw_terminal, StdTerminal, Terminal};

/// The remote ends a console attaches to.
pub struct RemoteIo<S, R> {
    /// Receives the bytes typed locally.
    pub sink: S,
    /// Produces the bytes the console prints.
    pub source: R,
}

/// The local side of a console session.
///
/// `notice` is the user-facing message stream (stderr by default). It is kept
/// apart from `output`, which carries nothing but console data.
pub struct Console<T, I, O> {
    terminal: T,
    interrupts: Interrupts,
    input: I,
    output: O,
    notice: Box<dyn Write + Send>,
}

impl Console<StdTerminal, Stdin, Stdout> {
    /// A console on the process's own stdin, stdout and stderr.
    pub fn stdio(interrupts: Interrupts) -> Self {
        Self::new(
            StdTerminal,
            interrupts,
            tokio::io::stdin(),
            tokio::io::stdout(),
        )
    }
}

impl<T, I, O> Console<T, I, O> {
    pub fn new(terminal: T, interrupts: Interrupts, input: I, output: O) -> Self {
        Self {
            terminal,
            interrupts,
            input,
            output,
            notice: Box::new(io::stderr()),
        }
    }

    pub fn with_notice<W: Write + Send + 'static>(mut self, notice: W) -> Self {
        self.notice = Box::new(notice);
        self
    }

    pub fn interrupts(&self) -> &Interrupts {
        &self.interrupts
    }

    fn notify(&mut self, message: &str) {
        let written = self
            .notice
            .write_all(message.as_bytes())
            .and_then(|()| self.notice.flush());
        if let Err(err) = written {
            tracing::debug!("Failed to print notice: {}", err);
        }
    }
}

impl<T, I, O> Console<T, I, O>
where
    T: Terminal,
    I: AsyncRead + Unpin + Send + 'static,
    O: AsyncWrite + Unpin + Send + 'static,
{
    /// Print an empty line on the console output.
    pub(crate) async fn newline(&mut self) {
        let written = async {
            self.output.write_all(b"\n").await?;
            self.output.flush().await
        };
        if let Err(err) = written.await {
            tracing::debug!("Failed to print newline: {}", err);
        }
    }

    /// Relay between this console and `remote` until the session ends.
    ///
    /// Runs three tasks: an interrupt watcher, an output copier
    /// (`remote.source` to local output) and an input copier (local input to
    /// `remote.sink`). Together with `stream_done` they race, and the first to
    /// finish decides the result. The losers are left running until their
    /// pipes close or the process exits.
    ///
    /// If local input is a terminal it is held in raw mode for the duration
    /// and restored exactly once before returning. A restore failure is only
    /// reported when the session itself ended cleanly.
    pub async fn attach<S, R, F>(
        mut self,
        remote: RemoteIo<S, R>,
        message: &str,
        stream_done: F,
    ) -> Result<(), ConsoleError>
    where
        S: AsyncWrite + Unpin + Send + 'static,
        R: AsyncRead + Unpin + Send + 'static,
        F: Future<Output = Result<(), StreamError>>,
    {
        let guard = setup_raw_terminal(&self.terminal)?;

        self.notify(message);

        let (stop_tx, mut stop_rx) = mpsc::channel(1);
        let mut interrupt = self.interrupts.subscribe();
        tokio::spawn(async move {
            interrupt.recv().await;
            let _ = stop_tx.try_send(());
        });

        let read_task = tokio::spawn(copy_output(remote.source, self.output));
        let write_task = tokio::spawn(copy_input(self.input, remote.sink));

        let termination = first_termination(&mut stop_rx, read_task, write_task, stream_done).await;
        tracing::info!("Console session ended: {:?}", termination);

        let result = termination.into_result();
        let restored = guard.restore();
        match (result, restored) {
            (Err(err), _) => Err(err),
            (Ok(()), Err(err)) => Err(ConsoleError::Restore(err)),
            (Ok(()), Ok(())) => Ok(()),
        }
    }
}
