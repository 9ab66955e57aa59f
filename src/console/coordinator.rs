//! Picks the one event that ends an attached session.

use std::future::Future;
use std::io;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ConsoleError;
use crate::stream::StreamError;

/// The event that ended an attached session.
#[derive(Debug)]
pub enum Termination {
    /// The user interrupted the session.
    Interrupted,
    /// Relaying console output to the terminal stopped.
    ReadStopped(io::Result<()>),
    /// Relaying terminal input to the console stopped.
    WriteStopped(io::Result<()>),
    /// The remote stream itself finished.
    StreamEnded(Result<(), StreamError>),
}

impl Termination {
    pub fn into_result(self) -> Result<(), ConsoleError> {
        match self {
            Termination::Interrupted => Ok(()),
            Termination::ReadStopped(result) => result.map_err(ConsoleError::Output),
            Termination::WriteStopped(result) => result.map_err(ConsoleError::Input),
            Termination::StreamEnded(result) => result.map_err(ConsoleError::Stream),
        }
    }
}

/// Wait for whichever of the four session events happens first.
///
/// No event has priority over another. The losing tasks are not cancelled:
/// their handles are dropped, which detaches them, and they end on their own
/// once their pipes close or the process exits.
pub async fn first_termination<F>(
    stop: &mut mpsc::Receiver<()>,
    read_task: JoinHandle<io::Result<()>>,
    write_task: JoinHandle<io::Result<()>>,
    stream_done: F,
) -> Termination
where
    F: Future<Output = Result<(), StreamError>>,
{
    tokio::select! {
        Some(()) = stop.recv() => Termination::Interrupted,
        result = read_task => Termination::ReadStopped(flatten(result)),
        result = write_task => Termination::WriteStopped(flatten(result)),
        result = stream_done => Termination::StreamEnded(result),
    }
}

fn flatten(result: Result<io::Result<()>, tokio::task::JoinError>) -> io::Result<()> {
    result.unwrap_or_else(|err| Err(io::Error::other(err)))
}
