//! Remote console stream abstraction.
//!
//! A [`ConsoleClient`] opens a [`ConsoleStream`] for a target machine. The
//! stream is then run against a local source (bytes typed by the user) and a
//! local sink (bytes the console prints) until either side ends.

mod websocket;

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::pipe::{PipeReader, PipeWriter};

pub use websocket::{WebSocketClient, WebSocketConsole};

/// Close code for a graceful websocket shutdown.
pub const NORMAL_CLOSURE: u16 = 1000;
/// Close code reported when the peer vanished without a closing handshake.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// How a stream closure should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    Graceful,
    Abnormal,
    /// The error is not a closure at all.
    None,
}

/// Errors produced while opening or running a console stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Opening did not finish within the connection timeout.
    #[error("Timed out after {timeout:?} waiting for the console")]
    Timeout { timeout: Duration },

    /// The connection request could not be built.
    #[error("Invalid console request: {0}")]
    InvalidRequest(String),

    /// The remote side closed the stream.
    #[error("Console closed with code {code}{}", reason_suffix(.reason))]
    Closed { code: u16, reason: String },

    /// The task driving the stream went away without reporting a result.
    #[error("Console stream aborted")]
    Aborted,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[source] tungstenite::Error),
}

impl StreamError {
    /// Classify the error as a graceful close, an abnormal close, or neither.
    pub fn close_kind(&self) -> CloseKind {
        match self {
            StreamError::Closed { code, .. } if *code == ABNORMAL_CLOSURE => CloseKind::Abnormal,
            StreamError::Closed { code, .. } if *code == NORMAL_CLOSURE => CloseKind::Graceful,
            _ => CloseKind::None,
        }
    }
}

fn reason_suffix(reason: &str) -> String {
    if reason.is_empty() {
        String::new()
    } else {
        format!(": {reason}")
    }
}

impl From<tungstenite::Error> for StreamError {
    fn from(err: tungstenite::Error) -> Self {
        use tungstenite::error::ProtocolError;

        let abnormal = match &err {
            tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
            tungstenite::Error::Io(io_err) => matches!(
                io_err.kind(),
                io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset
            ),
            _ => false,
        };

        if abnormal {
            StreamError::Closed {
                code: ABNORMAL_CLOSURE,
                reason: err.to_string(),
            }
        } else {
            StreamError::WebSocket(err)
        }
    }
}

/// The machine whose console is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleTarget {
    pub namespace: String,
    pub name: String,
}

impl ConsoleTarget {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ConsoleTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Options for opening a console stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleOptions {
    /// Upper bound on how long opening may take.
    pub connection_timeout: Duration,
}

impl ConsoleOptions {
    pub fn from_minutes(minutes: u64) -> Self {
        Self {
            connection_timeout: Duration::from_secs(minutes.saturating_mul(60)),
        }
    }
}

/// Opens console streams.
#[async_trait]
pub trait ConsoleClient: Send + Sync {
    type Stream: ConsoleStream + 'static;

    /// Open the console of `target`, giving up after `options.connection_timeout`.
    async fn open(
        &self,
        target: &ConsoleTarget,
        options: &ConsoleOptions,
    ) -> Result<Self::Stream, StreamError>;
}

/// An opened console stream.
#[async_trait]
pub trait ConsoleStream: Send {
    /// Relay `source` to the remote console and the console's output to `sink`.
    ///
    /// Returns once either direction ends. A graceful close yields `Ok(())`.
    /// The pipes stay with the caller, so they are not closed by returning.
    async fn run(self, source: &mut PipeReader, sink: &mut PipeWriter) -> Result<(), StreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_kind_classification() {
        let abnormal = StreamError::Closed {
            code: ABNORMAL_CLOSURE,
            reason: String::new(),
        };
        let normal = StreamError::Closed {
            code: NORMAL_CLOSURE,
            reason: String::new(),
        };
        let going_away = StreamError::Closed {
            code: 1001,
            reason: "bye".to_string(),
        };

        assert_eq!(abnormal.close_kind(), CloseKind::Abnormal);
        assert_eq!(normal.close_kind(), CloseKind::Graceful);
        assert_eq!(going_away.close_kind(), CloseKind::None);
        assert_eq!(StreamError::Aborted.close_kind(), CloseKind::None);
    }

    #[test]
    fn test_reset_without_handshake_is_abnormal() {
        let err: StreamError = tungstenite::Error::Protocol(
            tungstenite::error::ProtocolError::ResetWithoutClosingHandshake,
        )
        .into();
        assert_eq!(err.close_kind(), CloseKind::Abnormal);
    }

    #[test]
    fn test_unexpected_eof_is_abnormal() {
        let err: StreamError =
            tungstenite::Error::Io(io::Error::from(io::ErrorKind::UnexpectedEof)).into();
        assert_eq!(err.close_kind(), CloseKind::Abnormal);
    }

    #[test]
    fn test_closed_message_includes_reason() {
        let err = StreamError::Closed {
            code: 1001,
            reason: "going away".to_string(),
        };
        assert_eq!(err.to_string(), "Console closed with code 1001: going away");
    }

    #[test]
    fn test_options_from_minutes() {
        let options = ConsoleOptions::from_minutes(5);
        assert_eq!(options.connection_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_target_display() {
        assert_eq!(ConsoleTarget::new("default", "testvm").to_string(), "default/testvm");
    }
}
