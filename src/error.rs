//! Error types for console sessions.
//!
//! Every way a session can end badly maps to one [`ConsoleError`] variant.
//! A user interrupt or detach is not an error and never shows up here.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::stream::{CloseKind, StreamError};

/// Errors that end a console session.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The remote console stream could not be opened.
    #[error("Cannot connect to console of '{target}': {source}")]
    Connection {
        target: String,
        #[source]
        source: StreamError,
    },

    /// The remote stream ended with an error after attaching.
    #[error("Console stream failed: {0}")]
    Stream(#[source] StreamError),

    /// Reading local input, or forwarding it to the console, failed.
    #[error("Failed to relay local input: {0}")]
    Input(#[source] io::Error),

    /// Relaying console output to the local terminal failed.
    #[error("Failed to relay console output: {0}")]
    Output(#[source] io::Error),

    /// The local terminal could not be switched to raw mode.
    #[error("Failed to make raw terminal: {0}")]
    RawMode(#[source] io::Error),

    /// The local terminal could not be restored.
    #[error("Failed to restore terminal: {0}")]
    Restore(#[source] io::Error),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ConsoleError {
    /// The stream error behind this error, if the remote side caused it.
    pub fn stream_error(&self) -> Option<&StreamError> {
        match self {
            ConsoleError::Connection { source, .. } => Some(source),
            ConsoleError::Stream(source) => Some(source),
            _ => None,
        }
    }

    /// Whether the remote peer vanished without a closing handshake.
    pub fn is_abnormal_closure(&self) -> bool {
        self.stream_error()
            .is_some_and(|err| err.close_kind() == CloseKind::Abnormal)
    }
}
