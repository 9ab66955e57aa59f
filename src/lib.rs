//! Interactive serial console access for virtual machine instances.
//!
//! The [`session`] module opens a remote console stream and hands it to
//! [`console::Console::attach`], which relays bytes between the local terminal
//! and the stream until the user detaches, an interrupt arrives, or either
//! side of the stream ends.

pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod interrupt;
pub mod logging;
pub mod pipe;
pub mod session;
pub mod stream;
pub mod terminal;

pub use console::{describe_error, Console, RemoteIo};
pub use error::ConsoleError;
pub use interrupt::Interrupts;
pub use session::{open_session, SessionOutcome};
pub use stream::{ConsoleClient, ConsoleOptions, ConsoleStream, ConsoleTarget, StreamError};
