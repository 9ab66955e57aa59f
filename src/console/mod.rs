//! Attaching the local terminal to a remote console.
//!
//! ```text
//! local input  -> copy_input  -> sink   | pipe | remote stream
//! local output <- copy_output <- source | pipe | remote stream
//! ```

mod attach;
pub mod copier;
pub mod coordinator;
mod hint;

pub use attach::{Console, RemoteIo};
pub use copier::{CHUNK_SIZE, ESCAPE_BYTE};
pub use coordinator::Termination;
pub use hint::describe_error;
