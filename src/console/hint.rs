use std::io::Write;

use crate::error::ConsoleError;

const DISCONNECTED_HINT: &str = "\n\
You were disconnected from the console. This could be caused by one of the following:\n \
- the target VM was powered off\n \
- another user connected to the console of the target VM\n \
- network issues\n";

/// Explain an abnormal disconnect to the user. Other errors print nothing.
pub fn describe_error<W: Write + ?Sized>(err: &ConsoleError, out: &mut W) {
    if !err.is_abnormal_closure() {
        return;
    }
    if let Err(write_err) = out.write_all(DISCONNECTED_HINT.as_bytes()) {
        tracing::debug!("Failed to print disconnect hint: {}", write_err);
    }
}
