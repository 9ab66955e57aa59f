use std::io::{self, IsTerminal};

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use crate::error::ConsoleError;

type RestoreFn = Box<dyn FnOnce() -> io::Result<()> + Send + 'static>;

/// Owns captured terminal state and puts it back exactly once.
///
/// Call [`TerminalGuard::restore`] to learn whether restoring worked. If the
/// guard is dropped without that (a panic, or a cancelled attach), the state
/// is restored on drop and the error is discarded.
pub struct TerminalGuard {
    cleanup: Option<RestoreFn>,
}

impl TerminalGuard {
    pub fn new<F>(cleanup: F) -> Self
    where
        F: FnOnce() -> io::Result<()> + Send + 'static,
    {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    /// A guard with nothing to restore, used when input is not a terminal.
    pub fn noop() -> Self {
        Self { cleanup: None }
    }

    pub fn restore(mut self) -> io::Result<()> {
        match self.cleanup.take() {
            Some(cleanup) => cleanup(),
            None => Ok(()),
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            let _ = cleanup();
        }
    }
}

/// The local terminal a console is attached to.
pub trait Terminal {
    /// Whether local input comes from an interactive terminal.
    fn is_interactive(&self) -> bool;

    /// Switch to raw mode, returning a guard that switches back.
    fn enter_raw_mode(&self) -> io::Result<TerminalGuard>;
}

/// The process's own terminal, driven through crossterm.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdTerminal;

impl Terminal for StdTerminal {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn enter_raw_mode(&self) -> io::Result<TerminalGuard> {
        enable_raw_mode()?;
        Ok(TerminalGuard::new(disable_raw_mode))
    }
}

/// Enter raw mode when `terminal` is interactive; otherwise do nothing.
pub fn setup_raw_terminal<T: Terminal + ?Sized>(terminal: &T) -> Result<TerminalGuard, ConsoleError> {
    if !terminal.is_interactive() {
        return Ok(TerminalGuard::noop());
    }
    terminal.enter_raw_mode().map_err(ConsoleError::RawMode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingTerminal {
        interactive: bool,
        entered: Arc<AtomicUsize>,
        restored: Arc<AtomicUsize>,
    }

    impl CountingTerminal {
        fn new(interactive: bool) -> Self {
            Self {
                interactive,
                entered: Arc::new(AtomicUsize::new(0)),
                restored: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Terminal for CountingTerminal {
        fn is_interactive(&self) -> bool {
            self.interactive
        }

        fn enter_raw_mode(&self) -> io::Result<TerminalGuard> {
            self.entered.fetch_add(1, Ordering::SeqCst);
            let restored = Arc::clone(&self.restored);
            Ok(TerminalGuard::new(move || {
                restored.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
        }
    }

    #[test]
    fn test_non_interactive_terminal_is_left_alone() {
        let terminal = CountingTerminal::new(false);
        let guard = setup_raw_terminal(&terminal).unwrap();
        guard.restore().unwrap();
        assert_eq!(terminal.entered.load(Ordering::SeqCst), 0);
        assert_eq!(terminal.restored.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_restore_runs_once_when_called() {
        let terminal = CountingTerminal::new(true);
        let guard = setup_raw_terminal(&terminal).unwrap();
        guard.restore().unwrap();
        assert_eq!(terminal.entered.load(Ordering::SeqCst), 1);
        assert_eq!(terminal.restored.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_restore_runs_on_drop() {
        let terminal = CountingTerminal::new(true);
        {
            let _guard = setup_raw_terminal(&terminal).unwrap();
        }
        assert_eq!(terminal.restored.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_restore_error_is_reported() {
        let guard = TerminalGuard::new(|| Err(io::Error::other("tty gone")));
        let err = guard.restore().unwrap_err();
        assert_eq!(err.to_string(), "tty gone");
    }

    #[test]
    fn test_raw_mode_failure_maps_to_console_error() {
        struct BrokenTerminal;
        impl Terminal for BrokenTerminal {
            fn is_interactive(&self) -> bool {
                true
            }
            fn enter_raw_mode(&self) -> io::Result<TerminalGuard> {
                Err(io::Error::other("no tty"))
            }
        }

        let err = setup_raw_terminal(&BrokenTerminal).err().unwrap();
        assert!(matches!(err, ConsoleError::RawMode(_)));
    }
}
