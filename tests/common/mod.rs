//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::oneshot;

use vmconsole::pipe::{PipeReader, PipeWriter};
use vmconsole::terminal::{Terminal, TerminalGuard};
use vmconsole::{
    Console, ConsoleClient, ConsoleOptions, ConsoleStream, ConsoleTarget, Interrupts, StreamError,
};

pub type SpyBuffer = Arc<Mutex<Vec<u8>>>;

/// A `Write` that appends into a shared buffer.
#[derive(Clone, Default)]
pub struct SpyWriter {
    pub buffer: SpyBuffer,
}

impl SpyWriter {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }
}

impl Write for SpyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Terminal double that counts raw-mode entries and restores.
#[derive(Clone)]
pub struct FakeTerminal {
    pub interactive: bool,
    pub fail_restore: bool,
    pub entered: Arc<AtomicUsize>,
    pub restored: Arc<AtomicUsize>,
}

impl FakeTerminal {
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            fail_restore: false,
            entered: Arc::new(AtomicUsize::new(0)),
            restored: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn piped() -> Self {
        Self {
            interactive: false,
            ..Self::interactive()
        }
    }

    pub fn failing_restore() -> Self {
        Self {
            fail_restore: true,
            ..Self::interactive()
        }
    }

    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    pub fn restored(&self) -> usize {
        self.restored.load(Ordering::SeqCst)
    }
}

impl Terminal for FakeTerminal {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn enter_raw_mode(&self) -> io::Result<TerminalGuard> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let restored = Arc::clone(&self.restored);
        let fail = self.fail_restore;
        Ok(TerminalGuard::new(move || {
            restored.fetch_add(1, Ordering::SeqCst);
            if fail {
                Err(io::Error::other("tty gone"))
            } else {
                Ok(())
            }
        }))
    }
}

/// Test-side handles of a console built on in-memory streams.
pub struct LocalEnd {
    /// Write here to type into the console.
    pub keyboard: DuplexStream,
    /// Read here to see what the console printed.
    pub screen: DuplexStream,
    pub notice: SpyWriter,
    pub terminal: FakeTerminal,
    pub interrupts: Interrupts,
}

pub type TestConsole = Console<FakeTerminal, DuplexStream, DuplexStream>;

pub fn test_console(terminal: FakeTerminal) -> (TestConsole, LocalEnd) {
    let (keyboard, input) = tokio::io::duplex(4096);
    let (output, screen) = tokio::io::duplex(4096);
    let interrupts = Interrupts::new();
    let notice = SpyWriter::default();
    let console = Console::new(terminal.clone(), interrupts.clone(), input, output)
        .with_notice(notice.clone());

    (
        console,
        LocalEnd {
            keyboard,
            screen,
            notice,
            terminal,
            interrupts,
        },
    )
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Read whatever arrives within `wait`.
pub async fn read_available<R: tokio::io::AsyncRead + Unpin>(reader: &mut R, wait: Duration) -> Vec<u8> {
    let mut collected = Vec::new();
    let mut buf = [0u8; 1024];
    while let Ok(Ok(count)) = tokio::time::timeout(wait, reader.read(&mut buf)).await {
        if count == 0 {
            break;
        }
        collected.extend_from_slice(&buf[..count]);
    }
    collected
}

/// What a scripted stream does once it runs.
pub enum StreamScript {
    /// Echo every input byte back as output until input closes.
    Echo,
    /// Print `banner`, then finish with `result`.
    PrintThenEnd {
        banner: Vec<u8>,
        result: Result<(), StreamError>,
    },
    /// Never finish on its own.
    Hang,
}

pub struct ScriptedStream {
    script: StreamScript,
}

#[async_trait]
impl ConsoleStream for ScriptedStream {
    async fn run(self, source: &mut PipeReader, sink: &mut PipeWriter) -> Result<(), StreamError> {
        match self.script {
            StreamScript::Echo => {
                let mut buf = [0u8; 1024];
                loop {
                    let count = source.read(&mut buf).await?;
                    if count == 0 {
                        return Ok(());
                    }
                    sink.write_all(&buf[..count]).await?;
                }
            }
            StreamScript::PrintThenEnd { banner, result } => {
                sink.write_all(&banner).await?;
                result
            }
            StreamScript::Hang => std::future::pending().await,
        }
    }
}

/// How a scripted client answers `open`.
pub enum OpenScript {
    Succeed(StreamScript),
    Fail(StreamError),
    /// Never answer.
    Hang,
}

/// Console client double driven by a script.
pub struct ScriptedClient {
    script: Mutex<Option<OpenScript>>,
    pub opened_with: Mutex<Option<(ConsoleTarget, ConsoleOptions)>>,
    started: Mutex<Option<oneshot::Sender<()>>>,
}

impl ScriptedClient {
    /// Returns the client and a receiver that fires once `open` is called.
    pub fn new(script: OpenScript) -> (Arc<Self>, oneshot::Receiver<()>) {
        let (started_tx, started_rx) = oneshot::channel();
        let client = Arc::new(Self {
            script: Mutex::new(Some(script)),
            opened_with: Mutex::new(None),
            started: Mutex::new(Some(started_tx)),
        });
        (client, started_rx)
    }
}

#[async_trait]
impl ConsoleClient for ScriptedClient {
    type Stream = ScriptedStream;

    async fn open(
        &self,
        target: &ConsoleTarget,
        options: &ConsoleOptions,
    ) -> Result<Self::Stream, StreamError> {
        *self.opened_with.lock() = Some((target.clone(), *options));
        if let Some(started) = self.started.lock().take() {
            let _ = started.send(());
        }

        let script = self.script.lock().take();
        match script {
            Some(OpenScript::Succeed(script)) => Ok(ScriptedStream { script }),
            Some(OpenScript::Fail(err)) => Err(err),
            Some(OpenScript::Hang) | None => std::future::pending().await,
        }
    }
}
