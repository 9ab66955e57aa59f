//! Unidirectional in-memory byte pipes.
//!
//! Each pipe has exactly one writer end and one reader end. Dropping the
//! writer makes the reader see end-of-stream; dropping the reader makes
//! further writes fail with [`io::ErrorKind::BrokenPipe`].

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};

/// Bytes buffered inside a pipe before the writer has to wait.
pub const PIPE_CAPACITY: usize = 64 * 1024;

/// Reading end of a [`pipe`].
#[derive(Debug)]
pub struct PipeReader {
    inner: DuplexStream,
}

/// Writing end of a [`pipe`].
#[derive(Debug)]
pub struct PipeWriter {
    inner: DuplexStream,
}

/// Create a pipe with the default capacity.
pub fn pipe() -> (PipeReader, PipeWriter) {
    pipe_with_capacity(PIPE_CAPACITY)
}

pub fn pipe_with_capacity(capacity: usize) -> (PipeReader, PipeWriter) {
    let (write_end, read_end) = tokio::io::duplex(capacity);
    (
        PipeReader { inner: read_end },
        PipeWriter { inner: write_end },
    )
}

impl AsyncRead for PipeReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for PipeWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
