//! Byte relays between the local terminal and the remote console.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Ctrl+]. Detaches from the console when it starts an input chunk.
pub const ESCAPE_BYTE: u8 = 29;

/// Size of the chunks read from local input.
pub const CHUNK_SIZE: usize = 1024;

/// Whether a chunk read from local input asks to detach.
///
/// Only the first byte is inspected: an escape byte later in the chunk is
/// forwarded like any other byte.
pub fn is_escape(chunk: &[u8]) -> bool {
    chunk.first() == Some(&ESCAPE_BYTE)
}

/// Copy console output to the local terminal until the console side ends.
pub async fn copy_output<R, W>(mut source: R, mut local_out: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let copied = tokio::io::copy(&mut source, &mut local_out).await?;
    local_out.flush().await?;
    tracing::debug!("Console output ended after {} bytes", copied);
    Ok(())
}

/// Copy local input to the console sink in chunks of [`CHUNK_SIZE`].
///
/// Stops cleanly on local end-of-stream, on an escape chunk, or when the sink
/// has been closed. Read errors and other write errors are returned.
pub async fn copy_input<R, W>(mut local_in: R, mut sink: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let count = local_in.read(&mut buf).await?;
        if count == 0 {
            tracing::debug!("Local input reached end of stream");
            return Ok(());
        }

        let chunk = &buf[..count];
        if is_escape(chunk) {
            tracing::info!("Escape sequence received, detaching");
            return Ok(());
        }

        if let Err(err) = forward(&mut sink, chunk).await {
            if is_closed(&err) {
                tracing::debug!("Console input closed: {}", err);
                return Ok(());
            }
            return Err(err);
        }
    }
}

async fn forward<W: AsyncWrite + Unpin>(sink: &mut W, chunk: &[u8]) -> io::Result<()> {
    sink.write_all(chunk).await?;
    sink.flush().await
}

fn is_closed(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof | io::ErrorKind::WriteZero
    )
}
