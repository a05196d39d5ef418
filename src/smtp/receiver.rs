//! Background reader turning raw socket bytes into complete reply lines.

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Socket read chunk size.
const CHUNK_SIZE: usize = 1024;

/// Accumulates received bytes and hands out one newline-terminated line at a
/// time.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Creates an empty buffer.
    pub fn new() -> LineBuffer {
        LineBuffer::default()
    }

    /// Appends received bytes to the buffer.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Extracts the first complete line, if any.
    ///
    /// Returns everything before the first `\n` with one trailing `\r`
    /// stripped, draining the consumed bytes (terminator included) from the
    /// front of the buffer. Returns `None` and leaves the buffer untouched
    /// when no full line has arrived yet. Never blocks.
    pub fn try_read_line(&mut self) -> Option<String> {
        let newline = self.buf.iter().position(|&b| b == b'\n')?;
        let mut end = newline;
        if end > 0 && self.buf[end - 1] == b'\r' {
            end -= 1;
        }
        let line = String::from_utf8_lossy(&self.buf[..end]).into_owned();
        self.buf.drain(..=newline);
        Some(line)
    }
}

/// Spawns the background receiver task.
///
/// The task performs the only blocking read of the session: it pulls chunks
/// off `reader`, feeds them through a [`LineBuffer`] and forwards every
/// complete line over `lines`. It exits on read error, on end of stream, or
/// when `shutdown` fires; the engine observes any exit as the line channel
/// closing.
pub(crate) fn spawn_receiver<R>(
    mut reader: R,
    lines: mpsc::UnboundedSender<String>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = LineBuffer::new();
        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            tokio::select! {
                read = reader.read(&mut chunk) => match read {
                    Ok(0) => {
                        debug!("peer closed the connection");
                        break;
                    }
                    Ok(n) => {
                        buffer.extend(&chunk[..n]);
                        while let Some(line) = buffer.try_read_line() {
                            debug!("<< {}", line);
                            if lines.send(line).is_err() {
                                // Engine is gone, nothing left to deliver to.
                                return;
                            }
                        }
                    }
                    Err(err) => {
                        debug!("receive failed: {}", err);
                        break;
                    }
                },
                _ = shutdown.changed() => break,
            }
        }
    })
}
