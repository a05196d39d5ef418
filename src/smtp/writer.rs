//! The write half of the session: raw bytes and CRLF-terminated lines.

use std::io;

use log::debug;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Returns the string replacing all the CRLF with "\<CRLF\>"
/// Used for debug displays
fn escape_crlf(string: &str) -> String {
    string.replace("\r\n", "<CRLF>")
}

/// Owns the outbound side of the socket.
///
/// Writes are fire-and-forget; any acknowledgment arrives later through the
/// receiver as a reply line.
#[derive(Debug)]
pub(crate) struct StreamWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> StreamWriter<W> {
    pub(crate) fn new(inner: W) -> StreamWriter<W> {
        StreamWriter { inner }
    }

    /// Writes raw bytes to the server.
    pub(crate) async fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes).await?;
        self.inner.flush().await?;
        debug!(
            ">> {}",
            escape_crlf(String::from_utf8_lossy(bytes).as_ref())
        );
        Ok(())
    }

    /// Writes `line` followed by CRLF.
    pub(crate) async fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.write_bytes(format!("{line}\r\n").as_bytes()).await
    }

    /// Shuts the stream down. Called exactly once per session.
    pub(crate) async fn close(&mut self) -> io::Result<()> {
        self.inner.shutdown().await
    }
}
