//! Client configuration and connection setup.

use std::time::Duration;

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{lookup_host, TcpStream};

use crate::error::Error;
use crate::smtp::transport::SmtpTransport;

// Registered port numbers:
// https://www.iana.org/assignments/service-names-port-numbers/service-names-port-numbers.xhtml

/// Default smtp port
pub const SMTP_PORT: u16 = 25;

/// Placeholder domain announced in `HELO` when the caller sets none.
pub const DEFAULT_HELO_NAME: &str = "example";

/// Default time to wait for a server reply before giving up.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Contains client configuration.
///
/// Built with defaults and adjusted through the builder methods, then turned
/// into a connected [`SmtpTransport`] with [`SmtpClient::connect`].
#[derive(Debug, Clone)]
pub struct SmtpClient {
    /// Server `host:port` we are connecting to
    pub(crate) server_addr: String,
    /// Name sent during HELO
    pub(crate) helo_name: String,
    /// Network timeout for each awaited reply; `None` waits forever
    pub(crate) timeout: Option<Duration>,
}

impl SmtpClient {
    /// Creates a new SMTP client for the given `host:port` address.
    ///
    /// Defaults are:
    ///
    /// * HELO name `example`
    /// * A 60 seconds timeout per awaited reply
    pub fn new<A: Into<String>>(addr: A) -> SmtpClient {
        SmtpClient {
            server_addr: addr.into(),
            helo_name: DEFAULT_HELO_NAME.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Creates a new local SMTP client to port 25.
    pub fn new_localhost() -> SmtpClient {
        SmtpClient::new(format!("localhost:{SMTP_PORT}"))
    }

    /// Sets the name used during HELO. An empty name keeps the placeholder.
    pub fn helo_name<S: Into<String>>(mut self, name: S) -> SmtpClient {
        let name = name.into();
        if !name.is_empty() {
            self.helo_name = name;
        }
        self
    }

    /// Sets the reply timeout. `None` disables it.
    pub fn timeout(mut self, timeout: Option<Duration>) -> SmtpClient {
        self.timeout = timeout;
        self
    }

    /// Resolves the server address, opens the TCP connection and returns the
    /// transport driving it.
    ///
    /// Only IPv4 addresses are considered; a name resolving to none is a
    /// resolution failure. Neither failure is retried.
    pub async fn connect(self) -> Result<SmtpTransport<TcpStream>, Error> {
        let server_addr = lookup_host(self.server_addr.as_str())
            .await
            .map_err(|_| Error::Resolution)?
            .find(|addr| addr.is_ipv4())
            .ok_or(Error::Resolution)?;

        debug!("connecting to {}", server_addr);

        let stream = TcpStream::connect(server_addr)
            .await
            .map_err(Error::Connect)?;
        Ok(self.on_stream(stream))
    }

    /// Builds the transport over an already established stream.
    pub fn on_stream<S>(self, stream: S) -> SmtpTransport<S>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        SmtpTransport::new(self, stream)
    }
}
