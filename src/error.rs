//! Error and result types for the SMTP client.

use std::io;

use crate::smtp::ConnectionState;

/// An enum of all error kinds.
///
/// Every variant is terminal for the current send attempt; nothing is
/// retried.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// DNS resolution error
    #[error("could not resolve hostname")]
    Resolution,
    /// TCP connection could not be established
    #[error("connect: {0}")]
    Connect(#[source] io::Error),
    /// The server closed the connection, or the socket read failed,
    /// before the transaction completed
    #[error("connection lost before the transaction completed")]
    Disconnected,
    /// The server sent a reply code the state machine does not accept
    #[error("unexpected reply in state {state:?}: {line:?}")]
    UnexpectedReply {
        /// State the engine was in when the reply arrived
        state: ConnectionState,
        /// Parsed reply code (0 if the line did not start with digits)
        code: u16,
        /// The offending reply line
        line: String,
    },
    /// No reply arrived within the configured timeout
    #[error("timed out waiting for a server reply")]
    Timeout,
    /// IO error on the write side
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

/// Result of one send attempt.
pub type SendResult = Result<(), Error>;
