//! Mailsend is a minimal outbound-only SMTP client.
//!
//! It performs one plain-TCP SMTP transaction per send: connect, `HELO`,
//! `MAIL FROM`, `RCPT TO`, `DATA`, message payload, `QUIT`. There is no TLS,
//! no authentication and no connection reuse; a failed send is never retried.
//!
//! ```no_run
//! use mailsend::{Message, SmtpClient};
//!
//! # async fn run() -> Result<(), mailsend::Error> {
//! let mut message = Message::parse(
//!     "From: user@localhost\n\
//!      To: root@localhost\n\
//!      \n\
//!      Hello example",
//! );
//! message.subject = "greetings".to_string();
//!
//! let mut transport = SmtpClient::new("127.0.0.1:2525").connect().await?;
//! transport.send(message).await?;
//! # Ok(())
//! # }
//! ```

#![deny(
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    missing_debug_implementations,
    clippy::unwrap_used
)]

pub mod date;
pub mod error;
pub mod headers;
pub mod message;
pub mod smtp;

pub use crate::date::current_date_string;
pub use crate::error::{Error, SendResult};
pub use crate::headers::{build_headers, HeaderLine};
pub use crate::message::Message;
pub use crate::smtp::{ConnectionState, SmtpClient, SmtpTransport, SMTP_PORT};
