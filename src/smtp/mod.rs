//! SMTP session plumbing: reply parsing, the background receiver, the write
//! half and the protocol engine.

mod codec;
mod receiver;
mod reply;
mod smtp_client;
mod transport;
mod writer;

pub use self::codec::stuff_line;
pub use self::receiver::LineBuffer;
pub use self::reply::Reply;
pub use self::smtp_client::{SmtpClient, DEFAULT_HELO_NAME, SMTP_PORT};
pub use self::transport::{ConnectionState, SmtpTransport};
