//! The SMTP protocol engine: one state machine pass per send.

use log::debug;
use tokio::io::{split, AsyncRead, AsyncWrite, WriteHalf};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::error::{Error, SendResult};
use crate::headers::{build_headers, HeaderLine};
use crate::message::Message;
use crate::smtp::codec::stuff_line;
use crate::smtp::receiver::spawn_receiver;
use crate::smtp::reply::Reply;
use crate::smtp::smtp_client::SmtpClient;
use crate::smtp::writer::StreamWriter;

/// Where the command sequence currently stands.
///
/// Every transition is driven by the numeric code of one complete reply
/// line; see [`SmtpTransport::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connected, waiting for the server greeting
    Connecting,
    /// `HELO` sent
    AfterHelo,
    /// `MAIL FROM` sent
    AfterMailFrom,
    /// `RCPT TO` sent
    AfterRcptTo,
    /// `DATA` sent, waiting for permission to transmit the payload
    InData,
    /// Payload and `QUIT` sent, waiting for the closing acknowledgment
    Done,
}

/// Structure that implements the high level SMTP client.
///
/// Owns the socket for exactly one send: a background receiver task reads
/// reply lines off the read half while the engine drives the command
/// sequence on the write half. The socket is closed exactly once, whichever
/// way the transaction ends.
#[allow(missing_debug_implementations)]
pub struct SmtpTransport<S: AsyncRead + AsyncWrite + Send + 'static> {
    writer: StreamWriter<WriteHalf<S>>,
    lines: mpsc::UnboundedReceiver<String>,
    shutdown: watch::Sender<bool>,
    receiver: Option<JoinHandle<()>>,
    helo_name: String,
    reply_timeout: Option<std::time::Duration>,
    state: ConnectionState,
}

impl<S: AsyncRead + AsyncWrite + Send + 'static> SmtpTransport<S> {
    /// Creates the transport over an established stream and starts the
    /// background receiver.
    pub fn new(client: SmtpClient, stream: S) -> SmtpTransport<S> {
        let (read_half, write_half) = split(stream);
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let receiver = spawn_receiver(read_half, line_tx, shutdown_rx);

        SmtpTransport {
            writer: StreamWriter::new(write_half),
            lines: line_rx,
            shutdown: shutdown_tx,
            receiver: Some(receiver),
            helo_name: client.helo_name,
            reply_timeout: client.timeout,
            state: ConnectionState::Connecting,
        }
    }

    /// Performs one complete SMTP transaction for `message`.
    ///
    /// Reply codes drive the sequence `HELO`, `MAIL FROM`, `RCPT TO`,
    /// `DATA`, payload, `QUIT`. A `221` from any state ends the session
    /// successfully; a known code arriving out of order is ignored; anything
    /// else aborts without further commands. Whatever the outcome, the
    /// receiver task is stopped and joined and the socket is shut down
    /// before this returns, so the transport is spent afterwards.
    pub async fn send(&mut self, mut message: Message) -> SendResult {
        let result = self.run(&mut message).await;

        // Stop the receiver even if it is mid-read on a silent peer.
        let _ = self.shutdown.send(true);
        if let Some(receiver) = self.receiver.take() {
            let _ = receiver.await;
        }
        if let Err(err) = self.writer.close().await {
            debug!("close failed: {}", err);
        }

        result
    }

    async fn run(&mut self, message: &mut Message) -> SendResult {
        // Derive the final header block up front; this also backfills empty
        // envelope addresses from the raw headers before MAIL FROM is sent.
        let headers = build_headers(message);

        loop {
            let reply = self.read_reply().await?;
            match (reply.code(), self.state) {
                (220, ConnectionState::Connecting) => {
                    self.writer
                        .write_line(&format!("HELO {}", self.helo_name))
                        .await?;
                    self.state = ConnectionState::AfterHelo;
                }
                (250, ConnectionState::AfterHelo) => {
                    self.writer
                        .write_line(&format!("MAIL FROM: {}", message.mail_from))
                        .await?;
                    self.state = ConnectionState::AfterMailFrom;
                }
                (250, ConnectionState::AfterMailFrom) => {
                    self.writer
                        .write_line(&format!("RCPT TO: {}", message.rcpt_to))
                        .await?;
                    self.state = ConnectionState::AfterRcptTo;
                }
                (250, ConnectionState::AfterRcptTo) => {
                    self.writer.write_line("DATA").await?;
                    self.state = ConnectionState::InData;
                }
                (354, ConnectionState::InData) => {
                    self.write_payload(&headers, &message.body_lines).await?;
                    self.state = ConnectionState::Done;
                }
                (221, _) => {
                    debug!("server closed the session");
                    return Ok(());
                }
                (220 | 250 | 354, state) => {
                    debug!("ignoring out-of-order reply in {:?}: {}", state, reply.line());
                }
                (code, state) => {
                    return Err(Error::UnexpectedReply {
                        state,
                        code,
                        line: reply.into_line(),
                    });
                }
            }
        }
    }

    /// Transmits the header block, a blank separator, the dot-stuffed body,
    /// the data terminator and `QUIT`.
    async fn write_payload(&mut self, headers: &[HeaderLine], body: &[String]) -> SendResult {
        for header in headers {
            self.writer.write_line(&header.to_string()).await?;
        }
        self.writer.write_line("").await?;
        for line in body {
            self.writer.write_line(&stuff_line(line)).await?;
        }
        self.writer.write_line(".").await?;
        self.writer.write_line("QUIT").await?;
        Ok(())
    }

    async fn read_reply(&mut self) -> Result<Reply, Error> {
        let line = match self.reply_timeout {
            Some(duration) => timeout(duration, self.lines.recv())
                .await
                .map_err(|_| Error::Timeout)?,
            None => self.lines.recv().await,
        };
        // A closed channel means the receiver saw a read error or EOF.
        let line = line.ok_or(Error::Disconnected)?;
        Ok(Reply::parse(line))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

    fn transport_on(stream: DuplexStream) -> SmtpTransport<DuplexStream> {
        SmtpClient::new("unused").helo_name("x").on_stream(stream)
    }

    fn sample_message() -> Message {
        let mut message = Message::new();
        message.mail_from = "a".to_string();
        message.rcpt_to = "b".to_string();
        message.subject = "s".to_string();
        message.header_lines = vec![
            "From: a".to_string(),
            "To: b".to_string(),
            "Date: 1 Jan 2020 00:00:00 +0000".to_string(),
        ];
        message.body_lines = vec!["Hello, world 1".to_string(), ".hidden".to_string()];
        message
    }

    /// Plays a well-behaved server and records every line the client sent.
    async fn happy_server(stream: DuplexStream) -> Vec<String> {
        let mut server = BufReader::new(stream);
        server.write_all(b"220 smtp.test ESMTP\r\n").await.expect("greet");

        let mut seen = Vec::new();
        let mut in_data = false;
        let mut line = String::new();
        loop {
            line.clear();
            if server.read_line(&mut line).await.expect("read") == 0 {
                break;
            }
            let received = line.trim_end_matches(['\r', '\n']).to_string();
            seen.push(received.clone());

            if in_data {
                if received == "." {
                    in_data = false;
                    server.write_all(b"250 queued\r\n").await.expect("reply");
                }
            } else if received.starts_with("HELO") {
                server.write_all(b"250 smtp.test\r\n").await.expect("reply");
            } else if received.starts_with("MAIL FROM") {
                server.write_all(b"250 sender ok\r\n").await.expect("reply");
            } else if received.starts_with("RCPT TO") {
                server.write_all(b"250 recipient ok\r\n").await.expect("reply");
            } else if received == "DATA" {
                in_data = true;
                server.write_all(b"354 end with .\r\n").await.expect("reply");
            } else if received == "QUIT" {
                server.write_all(b"221 bye\r\n").await.expect("reply");
                break;
            }
        }
        seen
    }

    #[tokio::test]
    async fn full_transaction_emits_commands_in_order() {
        let (client_side, server_side) = tokio::io::duplex(4096);
        let server = tokio::spawn(happy_server(server_side));

        let mut transport = transport_on(client_side);
        transport.send(sample_message()).await.expect("send");

        let seen = server.await.expect("server");
        assert_eq!(
            seen,
            vec![
                "HELO x",
                "MAIL FROM: a",
                "RCPT TO: b",
                "DATA",
                "From: a",
                "To: b",
                "Date: 1 Jan 2020 00:00:00 +0000",
                "Subject: s",
                "",
                "Hello, world 1",
                "..hidden",
                ".",
                "QUIT",
            ]
        );
    }

    #[tokio::test]
    async fn negative_reply_aborts_before_mail_from() {
        let (client_side, server_side) = tokio::io::duplex(4096);
        let server = tokio::spawn(async move {
            let mut server = BufReader::new(server_side);
            server.write_all(b"220 smtp.test ESMTP\r\n").await.expect("greet");
            let mut line = String::new();
            server.read_line(&mut line).await.expect("read helo");
            server.write_all(b"550 denied\r\n").await.expect("reply");

            // Collect whatever else arrives until the client hangs up.
            let mut rest = String::new();
            while server.read_line(&mut rest).await.expect("read") > 0 {}
            rest
        });

        let mut transport = transport_on(client_side);
        let err = transport.send(sample_message()).await.expect_err("must abort");
        assert!(matches!(
            err,
            Error::UnexpectedReply {
                state: ConnectionState::AfterHelo,
                code: 550,
                ..
            }
        ));

        let rest = server.await.expect("server");
        assert!(!rest.contains("MAIL FROM"), "sent after abort: {rest:?}");
    }

    #[tokio::test]
    async fn out_of_order_known_code_is_ignored() {
        let (client_side, server_side) = tokio::io::duplex(4096);
        let server = tokio::spawn(async move {
            let mut server = BufReader::new(server_side);
            server.write_all(b"220 smtp.test ESMTP\r\n").await.expect("greet");
            let mut line = String::new();
            server.read_line(&mut line).await.expect("read helo");
            // A stray greeting repeats before the real HELO acknowledgment.
            server.write_all(b"220 again\r\n").await.expect("reply");
            server.write_all(b"250 smtp.test\r\n").await.expect("reply");
            line.clear();
            server.read_line(&mut line).await.expect("read mail from");
            let mail_from = line.trim_end().to_string();
            server.write_all(b"221 bye\r\n").await.expect("reply");
            mail_from
        });

        let mut transport = transport_on(client_side);
        transport.send(sample_message()).await.expect("send");
        assert_eq!(server.await.expect("server"), "MAIL FROM: a");
    }

    #[tokio::test]
    async fn peer_disconnect_surfaces_as_disconnected() {
        let (client_side, server_side) = tokio::io::duplex(4096);
        let server = tokio::spawn(async move {
            let mut server = BufReader::new(server_side);
            server.write_all(b"220 smtp.test ESMTP\r\n").await.expect("greet");
            let mut line = String::new();
            server.read_line(&mut line).await.expect("read helo");
            // Drop without replying.
        });

        let mut transport = transport_on(client_side);
        let err = transport.send(sample_message()).await.expect_err("must fail");
        assert!(matches!(err, Error::Disconnected));
        server.await.expect("server");
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let (client_side, server_side) = tokio::io::duplex(64);

        let mut transport = SmtpClient::new("unused")
            .timeout(Some(Duration::from_millis(50)))
            .on_stream(client_side);
        let err = transport.send(sample_message()).await.expect_err("must time out");
        assert!(matches!(err, Error::Timeout));

        drop(server_side);
    }

    #[tokio::test]
    async fn garbage_reply_aborts() {
        let (client_side, server_side) = tokio::io::duplex(64);
        let server = tokio::spawn(async move {
            let mut server = BufReader::new(server_side);
            server.write_all(b"not an smtp greeting\r\n").await.expect("greet");
            let mut rest = String::new();
            while server.read_line(&mut rest).await.expect("read") > 0 {}
        });

        let mut transport = transport_on(client_side);
        let err = transport.send(sample_message()).await.expect_err("must abort");
        assert!(matches!(err, Error::UnexpectedReply { code: 0, .. }));
        server.await.expect("server");
    }

    #[tokio::test]
    async fn envelope_is_backfilled_from_headers_before_mail_from() {
        let (client_side, server_side) = tokio::io::duplex(4096);
        let server = tokio::spawn(happy_server(server_side));

        let mut transport = transport_on(client_side);
        let message = Message::parse(
            "From: sender@example.org\n\
             To: rcpt@example.org\n\
             Subject: seeded\n\
             \n\
             body\n",
        );
        transport.send(message).await.expect("send");

        let seen = server.await.expect("server");
        assert!(seen.contains(&"MAIL FROM: sender@example.org".to_string()));
        assert!(seen.contains(&"RCPT TO: rcpt@example.org".to_string()));
        assert!(seen.contains(&"Subject: seeded".to_string()));
    }
}
