use mailsend::{current_date_string, Message, SmtpClient};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let server = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:2525".to_string());

    let mail_from = "foo@example.com";
    let rcpt_to = "bar@example.org";

    // Compose a mail
    let mut message = Message::new();
    message.mail_from = mail_from.to_string();
    message.rcpt_to = rcpt_to.to_string();
    message.subject = "test".to_string();
    message.header_lines = vec![
        format!("From: {mail_from}"),
        format!("To: {rcpt_to}"),
        format!("Date: {}", current_date_string()),
    ];
    message.body_lines = vec![
        "Hello, world 1".to_string(),
        "Hello, world 2".to_string(),
        "Hello, world 3".to_string(),
    ];

    // Open an SMTP connection to the given address and send
    let mut transport = SmtpClient::new(server).connect().await?;
    transport.send(message).await?;

    println!("Email sent");
    Ok(())
}
