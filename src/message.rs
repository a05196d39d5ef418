//! The outbound mail representation.

/// A single outbound mail: envelope addresses, subject, raw header lines and
/// body lines.
///
/// A `Message` can be filled in field by field, or produced from a raw text
/// blob with [`Message::parse`]. It is handed to
/// [`SmtpTransport::send`](crate::SmtpTransport::send) by value for the
/// duration of one transaction and is not retained afterwards.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Message {
    /// Envelope sender, used for `MAIL FROM`
    pub mail_from: String,
    /// Envelope recipient, used for `RCPT TO`
    pub rcpt_to: String,
    /// Subject text; always emitted as exactly one `Subject` header
    pub subject: String,
    /// Raw `"Name: Value"` lines, in input order
    pub header_lines: Vec<String>,
    /// Body lines, in input order
    pub body_lines: Vec<String>,
}

/// Parser cursor: where in the blob the current line falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    BeforeHeaders,
    InHeaders,
    InBody,
}

impl Message {
    /// Creates an empty message.
    pub fn new() -> Message {
        Message::default()
    }

    /// Builds a message from a raw text blob.
    ///
    /// Lines are split on `\n` with a trailing `\r` stripped. Blank lines
    /// before the first header are discarded; the first blank line after a
    /// header ends the header section; everything beyond it is body, kept
    /// verbatim. Header lines are not validated here, a line without a colon
    /// is preserved but later dropped by header derivation.
    pub fn parse(text: &str) -> Message {
        let mut message = Message::new();
        let mut section = Section::BeforeHeaders;

        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            match section {
                Section::BeforeHeaders => {
                    if line.is_empty() {
                        continue;
                    }
                    section = Section::InHeaders;
                    message.header_lines.push(line.to_string());
                }
                Section::InHeaders => {
                    if line.is_empty() {
                        section = Section::InBody;
                    } else {
                        message.header_lines.push(line.to_string());
                    }
                }
                Section::InBody => {
                    message.body_lines.push(line.to_string());
                }
            }
        }

        // `split('\n')` yields one empty trailing fragment for text ending in
        // a newline; that fragment is not a body line.
        if text.ends_with('\n') {
            if let Some(last) = message.body_lines.last() {
                if last.is_empty() {
                    message.body_lines.pop();
                }
            }
        }

        message
    }

    /// Serializes the header and body sections back into a text blob, the
    /// inverse of [`Message::parse`].
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in &self.header_lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        for line in &self.body_lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}
