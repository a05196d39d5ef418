//! Derivation of the final header block sent during the `DATA` phase.

use std::fmt::{self, Display, Formatter};

use crate::date::current_date_string;
use crate::message::Message;

// Lower keys sort first; unrecognized headers share the maximum key and keep
// their input order through the stable sort.
const SORT_FROM: i32 = -9;
const SORT_TO: i32 = -8;
const SORT_DATE: i32 = -7;
const SORT_SUBJECT: i32 = -6;
const SORT_OTHER: i32 = i32::MAX;

/// One header of the outgoing block, produced fresh per send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine {
    /// Header name, trimmed
    pub name: String,
    /// Header value, trimmed
    pub value: String,
    /// Ordering key, see [`build_headers`]
    pub sort_key: i32,
}

impl HeaderLine {
    fn new(name: &str, value: &str, sort_key: i32) -> HeaderLine {
        HeaderLine {
            name: name.to_string(),
            value: value.to_string(),
            sort_key,
        }
    }
}

impl Display for HeaderLine {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Derives the ordered header block for `message`.
///
/// Raw header lines are split at the first colon, name and value trimmed;
/// lines without a colon are dropped. `From`, `To`, `Date` and `Subject`
/// (case-sensitive) get fixed positions ahead of everything else, in that
/// order. Missing `From`/`To` are synthesized from the envelope addresses, a
/// missing `Date` from [`current_date_string`], and exactly one `Subject` is
/// always emitted from `message.subject`.
///
/// As a side effect, empty envelope fields are backfilled from the first
/// matching header value: `mail_from` from `From`, `rcpt_to` from `To`, and
/// `message.subject` from `Subject`.
pub fn build_headers(message: &mut Message) -> Vec<HeaderLine> {
    let mut headers = Vec::with_capacity(message.header_lines.len() + 4);
    let mut seen_from = false;
    let mut seen_to = false;
    let mut seen_date = false;

    for raw in &message.header_lines {
        let Some((name, value)) = raw.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        match name {
            // For From/To/Date only the first occurrence is emitted, so the
            // final block always carries exactly one of each.
            "From" => {
                if message.mail_from.is_empty() {
                    message.mail_from = value.to_string();
                }
                if !seen_from {
                    seen_from = true;
                    headers.push(HeaderLine::new(name, value, SORT_FROM));
                }
            }
            "To" => {
                if message.rcpt_to.is_empty() {
                    message.rcpt_to = value.to_string();
                }
                if !seen_to {
                    seen_to = true;
                    headers.push(HeaderLine::new(name, value, SORT_TO));
                }
            }
            "Date" => {
                if !seen_date {
                    seen_date = true;
                    headers.push(HeaderLine::new(name, value, SORT_DATE));
                }
            }
            "Subject" => {
                // Re-emitted once below from `message.subject`.
                if message.subject.is_empty() {
                    message.subject = value.to_string();
                }
            }
            _ => headers.push(HeaderLine::new(name, value, SORT_OTHER)),
        }
    }

    if !seen_from {
        headers.push(HeaderLine::new("From", &message.mail_from, SORT_FROM));
    }
    if !seen_to {
        headers.push(HeaderLine::new("To", &message.rcpt_to, SORT_TO));
    }
    if !seen_date {
        headers.push(HeaderLine::new("Date", &current_date_string(), SORT_DATE));
    }
    headers.push(HeaderLine::new("Subject", &message.subject, SORT_SUBJECT));

    headers.sort_by_key(|header| header.sort_key);
    headers
}
