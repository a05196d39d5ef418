//! SMTP transparency (dot-stuffing) for the line-oriented `DATA` phase.

use std::borrow::Cow;

/// Escapes a body line for transmission inside the `DATA` section.
///
/// A line whose first byte is `.` is prefixed with a second `.` so the server
/// does not mistake it for the data terminator. All other lines pass through
/// unchanged.
pub fn stuff_line(line: &str) -> Cow<'_, str> {
    if line.starts_with('.') {
        Cow::Owned(format!(".{line}"))
    } else {
        Cow::Borrowed(line)
    }
}
