//! Server reply lines and their status codes.

/// One reply line from the server.
///
/// The code is the leading run of ASCII digits of the line; a line that does
/// not start with a parseable number gets code `0`, which no state accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    line: String,
}

impl Reply {
    /// Parses a single reply line.
    pub fn parse(line: String) -> Reply {
        let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let code = line[..digits].parse().unwrap_or(0);
        Reply { code, line }
    }

    /// The 3-digit status code, or `0` for an unrecognized line.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The full reply line as received, without the line terminator.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Consumes the reply, returning the raw line.
    pub fn into_line(self) -> String {
        self.line
    }
}
