//! RFC-822 style date strings for the `Date` header.

use chrono::{DateTime, Local, TimeZone};

/// Returns the current local time as `"D Mon YYYY HH:MM:SS ±HHMM"`.
///
/// The day carries no leading zero, the clock fields are zero padded and the
/// UTC offset is rendered as a signed four digit value, e.g.
/// `3 Aug 2026 07:05:09 +0900`.
pub fn current_date_string() -> String {
    format_date(&Local::now())
}

fn format_date<Tz: TimeZone>(datetime: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    datetime.format("%-d %b %Y %H:%M:%S %z").to_string()
}
