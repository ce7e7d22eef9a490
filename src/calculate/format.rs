//! Display formatting for report values.

use chrono::{DateTime, Utc};

/// Extra digits requested when checking for an exact rounding tie.
const TIE_PROBE_DIGITS: usize = 64;

/// Render `value` with a fixed number of decimals.
///
/// Exact ties round away from zero (`0.125` -> `"0.13"`), unlike the
/// round-half-to-even of `format!`. Non-finite values render as-is.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let probe = format!("{:.*}", digits + TIE_PROBE_DIGITS, value);
    let is_tie = probe
        .find('.')
        .map(|dot| &probe[dot + 1 + digits..])
        .is_some_and(|tail| tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0'));

    if is_tie {
        let nudge = 0.25 * 10f64.powi(-(digits as i32));
        format!("{:.*}", digits, value + value.signum() * nudge)
    } else {
        format!("{:.*}", digits, value)
    }
}

/// Format an RFC 3339 timestamp as `M/D/YYYY, h:mm:ss AM` in UTC.
///
/// Unparseable input is passed through unchanged.
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}
