//! Various small helper functions

use std::num::ParseIntError;
use std::time::Duration;

/// Parses a Duration from a string containing seconds.
/// Useful for command line parsing
pub fn parse_seconds(src: &str) -> Result<Duration, ParseIntError> {
    let seconds = src.parse::<u64>()?;
    Ok(Duration::from_secs(seconds))
}

/// Parses a Duration from a string containing days.
pub fn parse_days(src: &str) -> Result<Duration, ParseIntError> {
    let days = src.parse::<u64>()?;
    Ok(Duration::from_secs(days * 24 * 60 * 60))
}

/// Parses a byte size with an optional binary unit suffix (`k`, `m`, `g`), e.g. `10m`
pub fn parse_byte_size(src: &str) -> Result<u64, ParseIntError> {
    let src = src.trim();
    let (digits, multiplier) = match src.chars().last().map(|c| c.to_ascii_lowercase()) {
        Some('k') => (&src[..src.len() - 1], 1024),
        Some('m') => (&src[..src.len() - 1], 1024 * 1024),
        Some('g') => (&src[..src.len() - 1], 1024 * 1024 * 1024),
        _ => (src, 1),
    };

    Ok(digits.parse::<u64>()? * multiplier)
}

/// Converts a lossy representation of raw bytes for display in log messages
pub fn lossy_preview(data: &[u8], limit: usize) -> String {
    let text = String::from_utf8_lossy(data);

    if text.chars().count() > limit {
        let truncated: String = text.chars().take(limit).collect();
        format!("{}…", truncated)
    } else {
        text.into_owned()
    }
}
