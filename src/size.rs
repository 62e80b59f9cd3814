//! Human-readable size conversion.
//!
//! Listing pages report sizes in whatever notation the server likes
//! (`950K`, `1.5MB`, `1,2 Go`, `123456`). [`parse_size`] turns those into a
//! byte count and [`format_bytes`] turns a byte count back into a display
//! string. The two are not inverses: units are truncated and values rounded.

use regex::Regex;
use std::sync::LazyLock;

use crate::listing::ListingEntry;

static SIZE_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*([KMGTPE]?)").expect("size pattern is valid")
});

static BARE_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)").expect("digit pattern is valid"));

const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

/// Parse a size string such as `942.1K` or `1,5 GB` into bytes.
///
/// The magnitude accepts `.` or `,` as decimal separator and the unit letter
/// is one of `K M G T P E` (binary multiples). A trailing `B`, `o` or `i` is
/// ignored. Fractional bytes are floored. Returns 0 when no number is found.
pub fn parse_size(text: &str) -> u64 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }

    if let Some(caps) = SIZE_WITH_UNIT.captures(text) {
        let number = parse_decimal(&caps[1]);
        let exponent = match caps[2].to_ascii_uppercase().as_str() {
            "K" => 1,
            "M" => 2,
            "G" => 3,
            "T" => 4,
            "P" => 5,
            "E" => 6,
            _ => 0,
        };
        return (number * 1024f64.powi(exponent)) as u64;
    }

    BARE_DIGITS
        .captures(text)
        .map(|caps| parse_decimal(&caps[1]) as u64)
        .unwrap_or(0)
}

fn parse_decimal(digits: &str) -> f64 {
    digits.replace(',', ".").parse().unwrap_or(0.0)
}

/// Format a byte count for display: `512 B`, `1.00 KB`, `3.42 GB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    loop {
        value /= 1024.0;
        if value < 1024.0 || unit == UNITS.len() - 1 {
            break;
        }
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Sum the sizes of a listing and format the total.
pub fn total_size(entries: &[ListingEntry]) -> String {
    let total = entries
        .iter()
        .map(ListingEntry::size_bytes)
        .fold(0u64, u64::saturating_add);
    format_bytes(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_notations() {
        assert_eq!(parse_size("1.5MB"), 1_572_864);
        assert_eq!(parse_size("942.1K"), 964_710);
        assert_eq!(parse_size("950K"), 972_800);
        assert_eq!(parse_size("1,5 Go"), 1_610_612_736);
        assert_eq!(parse_size("2 gb"), 2 * 1024 * 1024 * 1024);
        assert_eq!(parse_size("500 bytes"), 500);
        assert_eq!(parse_size("123456"), 123_456);
    }

    #[test]
    fn unparseable_sizes_are_zero() {
        assert_eq!(parse_size(""), 0);
        assert_eq!(parse_size("   "), 0);
        assert_eq!(parse_size("-"), 0);
        assert_eq!(parse_size("unknown"), 0);
    }

    #[test]
    fn formats_bytes_with_two_decimals() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1_048_576), "1.00 MB");
        assert_eq!(format_bytes(5 * 1024u64.pow(4)), "5.00 TB");
    }

    #[test]
    fn format_stops_at_petabytes() {
        assert_eq!(format_bytes(1024u64.pow(5)), "1.00 PB");
        assert_eq!(format_bytes(2048 * 1024u64.pow(5)), "2048.00 PB");
    }

    #[test]
    fn conversion_is_lossy() {
        assert_eq!(format_bytes(parse_size("942.1K")), "942.10 KB");
        assert_eq!(format_bytes(parse_size("1.234MB")), "1.23 MB");
    }

    #[test]
    fn totals_listing_sizes() {
        let entries = vec![
            ListingEntry::new("a.zip", "https://example.org/a.zip", "1K"),
            ListingEntry::new("b.zip", "https://example.org/b.zip", "1K"),
            ListingEntry::new("c.zip", "https://example.org/c.zip", ""),
        ];
        assert_eq!(total_size(&entries), "2.00 KB");
    }
}
