//! Formatting helpers for byte sizes and feed dates.

use chrono::DateTime;

/// Formats a byte count as a human-readable string (B, KB, MB, GB, TB).
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Shortens an RFC 2822 publish date to `DD Mon YYYY HH:MM:SS`.
///
/// Dates that do not parse fall back to dropping the first and last
/// whitespace-separated words (weekday and zone).
#[must_use]
pub fn format_pub_date(raw: &str) -> String {
    if let Ok(date) = DateTime::parse_from_rfc2822(raw.trim()) {
        return date.format("%d %b %Y %H:%M:%S").to_string();
    }
    let words: Vec<&str> = raw.split_whitespace().collect();
    if words.len() > 2 {
        words[1..words.len() - 1].join(" ")
    } else {
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1_048_576), "1.00 MB");
        assert_eq!(format_bytes(1_073_741_824), "1.00 GB");
        assert_eq!(format_bytes(1_099_511_627_776), "1.00 TB");
    }

    #[test]
    fn format_bytes_zero() {
        assert_eq!(format_bytes(0), "0 B");
    }

    #[test]
    fn pub_date_drops_weekday_and_zone() {
        assert_eq!(
            format_pub_date("Tue, 14 Jan 2025 18:02:11 +0000"),
            "14 Jan 2025 18:02:11"
        );
    }

    #[test]
    fn pub_date_fallback_for_unparseable_dates() {
        assert_eq!(format_pub_date("Someday 14 Jan 2025 late GMT"), "14 Jan 2025 late");
        assert_eq!(format_pub_date("yesterday"), "yesterday");
        assert_eq!(format_pub_date(""), "");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn format_bytes_never_panics(bytes in 0u64..u64::MAX) {
                let _ = format_bytes(bytes);
            }

            #[test]
            fn format_pub_date_never_panics(raw in ".{0,64}") {
                let _ = format_pub_date(&raw);
            }
        }
    }
}
