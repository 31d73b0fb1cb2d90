//! Value canonicalizers
//!
//! Conversions from the scheduler's textual representations into numbers.
//! None of these fail: unparseable input maps to a documented sentinel.

use std::sync::LazyLock;

use chrono::{Local, NaiveDateTime, TimeZone};
use regex::Regex;

use crate::domain::job::Timestamp;

/// `D-HH:MM:SS`, any number of day digits
static DAYS_HMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)-([0-9]{2}):([0-9]{2}):([0-9]{2})$").expect("static regex")
});

/// `HH:MM:SS`
static HMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2}):([0-9]{2}):([0-9]{2})$").expect("static regex"));

/// `MM:SS.mmm`
static MS_MILLIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2}):([0-9]{2})\.([0-9]{3})$").expect("static regex"));

/// Timestamp layout used by the accounting tool
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Convert a duration string to whole seconds
///
/// Accepts exactly `D-HH:MM:SS`, `HH:MM:SS` and `MM:SS.mmm`; the sub-second
/// form is rounded half away from zero. Anything else (including the empty
/// string and `UNLIMITED`) yields `-1`.
pub fn duration_to_seconds(text: &str) -> i64 {
    let num = |s: &str| s.parse::<i64>().unwrap_or(0);

    if let Some(caps) = DAYS_HMS.captures(text) {
        let clock = num(&caps[2]) * 3_600 + num(&caps[3]) * 60 + num(&caps[4]);
        return caps[1]
            .parse::<i64>()
            .ok()
            .and_then(|days| days.checked_mul(86_400))
            .and_then(|secs| secs.checked_add(clock))
            .unwrap_or(-1);
    }

    if let Some(caps) = HMS.captures(text) {
        return num(&caps[1]) * 3_600 + num(&caps[2]) * 60 + num(&caps[3]);
    }

    if let Some(caps) = MS_MILLIS.captures(text) {
        let whole = num(&caps[1]) * 60 + num(&caps[2]);
        let millis = num(&caps[3]);
        return (whole as f64 + millis as f64 / 1000.0).round() as i64;
    }

    -1
}

/// Convert a byte-size string to bytes
///
/// A trailing `K`, `M`, `G`, `T` or `P` scales the leading number by the
/// matching power of 1024. Without one of those suffixes the leading number
/// is taken as-is, so `4000Mc` reads as 4000. Empty or non-numeric text is 0.
pub fn byte_size_to_bytes(text: &str) -> f64 {
    let exponent = match text.chars().last() {
        None => return 0.0,
        Some('K') => 1,
        Some('M') => 2,
        Some('G') => 3,
        Some('T') => 4,
        Some('P') => 5,
        Some(_) => 0,
    };

    leading_number(text) * 1024f64.powi(exponent)
}

/// Parse a local-time `YYYY-MM-DDTHH:MM:SS` timestamp to epoch seconds
///
/// Placeholders such as `Unknown` or `None` yield [`Timestamp::Unknown`].
pub fn timestamp_to_epoch(text: &str) -> Timestamp {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| Timestamp::Epoch(local.timestamp()))
        .unwrap_or(Timestamp::Unknown)
}

/// Longest numeric prefix of `text` as a float, 0 when there is none
///
/// Leading whitespace and one sign are allowed, followed by digits with an
/// optional fractional part and exponent.
pub(crate) fn leading_number(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return 0.0;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_forms() {
        assert_eq!(duration_to_seconds("1-02:03:04"), 93_784);
        assert_eq!(duration_to_seconds("12-00:00:00"), 12 * 86_400);
        assert_eq!(duration_to_seconds("01:00:00"), 3_600);
        assert_eq!(duration_to_seconds("00:10:00"), 600);
        assert_eq!(duration_to_seconds("01:02.500"), 63);
        assert_eq!(duration_to_seconds("01:02.499"), 62);
    }

    #[test]
    fn test_duration_rejects_other_forms() {
        assert_eq!(duration_to_seconds(""), -1);
        assert_eq!(duration_to_seconds("UNLIMITED"), -1);
        assert_eq!(duration_to_seconds("1:00:00"), -1);
        assert_eq!(duration_to_seconds("00:00:00 "), -1);
        assert_eq!(duration_to_seconds("-00:10:00"), -1);
        assert_eq!(duration_to_seconds("٠١:٠٠:٠٠"), -1);
    }

    #[test]
    fn test_oversized_day_count_is_unknown() {
        assert_eq!(duration_to_seconds("999999999999999-00:00:00"), -1);
        assert_eq!(duration_to_seconds("99999999999999999999-01:00:00"), -1);
        assert_eq!(duration_to_seconds("106751991167300-23:59:59"), -1);
        assert_eq!(duration_to_seconds("10000-00:00:00"), 864_000_000);
    }

    #[test]
    fn test_byte_sizes() {
        assert_eq!(byte_size_to_bytes("2G"), 2.0 * 1024.0 * 1024.0 * 1024.0);
        assert_eq!(byte_size_to_bytes("1K"), 1024.0);
        assert_eq!(byte_size_to_bytes("1.5M"), 1.5 * 1024.0 * 1024.0);
        assert_eq!(byte_size_to_bytes("1P"), 1024f64.powi(5));
        assert_eq!(byte_size_to_bytes("512"), 512.0);
        assert_eq!(byte_size_to_bytes("4000Mc"), 4000.0);
        assert_eq!(byte_size_to_bytes(""), 0.0);
        assert_eq!(byte_size_to_bytes("G"), 0.0);
        assert_eq!(byte_size_to_bytes("abc"), 0.0);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("42abc"), 42.0);
        assert_eq!(leading_number("  -3.5x"), -3.5);
        assert_eq!(leading_number("1e3G"), 1000.0);
        assert_eq!(leading_number("7."), 7.0);
        assert_eq!(leading_number("1e"), 1.0);
        assert_eq!(leading_number(".5"), 0.5);
        assert_eq!(leading_number("."), 0.0);
        assert_eq!(leading_number("-"), 0.0);
    }

    #[test]
    fn test_timestamp_parses_local_time() {
        let expected = Local
            .with_ymd_and_hms(2024, 3, 1, 12, 30, 0)
            .earliest()
            .unwrap()
            .timestamp();
        assert_eq!(
            timestamp_to_epoch("2024-03-01T12:30:00"),
            Timestamp::Epoch(expected)
        );
    }

    #[test]
    fn test_timestamp_placeholders_are_unknown() {
        assert_eq!(timestamp_to_epoch("Unknown"), Timestamp::Unknown);
        assert_eq!(timestamp_to_epoch("None"), Timestamp::Unknown);
        assert_eq!(timestamp_to_epoch(""), Timestamp::Unknown);
        assert_eq!(timestamp_to_epoch("2024-13-01T00:00:00"), Timestamp::Unknown);
    }
}
