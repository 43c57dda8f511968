// Built-in value checks and parsers used by the field rules

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$").unwrap()
});

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap());

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Address with a dotted domain part.
pub fn is_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// Absolute http(s) URL.
pub fn is_url(value: &str) -> bool {
    URL_REGEX.is_match(value)
}

/// Hyphenated UUID in any version.
pub fn is_uuid(value: &str) -> bool {
    value.len() == 36 && uuid::Uuid::parse_str(value).is_ok()
}

/// Lenient boolean parsing for query and header values.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parse an RFC 3339 or naive ISO datetime, truncated to whole seconds.
///
/// Naive values are taken as UTC. A bare date is midnight UTC.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let parsed = DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NAIVE_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })?;
    parsed.with_nanosecond(0)
}

/// Parse a calendar date, accepting full datetimes as well.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(value).map(|dt| dt.date_naive()))
}

pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(is_email("user@example.com"));
        assert!(is_email("first.last+tag@mail.example.org"));
        assert!(!is_email("user@localhost"));
        assert!(!is_email("not an email"));
        assert!(!is_email("@example.com"));
    }

    #[test]
    fn test_url() {
        assert!(is_url("https://example.com/path?q=1"));
        assert!(is_url("http://localhost:8080"));
        assert!(!is_url("ftp://example.com"));
        assert!(!is_url("example.com"));
    }

    #[test]
    fn test_uuid() {
        assert!(is_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_uuid("550e8400e29b41d4a716446655440000"));
        assert!(!is_uuid("nope"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_parse_datetime_variants() {
        let expected = "2030-01-02T03:04:05Z";
        for input in [
            "2030-01-02T03:04:05Z",
            "2030-01-02T05:04:05+02:00",
            "2030-01-02T03:04:05.678",
            "2030-01-02 03:04:05",
        ] {
            let dt = parse_datetime(input).unwrap();
            assert_eq!(format_datetime(&dt), expected, "input {}", input);
        }
        assert_eq!(
            format_datetime(&parse_datetime("2030-01-02").unwrap()),
            "2030-01-02T00:00:00Z"
        );
        assert!(parse_datetime("02/01/2030").is_none());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(format_date(&parse_date("2030-01-02").unwrap()), "2030-01-02");
        assert_eq!(format_date(&parse_date("2030-01-02T23:00:00Z").unwrap()), "2030-01-02");
        assert!(parse_date("yesterday").is_none());
    }
}
