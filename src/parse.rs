use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parse a currency amount like "$299.42" or "-$4,191,935".
/// Returns NAN when the text does not contain a number.
pub fn parse_money(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse a share quantity like "-14,000" or "+7,428".
/// Returns NAN when the text does not contain a number.
pub fn parse_quantity(text: &str) -> f64 {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    // A leading '+' is valid for f64::parse, so "+7,428" needs no special case.
    cleaned.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse a percentage like "-12%". Returns NAN when unparseable.
pub fn parse_percent(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != '%' && *c != ',')
        .collect();
    cleaned.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse the screener's native timestamp format, "YYYY-MM-DD" or
/// "YYYY-MM-DD HH:MM:SS", interpreted as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0)?));
    }
    None
}

/// Fractional days elapsed between `ts` (source-native format) and `now`.
/// Unparseable timestamps age to INFINITY so recency filters reject them
/// instead of falsely passing.
pub fn days_ago(ts: &str, now: DateTime<Utc>) -> f64 {
    match parse_timestamp(ts) {
        Some(t) => (now - t).num_milliseconds() as f64 / (1000.0 * 60.0 * 60.0 * 24.0),
        None => f64::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_money_symbols_and_separators() {
        assert_eq!(parse_money("$299.42"), 299.42);
        assert_eq!(parse_money("-$4,191,935"), -4_191_935.0);
        assert_eq!(parse_money("$1,000"), 1000.0);
    }

    #[test]
    fn test_parse_money_garbage_is_nan() {
        assert!(parse_money("").is_nan());
        assert!(parse_money("n/a").is_nan());
        assert!(parse_money("$-").is_nan());
    }

    #[test]
    fn test_parse_quantity_signed() {
        assert_eq!(parse_quantity("-14,000"), -14_000.0);
        assert_eq!(parse_quantity("+7,428"), 7428.0);
        assert!(parse_quantity("—").is_nan());
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("-12%"), -12.0);
        assert_eq!(parse_percent("3%"), 3.0);
        assert!(parse_percent("New").is_nan());
    }

    #[test]
    fn test_parse_timestamp_both_forms() {
        let full = parse_timestamp("2026-08-20 14:30:00").unwrap();
        assert_eq!(full.to_rfc3339(), "2026-08-20T14:30:00+00:00");

        let date_only = parse_timestamp("2026-08-20").unwrap();
        assert_eq!(date_only.to_rfc3339(), "2026-08-20T00:00:00+00:00");

        assert!(parse_timestamp("08/20/2026").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_days_ago() {
        let now = parse_timestamp("2026-08-29 00:00:00").unwrap();
        let d = days_ago("2026-08-19 00:00:00", now);
        assert!((d - 10.0).abs() < 1e-9);

        assert_eq!(days_ago("not a date", now), f64::INFINITY);
    }

    #[test]
    fn test_days_ago_fractional() {
        let now = parse_timestamp("2026-08-29 12:00:00").unwrap();
        let d = days_ago("2026-08-29 00:00:00", now);
        assert!((d - 0.5).abs() < 1e-9);
        // Future timestamps go negative, which still passes `<= max` filters.
        assert!(days_ago("2026-08-30", now) < 0.0);
    }
}
