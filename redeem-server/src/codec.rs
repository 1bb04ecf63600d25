//! Order-number and share-code formats, expiry derivation
//!
//! Order numbers are externally issued purchase references with a fixed
//! shape: the `102` prefix, an 8-digit `YYYYMMDD` purchase date, and a
//! 13-digit suffix (24 digits total). Share codes are 8-digit numeric
//! strings. Everything here is pure: no I/O, no clock reads.

use chrono::{Duration, NaiveDate};

/// Fixed prefix of every order number
pub const ORDER_PREFIX: &str = "102";
const ORDER_DATE_LENGTH: usize = 8;
const ORDER_SUFFIX_LENGTH: usize = 13;
const ORDER_NUMBER_LENGTH: usize = 3 + ORDER_DATE_LENGTH + ORDER_SUFFIX_LENGTH;

/// Length of generated share codes
pub const SHARE_CODE_LENGTH: usize = 8;

/// Attempt bound for collision-retrying code generation
pub const MAX_CODE_ATTEMPTS: u32 = 5;

/// Parse the purchase date embedded in an order number.
///
/// Returns `None` when the prefix, length, digit shape or calendar date
/// is wrong. Never panics.
pub fn parse_purchase_date(order_number: &str) -> Option<NaiveDate> {
    if order_number.len() != ORDER_NUMBER_LENGTH {
        return None;
    }
    if !order_number.starts_with(ORDER_PREFIX) {
        return None;
    }
    if !order_number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let date_part = &order_number[ORDER_PREFIX.len()..ORDER_PREFIX.len() + ORDER_DATE_LENGTH];
    NaiveDate::parse_from_str(date_part, "%Y%m%d").ok()
}

/// Normalize a raw order-number input: trimmed, empty treated as absent,
/// anything else must parse.
pub fn parse_order_number(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_purchase_date(trimmed)?;
    Some(trimmed.to_string())
}

/// Validity-days input: must be a positive integer.
pub fn parse_valid_days(value: i64) -> Option<i32> {
    if value <= 0 || value > i32::MAX as i64 {
        return None;
    }
    Some(value as i32)
}

/// Serial-number input: must be a positive integer.
pub fn parse_serial_number(value: i64) -> Option<i64> {
    if value <= 0 { None } else { Some(value) }
}

/// Derive a stock unit's expiry from its order number and validity days.
///
/// Returns `purchase_date + (valid_days - 1)` days at end-of-day
/// (23:59:59 UTC) as epoch millis, only when both inputs are present and
/// the embedded date parses. Callers fall back to an explicitly stored
/// expiry when this returns `None`.
pub fn derive_expiry(order_number: Option<&str>, valid_days: Option<i32>) -> Option<i64> {
    let order_number = order_number?;
    let valid_days = valid_days?;
    if valid_days <= 0 {
        return None;
    }
    let purchase = parse_purchase_date(order_number)?;
    let last_day = purchase.checked_add_signed(Duration::days(i64::from(valid_days) - 1))?;
    let eod = last_day.and_hms_opt(23, 59, 59)?;
    Some(eod.and_utc().timestamp_millis())
}

/// Parse an explicit expiry date input.
///
/// Plain dates (`YYYY-MM-DD` / `YYYY/MM/DD`) expire at end-of-day; full
/// RFC 3339 timestamps are taken at their given instant.
pub fn parse_valid_date(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            let eod = date.and_hms_opt(23, 59, 59)?;
            return Some(eod.and_utc().timestamp_millis());
        }
    }
    chrono::DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Check a share/login code's shape: exactly 8 ASCII digits.
pub fn valid_short_code(code: &str) -> bool {
    code.len() == SHARE_CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// Build the redemption URL for a share code.
pub fn build_share_link(origin: &str, code: &str) -> String {
    format!("{origin}/order?code={code}")
}

/// Resolve the base origin used in generated share links.
///
/// A configured origin wins over the fallback; scheme-less values get
/// `https://` prefixed and trailing slashes are stripped.
pub fn resolve_share_origin(configured: Option<&str>, fallback: &str) -> String {
    match configured.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => {
            let trimmed = raw.trim_end_matches('/');
            let lower = trimmed.to_ascii_lowercase();
            if lower.starts_with("http://") || lower.starts_with("https://") {
                trimmed.to_string()
            } else {
                format!("https://{trimmed}")
            }
        }
        None => fallback.trim_end_matches('/').to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(date: &str) -> String {
        format!("{ORDER_PREFIX}{date}0000000000123")
    }

    #[test]
    fn test_parse_purchase_date_valid() {
        let parsed = parse_purchase_date(&order("20250101")).unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_parse_purchase_date_wrong_prefix() {
        assert!(parse_purchase_date(&format!("999{}", &order("20250101")[3..])).is_none());
    }

    #[test]
    fn test_parse_purchase_date_wrong_length() {
        assert!(parse_purchase_date("10220250101").is_none());
        assert!(parse_purchase_date(&format!("{}9", order("20250101"))).is_none());
    }

    #[test]
    fn test_parse_purchase_date_not_a_date() {
        // month 13
        assert!(parse_purchase_date(&order("20251301")).is_none());
        // day 32
        assert!(parse_purchase_date(&order("20250132")).is_none());
    }

    #[test]
    fn test_parse_purchase_date_non_digit() {
        assert!(parse_purchase_date(&format!("{}a", &order("20250101")[..23])).is_none());
    }

    #[test]
    fn test_parse_order_number_trims() {
        let raw = format!("  {}  ", order("20240229"));
        assert_eq!(parse_order_number(&raw), Some(order("20240229")));
        assert_eq!(parse_order_number("   "), None);
        assert_eq!(parse_order_number("garbage"), None);
    }

    #[test]
    fn test_parse_valid_days() {
        assert_eq!(parse_valid_days(30), Some(30));
        assert_eq!(parse_valid_days(1), Some(1));
        assert_eq!(parse_valid_days(0), None);
        assert_eq!(parse_valid_days(-5), None);
        assert_eq!(parse_valid_days(i64::from(i32::MAX) + 1), None);
    }

    #[test]
    fn test_derive_expiry_round_trip() {
        // 2025-01-01 purchase + 30 days validity ends 2025-01-30, end of day
        let expiry = derive_expiry(Some(&order("20250101")), Some(30)).unwrap();
        let expected = NaiveDate::from_ymd_opt(2025, 1, 30)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        assert_eq!(expiry, expected);
    }

    #[test]
    fn test_derive_expiry_single_day() {
        // validDays = 1 expires on the purchase date itself
        let expiry = derive_expiry(Some(&order("20250601")), Some(1)).unwrap();
        let expected = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        assert_eq!(expiry, expected);
    }

    #[test]
    fn test_derive_expiry_malformed_order() {
        let bad = format!("103{}", &order("20250101")[3..]);
        assert_eq!(derive_expiry(Some(&bad), Some(30)), None);
        assert_eq!(derive_expiry(None, Some(30)), None);
        assert_eq!(derive_expiry(Some(&order("20250101")), None), None);
    }

    #[test]
    fn test_parse_valid_date() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 15)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        assert_eq!(parse_valid_date("2025-03-15"), Some(expected));
        assert_eq!(parse_valid_date("2025/03/15"), Some(expected));
        assert_eq!(parse_valid_date(""), None);
        assert_eq!(parse_valid_date("not a date"), None);

        let instant = parse_valid_date("2025-03-15T08:30:00Z").unwrap();
        assert!(instant < expected);
    }

    #[test]
    fn test_valid_short_code() {
        assert!(valid_short_code("01234567"));
        assert!(!valid_short_code("0123456"));
        assert!(!valid_short_code("012345678"));
        assert!(!valid_short_code("0123456a"));
    }

    #[test]
    fn test_build_share_link() {
        assert_eq!(
            build_share_link("https://shop.example", "12345678"),
            "https://shop.example/order?code=12345678"
        );
    }

    #[test]
    fn test_resolve_share_origin() {
        assert_eq!(
            resolve_share_origin(Some("https://shop.example/"), "http://localhost:8080"),
            "https://shop.example"
        );
        assert_eq!(
            resolve_share_origin(Some("shop.example"), "http://localhost:8080"),
            "https://shop.example"
        );
        assert_eq!(
            resolve_share_origin(Some("HTTP://shop.example"), "http://localhost:8080"),
            "HTTP://shop.example"
        );
        assert_eq!(
            resolve_share_origin(None, "http://localhost:8080/"),
            "http://localhost:8080"
        );
        assert_eq!(
            resolve_share_origin(Some("   "), "http://localhost:8080"),
            "http://localhost:8080"
        );
    }
}
