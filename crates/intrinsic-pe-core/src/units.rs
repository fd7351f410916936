//! Conversion of raw, display-formatted fields into engine numbers.
//!
//! The data source reports amounts with grouping separators
//! (`"1,03,456"`), ratios as plain decimals (`"24.5"`) and growth figures as
//! percentages (`"12%"`). Missing values arrive as human-readable sentinel
//! strings such as `"Market Cap not found."`.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ValuationError;
use crate::types::{Amount, Rate};
use crate::ValuationResult;

/// Parse a grouped-digit monetary amount into whole currency units.
///
/// Commas are stripped, one leading sign is accepted, and anything else
/// (including a decimal point) is rejected. The value is never rounded.
pub fn parse_amount(raw: &str) -> ValuationResult<Amount> {
    let trimmed = raw.trim();
    let (negative, digits_part) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: String = digits_part.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() {
        return Err(ValuationError::parse("amount", raw, "no digits"));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_digit()) {
        return Err(ValuationError::parse(
            "amount",
            raw,
            format!("unexpected character '{bad}'"),
        ));
    }

    let signed = if negative {
        format!("-{digits}")
    } else {
        digits
    };
    signed
        .parse::<Amount>()
        .map_err(|_| ValuationError::parse("amount", raw, "out of range for a 64-bit amount"))
}

/// Parse a signed decimal ratio such as a P/E or ROCE figure.
///
/// Grouping commas and a trailing `%` are tolerated; the number itself is
/// returned as written (a `%` does not rescale it).
pub fn parse_ratio(field: &str, raw: &str) -> ValuationResult<Decimal> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('%')
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return Err(ValuationError::parse(field, raw, "empty value"));
    }
    Decimal::from_str(&cleaned)
        .map_err(|e| ValuationError::parse(field, raw, e.to_string()))
}

/// Parse a percentage (`"12"`, `"12%"`, `"-3.5 %"`) into a fraction.
pub fn parse_percentage(field: &str, raw: &str) -> ValuationResult<Rate> {
    Ok(parse_ratio(field, raw)? / dec!(100))
}

/// Whether the data source reported this field as missing.
pub fn is_not_found_sentinel(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.to_ascii_lowercase().contains("not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_amount_western_grouping() {
        assert_eq!(parse_amount("1,234,567").unwrap(), 1_234_567);
    }

    #[test]
    fn test_parse_amount_indian_grouping() {
        assert_eq!(parse_amount("1,03,456").unwrap(), 103_456);
    }

    #[test]
    fn test_parse_amount_plain_and_signed() {
        assert_eq!(parse_amount("42").unwrap(), 42);
        assert_eq!(parse_amount("  -1,200 ").unwrap(), -1200);
        assert_eq!(parse_amount("+7").unwrap(), 7);
    }

    #[test]
    fn test_parse_amount_rejects_text() {
        let err = parse_amount("abc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_parse_amount_rejects_decimal_point() {
        assert!(parse_amount("1,234.50").is_err());
    }

    #[test]
    fn test_parse_amount_rejects_empty_and_bare_sign() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount(",").is_err());
        assert!(parse_amount("-").is_err());
        assert!(parse_amount("--5").is_err());
    }

    #[test]
    fn test_parse_amount_overflow() {
        assert!(parse_amount("99,999,999,999,999,999,999").is_err());
    }

    #[test]
    fn test_parse_ratio() {
        assert_eq!(parse_ratio("pe", "24.5").unwrap(), dec!(24.5));
        assert_eq!(parse_ratio("pe", "-3.10").unwrap(), dec!(-3.10));
        assert_eq!(parse_ratio("roce", "31 %").unwrap(), dec!(31));
        assert!(parse_ratio("pe", "n/a").is_err());
    }

    #[test]
    fn test_parse_percentage() {
        assert_eq!(parse_percentage("g", "12%").unwrap(), dec!(0.12));
        assert_eq!(parse_percentage("g", "-3.5").unwrap(), dec!(-0.035));
    }

    #[test]
    fn test_sentinels() {
        assert!(is_not_found_sentinel("Market Cap not found."));
        assert!(is_not_found_sentinel("Stock P/E NOT FOUND"));
        assert!(is_not_found_sentinel("   "));
        assert!(!is_not_found_sentinel("1,234"));
    }
}
