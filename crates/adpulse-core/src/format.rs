//! Display formatting for KPI values (en-US conventions).
//!
//! All rounding is half away from zero on the exact decimal value.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),
}

/// An amount to render as currency: an exact decimal, a float, or text.
#[derive(Debug, Clone, Copy)]
pub enum Amount<'a> {
    Decimal(Decimal),
    Float(f64),
    Text(&'a str),
}

impl From<Decimal> for Amount<'_> {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<f64> for Amount<'_> {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for Amount<'_> {
    fn from(value: i64) -> Self {
        Self::Decimal(Decimal::from(value))
    }
}

impl<'a> From<&'a str> for Amount<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for Amount<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value.as_str())
    }
}

impl Amount<'_> {
    fn to_decimal(self) -> Result<Decimal, FormatError> {
        match self {
            Self::Decimal(d) => Ok(d),
            Self::Float(f) => {
                Decimal::try_from(f).map_err(|_| FormatError::InvalidAmount(f.to_string()))
            }
            Self::Text(s) => {
                let trimmed = s.trim();
                Decimal::from_str(trimmed)
                    .or_else(|_| Decimal::from_scientific(trimmed))
                    .map_err(|_| FormatError::InvalidAmount(s.to_string()))
            }
        }
    }
}

/// Symbol and minor-unit digits for currencies with a dedicated en-US symbol.
fn currency_symbol(code: &str) -> Option<(&'static str, u32)> {
    let style = match code {
        "USD" => ("$", 2),
        "EUR" => ("€", 2),
        "GBP" => ("£", 2),
        "JPY" => ("¥", 0),
        "KRW" => ("₩", 0),
        "CAD" => ("CA$", 2),
        "AUD" => ("A$", 2),
        "NZD" => ("NZ$", 2),
        "MXN" => ("MX$", 2),
        "BRL" => ("R$", 2),
        "INR" => ("₹", 2),
        "CNY" => ("CN¥", 2),
        "ILS" => ("₪", 2),
        "VND" => ("₫", 0),
        _ => return None,
    };
    Some(style)
}

fn normalize_currency_code(currency: &str) -> Result<String, FormatError> {
    let code = currency.trim().to_ascii_uppercase();
    if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(code)
    } else {
        Err(FormatError::InvalidCurrency(currency.to_string()))
    }
}

/// Round to exactly `digits` fraction digits and render without grouping.
fn fixed(value: Decimal, digits: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(digits);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.to_string()
}

fn group_thousands(unsigned: &str) -> String {
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Render `amount` as a currency string, e.g. `$1,234.50`.
///
/// `currency` is an ISO 4217 code (case-insensitive). Codes without a
/// dedicated symbol render with the code as prefix: `CHF 1,234.50`.
///
/// # Errors
///
/// Returns [`FormatError::InvalidAmount`] when a text amount is not a number
/// or a float is NaN/infinite, and [`FormatError::InvalidCurrency`] when the
/// code is not three ASCII letters.
pub fn format_currency<'a>(
    amount: impl Into<Amount<'a>>,
    currency: &str,
) -> Result<String, FormatError> {
    let value = amount.into().to_decimal()?;
    let code = normalize_currency_code(currency)?;

    let (prefix, digits) = match currency_symbol(&code) {
        Some((symbol, digits)) => (symbol.to_string(), digits),
        None => (format!("{code}\u{a0}"), 2),
    };

    let rendered = fixed(value.abs(), digits);
    let sign = if value.is_sign_negative() && rendered.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        "-"
    } else {
        ""
    };
    Ok(format!("{sign}{prefix}{}", group_thousands(&rendered)))
}

/// Compact magnitude: `1.5M`, `2.5K`, or the plain value below one thousand.
#[must_use]
pub fn format_number(n: Decimal) -> String {
    let million = Decimal::from(1_000_000);
    let thousand = Decimal::ONE_THOUSAND;

    if n >= million {
        format!("{}M", fixed(n / million, 1))
    } else if n >= thousand {
        format!("{}K", fixed(n / thousand, 1))
    } else {
        n.normalize().to_string()
    }
}

/// One fraction digit followed by `%`, e.g. `4.8%`.
#[must_use]
pub fn format_percentage(n: Decimal) -> String {
    format!("{}%", fixed(n, 1))
}

/// One fraction digit followed by `x`, e.g. `4.3x`.
#[must_use]
pub fn format_roas(n: Decimal) -> String {
    format!("{}x", fixed(n, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_usd_groups_and_pads() {
        assert_eq!(format_currency(1234.5, "USD").unwrap(), "$1,234.50");
        assert_eq!(format_currency("1234.5", "USD").unwrap(), "$1,234.50");
        assert_eq!(
            format_currency(Decimal::new(123_456_789, 2), "USD").unwrap(),
            "$1,234,567.89"
        );
        assert_eq!(format_currency(0.0, "USD").unwrap(), "$0.00");
        assert_eq!(format_currency(999_i64, "USD").unwrap(), "$999.00");
    }

    #[test]
    fn currency_rounds_half_away_from_zero() {
        assert_eq!(format_currency("0.125", "USD").unwrap(), "$0.13");
        assert_eq!(format_currency("-0.125", "USD").unwrap(), "-$0.13");
        assert_eq!(format_currency("999.995", "USD").unwrap(), "$1,000.00");
    }

    #[test]
    fn currency_negative_amounts_lead_with_sign() {
        assert_eq!(format_currency(-1234.5, "USD").unwrap(), "-$1,234.50");
    }

    #[test]
    fn currency_negative_that_rounds_to_zero_has_no_sign() {
        assert_eq!(format_currency("-0.001", "USD").unwrap(), "$0.00");
    }

    #[test]
    fn currency_uses_per_code_symbol_and_digits() {
        assert_eq!(format_currency(1234.5, "EUR").unwrap(), "€1,234.50");
        assert_eq!(format_currency(1234.5, "GBP").unwrap(), "£1,234.50");
        assert_eq!(format_currency(1234.5, "JPY").unwrap(), "¥1,235");
        assert_eq!(format_currency(1234.5, "CAD").unwrap(), "CA$1,234.50");
    }

    #[test]
    fn currency_code_is_case_insensitive() {
        assert_eq!(format_currency(10_i64, "usd").unwrap(), "$10.00");
    }

    #[test]
    fn currency_without_symbol_uses_code_prefix() {
        assert_eq!(format_currency(1234.5, "CHF").unwrap(), "CHF\u{a0}1,234.50");
    }

    #[test]
    fn currency_rejects_malformed_code() {
        assert_eq!(
            format_currency(1_i64, "US"),
            Err(FormatError::InvalidCurrency("US".to_string()))
        );
        assert!(format_currency(1_i64, "US1").is_err());
        assert!(format_currency(1_i64, "dollars").is_err());
    }

    #[test]
    fn currency_rejects_non_numeric_text() {
        assert_eq!(
            format_currency("not-a-number", "USD"),
            Err(FormatError::InvalidAmount("not-a-number".to_string()))
        );
        assert!(format_currency("", "USD").is_err());
    }

    #[test]
    fn currency_rejects_non_finite_floats() {
        assert!(matches!(
            format_currency(f64::NAN, "USD"),
            Err(FormatError::InvalidAmount(_))
        ));
        assert!(format_currency(f64::INFINITY, "USD").is_err());
    }

    #[test]
    fn number_compacts_millions_and_thousands() {
        assert_eq!(format_number(Decimal::from(1_500_000)), "1.5M");
        assert_eq!(format_number(Decimal::from(2_500)), "2.5K");
        assert_eq!(format_number(Decimal::from(42)), "42");
    }

    #[test]
    fn number_boundaries() {
        assert_eq!(format_number(Decimal::from(999)), "999");
        assert_eq!(format_number(Decimal::from(1_000)), "1.0K");
        assert_eq!(format_number(Decimal::from(1_000_000)), "1.0M");
        assert_eq!(format_number(Decimal::from(12_345_678)), "12.3M");
    }

    #[test]
    fn number_rounds_half_away_from_zero() {
        assert_eq!(format_number(Decimal::from(1_050)), "1.1K");
        assert_eq!(format_number(Decimal::from(1_249_999)), "1.2M");
        assert_eq!(format_number(Decimal::from(1_250_000)), "1.3M");
    }

    #[test]
    fn number_small_values_render_plainly() {
        assert_eq!(format_number(Decimal::new(4250, 2)), "42.5");
        assert_eq!(format_number(Decimal::ZERO), "0");
        assert_eq!(format_number(Decimal::from(-5_000)), "-5000");
    }

    #[test]
    fn percentage_has_one_fraction_digit() {
        assert_eq!(format_percentage(Decimal::new(48_234, 4)), "4.8%");
        assert_eq!(format_percentage(Decimal::from(5)), "5.0%");
        assert_eq!(format_percentage(Decimal::ZERO), "0.0%");
        assert_eq!(format_percentage(Decimal::new(485, 2)), "4.9%");
    }

    #[test]
    fn roas_renders_multiplier() {
        assert_eq!(format_roas(Decimal::new(43_333, 4)), "4.3x");
        assert_eq!(format_roas(Decimal::ZERO), "0.0x");
    }
}
