//! Decimal money helpers.
//!
//! Prices are `NUMERIC(12,2)` in the database and [`Decimal`] in memory.
//! Floats only appear at the JSON boundary.

use rust_decimal::Decimal;

/// Errors from parsing a user-supplied amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount is not a number: {0:?}")]
    Invalid(String),
    #[error("amount cannot be negative")]
    Negative,
    #[error("amount has more than two decimal places")]
    TooPrecise,
}

/// Price times quantity for one line.
#[must_use]
pub fn line_total(price: Decimal, quantity: i32) -> Decimal {
    price * Decimal::from(quantity)
}

/// Parse a non-negative amount with at most two decimal places.
///
/// Multipart form fields arrive as text, so product prices go through here.
///
/// # Errors
///
/// Returns [`MoneyError`] for non-numeric, negative, or over-precise input.
pub fn parse_amount(s: &str) -> Result<Decimal, MoneyError> {
    let trimmed = s.trim();
    let value: Decimal = trimmed
        .parse()
        .map_err(|_| MoneyError::Invalid(trimmed.to_owned()))?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(MoneyError::Negative);
    }
    if value.normalize().scale() > 2 {
        return Err(MoneyError::TooPrecise);
    }

    Ok(value.round_dp(2))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let price: Decimal = "19.99".parse().unwrap();
        assert_eq!(line_total(price, 3), "59.97".parse::<Decimal>().unwrap());
        assert_eq!(line_total(price, 0), Decimal::ZERO);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 2500 ").unwrap(), Decimal::from(2500));
        assert_eq!(parse_amount("12.50").unwrap(), "12.5".parse::<Decimal>().unwrap());
        assert_eq!(parse_amount("0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_amount_rejects() {
        assert_eq!(parse_amount("-1"), Err(MoneyError::Negative));
        assert_eq!(parse_amount("1.999"), Err(MoneyError::TooPrecise));
        assert!(matches!(parse_amount("ten"), Err(MoneyError::Invalid(_))));
    }
}
