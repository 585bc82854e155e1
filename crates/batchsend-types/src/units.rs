//! Amounts and decimal unit conversion.
//!
//! Amounts are always integers in the asset's base unit (wei for the native
//! unit). Human-facing decimal strings are converted at the edges with
//! [`parse_units`] and [`format_units`]; the engine itself never sees a
//! fractional value.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::constants::{MAX_DECIMALS, NATIVE_DECIMALS};

/// An amount of value in base units.
pub type Amount = u128;

/// Failure converting between decimal text and base units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("not a decimal number")]
    InvalidNumber,
    #[error("amount must not be negative")]
    Negative,
    #[error("amount has more than {decimals} decimal places")]
    TooPrecise { decimals: u32 },
    #[error("amount does not fit in base units")]
    Overflow,
    #[error("amount cannot be represented as a decimal with {decimals} places")]
    Unrepresentable { decimals: u32 },
}

/// Parse a decimal string (e.g. `"1.5"`) into base units with `decimals`
/// fractional digits.
///
/// # Errors
/// Rejects malformed text, negative values, more fractional digits than
/// `decimals`, and results that overflow [`Amount`].
pub fn parse_units(text: &str, decimals: u32) -> Result<Amount, UnitsError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::Overflow);
    }
    let value = Decimal::from_str(text.trim())
        .map_err(|_| UnitsError::InvalidNumber)?
        .normalize();
    if value.is_sign_negative() && !value.is_zero() {
        return Err(UnitsError::Negative);
    }
    let scale = value.scale();
    if scale > decimals {
        return Err(UnitsError::TooPrecise { decimals });
    }
    let mantissa = value.mantissa().unsigned_abs();
    10u128
        .checked_pow(decimals - scale)
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or(UnitsError::Overflow)
}

/// Convert base units into a normalized [`Decimal`] with `decimals`
/// fractional digits.
///
/// # Errors
/// Returns [`UnitsError::Unrepresentable`] when the amount exceeds the
/// 96-bit decimal mantissa or `decimals` exceeds the decimal scale limit.
pub fn to_decimal(amount: Amount, decimals: u32) -> Result<Decimal, UnitsError> {
    let unrepresentable = UnitsError::Unrepresentable { decimals };
    let mantissa = i128::try_from(amount).map_err(|_| unrepresentable.clone())?;
    Decimal::try_from_i128_with_scale(mantissa, decimals)
        .map(|d| d.normalize())
        .map_err(|_| unrepresentable)
}

/// Render base units as a decimal string, e.g. `1_500_000_000_000_000_000`
/// with 18 decimals becomes `"1.5"`.
///
/// # Errors
/// See [`to_decimal`].
pub fn format_units(amount: Amount, decimals: u32) -> Result<String, UnitsError> {
    to_decimal(amount, decimals).map(|d| d.to_string())
}

/// [`parse_units`] with the native unit's 18 decimals.
pub fn parse_ether(text: &str) -> Result<Amount, UnitsError> {
    parse_units(text, NATIVE_DECIMALS)
}

/// [`format_units`] with the native unit's 18 decimals.
pub fn format_ether(amount: Amount) -> Result<String, UnitsError> {
    format_units(amount, NATIVE_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_ETHER: Amount = 1_000_000_000_000_000_000;

    #[test]
    fn parse_whole_and_fractional() {
        assert_eq!(parse_ether("1").unwrap(), ONE_ETHER);
        assert_eq!(parse_ether("1.5").unwrap(), ONE_ETHER * 3 / 2);
        assert_eq!(parse_ether("0.5").unwrap(), ONE_ETHER / 2);
        assert_eq!(parse_ether(" 2.0 ").unwrap(), 2 * ONE_ETHER);
        assert_eq!(parse_units("100", 6).unwrap(), 100_000_000);
        assert_eq!(parse_units("0", 6).unwrap(), 0);
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        assert_eq!(parse_units("1.50", 1).unwrap(), 15);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(parse_ether("abc").unwrap_err(), UnitsError::InvalidNumber);
        assert_eq!(parse_ether("-1").unwrap_err(), UnitsError::Negative);
        assert_eq!(
            parse_units("0.123", 2).unwrap_err(),
            UnitsError::TooPrecise { decimals: 2 }
        );
        assert_eq!(parse_units("1", 39).unwrap_err(), UnitsError::Overflow);
    }

    #[test]
    fn parse_overflow_fails_closed() {
        // 79_228_162_514 * 10^30 > u128::MAX
        assert_eq!(
            parse_units("79228162514", 30).unwrap_err(),
            UnitsError::Overflow
        );
    }

    #[test]
    fn format_normalizes() {
        assert_eq!(format_ether(ONE_ETHER).unwrap(), "1");
        assert_eq!(format_ether(ONE_ETHER * 3 / 2).unwrap(), "1.5");
        assert_eq!(format_units(0, 6).unwrap(), "0");
        assert_eq!(format_units(1, 6).unwrap(), "0.000001");
    }

    #[test]
    fn format_rejects_huge_amounts() {
        assert_eq!(
            format_ether(u128::MAX).unwrap_err(),
            UnitsError::Unrepresentable { decimals: 18 }
        );
    }
}
