//! Conversions from on-chain integers to decimals, and checked decimal arithmetic.
//!
//! Decimals hold 28 fractional digits. Fixed-point integers with more
//! decimals (ray values have 27, some tokens 30+) are truncated past that.

use aave_rs_sim::math::{pow10, Ray};
use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::error::{Result, StrategyError};

/// Largest scale a [`Decimal`] can carry
const MAX_SCALE: u8 = 28;

fn u256_to_i128(value: U256) -> Result<i128> {
    i128::try_from(value).map_err(|e| StrategyError::Conversion(format!("{value}: {e}")))
}

/// Converts a fixed-point integer with `decimals` fractional digits.
///
/// ```rust
/// use aave_rs_strategy::convert::u256_to_decimal;
/// use alloy_primitives::U256;
/// use rust_decimal::Decimal;
///
/// let amount = u256_to_decimal(U256::from(1_234_500u64), 6).unwrap();
/// assert_eq!(amount, Decimal::new(12345, 4));
/// ```
pub fn u256_to_decimal(value: U256, decimals: u8) -> Result<Decimal> {
    let unit = pow10(decimals)?;
    let integer = value / unit;
    let mut fraction = value % unit;

    let whole = Decimal::try_from_i128_with_scale(u256_to_i128(integer)?, 0)
        .map_err(|e| StrategyError::Conversion(format!("{value}: {e}")))?;

    let scale = decimals.min(MAX_SCALE);
    if decimals > MAX_SCALE {
        fraction /= pow10(decimals - MAX_SCALE)?;
    }
    let fractional = Decimal::try_from_i128_with_scale(u256_to_i128(fraction)?, u32::from(scale))
        .map_err(|e| StrategyError::Conversion(format!("{value}: {e}")))?;

    add(whole, fractional, "u256_to_decimal")
}

/// A ray as a plain ratio, e.g. `0.05 * RAY` -> `0.05`
pub fn ray_to_decimal(value: Ray) -> Result<Decimal> {
    u256_to_decimal(value.raw(), 27)
}

/// A ray rate as a percentage, e.g. `0.05 * RAY` -> `5`
pub fn ray_to_percent(value: Ray) -> Result<Decimal> {
    mul(ray_to_decimal(value)?, Decimal::ONE_HUNDRED, "ray_to_percent")
}

/// Basis points as a ratio, e.g. `7500` -> `0.75`
pub fn bps_to_decimal(bps: u16) -> Decimal {
    Decimal::new(i64::from(bps), 4)
}

/// Basis points as a percentage, e.g. `7500` -> `75`
pub fn bps_to_percent(bps: u16) -> Decimal {
    Decimal::new(i64::from(bps), 2)
}

/// A 6-decimal reward APR as a ratio, e.g. `315_360` -> `0.31536`
pub fn apr_to_decimal(apr: U256) -> Result<Decimal> {
    u256_to_decimal(apr, 6)
}

pub(crate) fn add(a: Decimal, b: Decimal, operation: &'static str) -> Result<Decimal> {
    a.checked_add(b).ok_or(StrategyError::Overflow { operation })
}

pub(crate) fn sub(a: Decimal, b: Decimal, operation: &'static str) -> Result<Decimal> {
    a.checked_sub(b).ok_or(StrategyError::Overflow { operation })
}

pub(crate) fn mul(a: Decimal, b: Decimal, operation: &'static str) -> Result<Decimal> {
    a.checked_mul(b).ok_or(StrategyError::Overflow { operation })
}

/// Callers check the divisor first; a zero divisor surfaces as overflow.
pub(crate) fn div(a: Decimal, b: Decimal, operation: &'static str) -> Result<Decimal> {
    a.checked_div(b).ok_or(StrategyError::Overflow { operation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aave_rs_sim::math::{RAY, WAD};
    use rust_decimal_macros::dec;

    #[test]
    fn test_u256_to_decimal_wad() {
        let value = WAD * U256::from(3) / U256::from(2);
        assert_eq!(u256_to_decimal(value, 18).unwrap(), dec!(1.5));
    }

    #[test]
    fn test_u256_to_decimal_zero_decimals() {
        assert_eq!(u256_to_decimal(U256::from(42), 0).unwrap(), dec!(42));
    }

    #[test]
    fn test_u256_to_decimal_truncates_past_28_digits() {
        // 1 + 1e-30 at 30 decimals keeps only the integer part
        let value = U256::from(10).pow(U256::from(30)) + U256::from(1);
        assert_eq!(u256_to_decimal(value, 30).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_u256_to_decimal_too_large() {
        let err = u256_to_decimal(U256::MAX, 0).unwrap_err();
        assert!(matches!(err, StrategyError::Conversion(_)));
    }

    #[test]
    fn test_u256_to_decimal_i128_boundary() {
        // Above i128::MAX, so it fails before reaching the decimal range check
        let err = u256_to_decimal(U256::from(1) << 127, 0).unwrap_err();
        assert!(matches!(err, StrategyError::Conversion(_)));

        // Fits i128 but not the 96-bit decimal mantissa
        let err = u256_to_decimal(U256::from(1) << 100, 0).unwrap_err();
        assert!(matches!(err, StrategyError::Conversion(_)));

        let max_mantissa = (U256::from(1) << 96) - U256::from(1);
        assert_eq!(u256_to_decimal(max_mantissa, 0).unwrap(), Decimal::MAX);
    }

    #[test]
    fn test_ray_conversions() {
        let rate = Ray::new(RAY * U256::from(34) / U256::from(100));
        assert_eq!(ray_to_decimal(rate).unwrap(), dec!(0.34));
        assert_eq!(ray_to_percent(rate).unwrap(), dec!(34));
        assert_eq!(ray_to_decimal(Ray::ONE).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_bps_conversions() {
        assert_eq!(bps_to_decimal(7_500), dec!(0.75));
        assert_eq!(bps_to_percent(10_500), dec!(105));
        assert_eq!(bps_to_decimal(9), dec!(0.0009));
    }

    #[test]
    fn test_apr_to_decimal() {
        assert_eq!(apr_to_decimal(U256::from(315_360)).unwrap(), dec!(0.31536));
    }

    #[test]
    fn test_checked_ops_report_overflow() {
        assert!(matches!(
            mul(Decimal::MAX, dec!(2), "test"),
            Err(StrategyError::Overflow { operation: "test" })
        ));
        assert!(div(Decimal::ONE, Decimal::ZERO, "test").is_err());
    }
}
