//! Checked fixed-point arithmetic on `U256` at [`PRECISION`] scale.
//!
//! All helpers return [`LedgerError::ArithmeticOverflow`] instead of
//! wrapping or panicking. Divisions always truncate toward zero and hand the
//! remainder back to the caller, so the pool can account for every unit of
//! truncated dust.

use primitive_types::U256;

use crate::constants::PRECISION;
use crate::error::LedgerError;
use crate::types::Amount;

/// `PRECISION` as a `U256`.
pub fn precision() -> U256 {
    U256::from(PRECISION)
}

/// Lift a base-unit amount into the scaled domain (`amount * PRECISION`).
///
/// # Examples
///
/// ```
/// use sluice_core::fixed::{scale, precision};
/// assert_eq!(scale(3).unwrap(), precision() * 3);
/// ```
pub fn scale(amount: Amount) -> Result<U256, LedgerError> {
    mul(U256::from(amount), precision())
}

/// Split a scaled value into whole base units and the scaled remainder.
///
/// `value == units * PRECISION + remainder`, with `remainder < PRECISION`.
pub fn downscale(value: U256) -> Result<(Amount, U256), LedgerError> {
    let (units, remainder) = value.div_mod(precision());
    Ok((to_amount(units)?, remainder))
}

/// Narrow a `U256` to an [`Amount`].
pub fn to_amount(value: U256) -> Result<Amount, LedgerError> {
    if value > U256::from(u128::MAX) {
        return Err(LedgerError::ArithmeticOverflow);
    }
    Ok(value.as_u128())
}

pub fn mul(a: U256, b: U256) -> Result<U256, LedgerError> {
    a.checked_mul(b).ok_or(LedgerError::ArithmeticOverflow)
}

pub fn add(a: U256, b: U256) -> Result<U256, LedgerError> {
    a.checked_add(b).ok_or(LedgerError::ArithmeticOverflow)
}

pub fn sub(a: U256, b: U256) -> Result<U256, LedgerError> {
    a.checked_sub(b).ok_or(LedgerError::ArithmeticOverflow)
}

/// `a * b / divisor`, truncated, together with the remainder of the division.
///
/// The caller guarantees `divisor != 0`; a zero divisor is reported as
/// overflow rather than a panic.
pub fn mul_div(a: U256, b: U256, divisor: U256) -> Result<(U256, U256), LedgerError> {
    if divisor.is_zero() {
        return Err(LedgerError::ArithmeticOverflow);
    }
    Ok(mul(a, b)?.div_mod(divisor))
}
