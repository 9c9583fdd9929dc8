//! Full-precision multiply-divide.
//!
//! `a * b / d` is computed with a 512-bit (or 256-bit) intermediate so the
//! product never overflows before the division.  Only the final quotient
//! must fit in the output type.
//!
//! # Examples
//!
//! ```
//! use irs_amm::domain::Rounding;
//! use irs_amm::math::{mul_div_signed, mul_div_u128};
//!
//! assert_eq!(mul_div_u128(u128::MAX, 4, 8, Rounding::Down).ok(), Some(u128::MAX / 2));
//! assert_eq!(mul_div_u128(10, 1, 3, Rounding::Up).ok(), Some(4));
//! // floor(-10 / 3) = -4
//! assert_eq!(mul_div_signed(-10, 1, 3, Rounding::Down).ok(), Some(-4));
//! ```

use primitive_types::{U256, U512};

use crate::domain::Rounding;
use crate::error::{IrsError, Result};

/// `a * b / denominator` on 256-bit operands with a 512-bit product.
///
/// # Errors
///
/// - [`IrsError::DivisionByZero`] if `denominator` is zero.
/// - [`IrsError::Overflow`] if the quotient exceeds 256 bits.
pub fn mul_div(a: U256, b: U256, denominator: U256, rounding: Rounding) -> Result<U256> {
    if denominator.is_zero() {
        return Err(IrsError::DivisionByZero);
    }
    let product: U512 = a.full_mul(b);
    let (quotient, remainder) = product.div_mod(U512::from(denominator));
    let quotient = if rounding.is_up() && !remainder.is_zero() {
        quotient
            .checked_add(U512::one())
            .ok_or(IrsError::Overflow("mul_div rounding"))?
    } else {
        quotient
    };
    U256::try_from(quotient).map_err(|_| IrsError::Overflow("mul_div result exceeds 256 bits"))
}

/// Narrows a `U256` into a `u128`.
///
/// # Errors
///
/// Returns [`IrsError::Overflow`] with `context` if the value needs more
/// than 128 bits.
pub fn to_u128(value: U256, context: &'static str) -> Result<u128> {
    if value.bits() > 128 {
        return Err(IrsError::Overflow(context));
    }
    Ok(value.low_u128())
}

/// `a * b / denominator` on `u128` operands.
///
/// # Errors
///
/// - [`IrsError::DivisionByZero`] if `denominator` is zero.
/// - [`IrsError::Overflow`] if the quotient exceeds `u128`.
pub fn mul_div_u128(a: u128, b: u128, denominator: u128, rounding: Rounding) -> Result<u128> {
    if denominator == 0 {
        return Err(IrsError::DivisionByZero);
    }
    // Both factors are below 2^128, so the product fits in 256 bits.
    let product = U256::from(a) * U256::from(b);
    let (quotient, remainder) = product.div_mod(U256::from(denominator));
    let quotient = if rounding.is_up() && !remainder.is_zero() {
        quotient + U256::one()
    } else {
        quotient
    };
    to_u128(quotient, "mul_div result exceeds 128 bits")
}

/// `a * b / denominator` for a signed `a`.
///
/// [`Rounding::Down`] floors towards negative infinity and
/// [`Rounding::Up`] ceils towards positive infinity, whatever the sign.
///
/// # Errors
///
/// - [`IrsError::DivisionByZero`] if `denominator` is zero.
/// - [`IrsError::Overflow`] if the quotient does not fit in `i128`.
pub fn mul_div_signed(a: i128, b: u128, denominator: u128, rounding: Rounding) -> Result<i128> {
    let negative = a < 0;
    let magnitude_rounding = if negative { rounding.flip() } else { rounding };
    let magnitude = mul_div_u128(a.unsigned_abs(), b, denominator, magnitude_rounding)?;
    apply_sign(magnitude, negative)
}

/// Re-attaches a sign to a magnitude.
///
/// # Errors
///
/// Returns [`IrsError::Overflow`] if the magnitude does not fit in `i128`.
pub fn apply_sign(magnitude: u128, negative: bool) -> Result<i128> {
    if negative {
        if magnitude == i128::MIN.unsigned_abs() {
            return Ok(i128::MIN);
        }
        let value = i128::try_from(magnitude).map_err(|_| IrsError::Overflow("signed magnitude"))?;
        Ok(-value)
    } else {
        i128::try_from(magnitude).map_err(|_| IrsError::Overflow("signed magnitude"))
    }
}
