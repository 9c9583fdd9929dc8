//! Checked arithmetic trait for domain wrapper types.
//!
//! The [`CheckedArithmetic`] trait provides fallible arithmetic that
//! returns [`Result<Self, IrsError>`](crate::error::IrsError) instead of
//! panicking or wrapping on overflow.
//!
//! # Implementations
//!
//! - [`Wad`]: signed 18-decimal fixed point; `safe_mul` and `safe_div`
//!   rescale by `10^18`.
//!
//! # Examples
//!
//! ```
//! use irs_amm::domain::{Rounding, Wad};
//! use irs_amm::math::CheckedArithmetic;
//!
//! let half = Wad::from_fraction(1, 2).expect("non-zero denominator");
//! let r = Wad::from_integer(-3).safe_mul(&half, Rounding::Down);
//! assert_eq!(r.ok(), Some(Wad::from_fraction(-3, 2).expect("non-zero")));
//! ```

use super::full_math::{apply_sign, mul_div_u128};
use crate::domain::{Rounding, Wad, WAD};
use crate::error::IrsError;

/// Fallible arithmetic for domain wrapper types.
///
/// # Contract
///
/// - **No panics**: all error conditions produce `Err`.
/// - **No saturation**: errors propagate instead.
/// - Rounding of [`Rounding::Down`] is towards negative infinity and
///   [`Rounding::Up`] towards positive infinity, whatever the sign.
pub trait CheckedArithmetic: Sized {
    /// Checked addition.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::Overflow`] if the result is not representable.
    fn safe_add(&self, other: &Self) -> Result<Self, IrsError>;

    /// Checked subtraction.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::Underflow`] if the result is not representable.
    fn safe_sub(&self, other: &Self) -> Result<Self, IrsError>;

    /// Checked multiplication with explicit [`Rounding`].
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::Overflow`] if the result is not representable.
    fn safe_mul(&self, other: &Self, rounding: Rounding) -> Result<Self, IrsError>;

    /// Checked division with explicit [`Rounding`].
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::DivisionByZero`] if `other` is zero.
    fn safe_div(&self, other: &Self, rounding: Rounding) -> Result<Self, IrsError>;
}

// ---------------------------------------------------------------------------
// Wad
// ---------------------------------------------------------------------------

/// `a * b / d` on signed operands with sign-aware rounding.
fn signed_mul_div(a: i128, b: i128, d: i128, rounding: Rounding) -> Result<i128, IrsError> {
    if d == 0 {
        return Err(IrsError::DivisionByZero);
    }
    let negative = (a < 0) ^ (b < 0) ^ (d < 0);
    let magnitude_rounding = if negative { rounding.flip() } else { rounding };
    let magnitude = mul_div_u128(
        a.unsigned_abs(),
        b.unsigned_abs(),
        d.unsigned_abs(),
        magnitude_rounding,
    )?;
    if magnitude == 0 {
        return Ok(0);
    }
    apply_sign(magnitude, negative)
}

impl CheckedArithmetic for Wad {
    #[inline]
    fn safe_add(&self, other: &Self) -> Result<Self, IrsError> {
        self.checked_add(other)
            .ok_or(IrsError::Overflow("wad addition overflow"))
    }

    #[inline]
    fn safe_sub(&self, other: &Self) -> Result<Self, IrsError> {
        self.checked_sub(other)
            .ok_or(IrsError::Underflow("wad subtraction underflow"))
    }

    fn safe_mul(&self, other: &Self, rounding: Rounding) -> Result<Self, IrsError> {
        signed_mul_div(self.raw(), other.raw(), WAD, rounding).map(Wad::from_raw)
    }

    fn safe_div(&self, other: &Self, rounding: Rounding) -> Result<Self, IrsError> {
        if other.is_zero() {
            return Err(IrsError::DivisionByZero);
        }
        signed_mul_div(self.raw(), WAD, other.raw(), rounding).map(Wad::from_raw)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    mod wad {
        use super::*;

        fn w(n: i64) -> Wad {
            Wad::from_integer(n)
        }

        #[test]
        fn add_and_sub() {
            assert_eq!(w(2).safe_add(&w(3)), Ok(w(5)));
            assert_eq!(w(2).safe_sub(&w(3)), Ok(w(-1)));
            let Err(IrsError::Overflow(_)) = Wad::MAX.safe_add(&Wad::from_raw(1)) else {
                panic!("expected Overflow");
            };
            let Err(IrsError::Underflow(_)) = Wad::MIN.safe_sub(&Wad::from_raw(1)) else {
                panic!("expected Underflow");
            };
        }

        #[test]
        fn mul_rescales() {
            assert_eq!(w(4).safe_mul(&w(-3), Rounding::Down), Ok(w(-12)));
            let Some(half) = Wad::from_fraction(1, 2) else {
                panic!("expected Some");
            };
            assert_eq!(w(7).safe_mul(&half, Rounding::Down), Wad::from_fraction(7, 2).ok_or(IrsError::DivisionByZero));
        }

        #[test]
        fn mul_rounding_is_directional() {
            let tiny = Wad::from_raw(1);
            let Ok(down) = tiny.safe_mul(&tiny, Rounding::Down) else {
                panic!("expected Ok");
            };
            let Ok(up) = tiny.safe_mul(&tiny, Rounding::Up) else {
                panic!("expected Ok");
            };
            assert_eq!(down, Wad::ZERO);
            assert_eq!(up, Wad::from_raw(1));

            let neg = Wad::from_raw(-1);
            assert_eq!(neg.safe_mul(&tiny, Rounding::Down), Ok(Wad::from_raw(-1)));
            assert_eq!(neg.safe_mul(&tiny, Rounding::Up), Ok(Wad::ZERO));
        }

        #[test]
        fn div() {
            assert_eq!(w(9).safe_div(&w(3), Rounding::Down), Ok(w(3)));
            assert_eq!(
                Wad::from_raw(10).safe_div(&w(3), Rounding::Down),
                Ok(Wad::from_raw(3))
            );
            assert_eq!(
                Wad::from_raw(10).safe_div(&w(3), Rounding::Up),
                Ok(Wad::from_raw(4))
            );
            assert_eq!(
                Wad::from_raw(-10).safe_div(&w(3), Rounding::Down),
                Ok(Wad::from_raw(-4))
            );
            assert_eq!(w(1).safe_div(&Wad::ZERO, Rounding::Up), Err(IrsError::DivisionByZero));
        }

        #[test]
        fn mul_overflow() {
            let Err(IrsError::Overflow(_)) = Wad::MAX.safe_mul(&w(2), Rounding::Down) else {
                panic!("expected Overflow");
            };
        }
    }
}
