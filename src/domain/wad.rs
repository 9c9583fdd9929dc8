//! Signed 18-decimal fixed-point number.

use core::fmt;

/// Number of base units in one whole [`Wad`].
pub const WAD: i128 = 1_000_000_000_000_000_000;

/// A signed fixed-point value with 18 decimals.
///
/// `Wad` is the unit of account for margins, fixed/variable token balances,
/// fees, rates and calculator parameters.  A token quantity of `100` is
/// `Wad::from_integer(100)`; a rate of 1% expressed as a fraction is
/// `Wad::from_raw(10_000_000_000_000_000)`.
///
/// Inherent arithmetic is checked and returns `None` on overflow.
/// Multiplication and division live on
/// [`CheckedArithmetic`](crate::math::CheckedArithmetic), which takes an
/// explicit rounding direction.
///
/// # Examples
///
/// ```
/// use irs_amm::domain::Wad;
///
/// let a = Wad::from_integer(3);
/// let b = Wad::from_integer(-5);
/// assert_eq!(a.checked_add(&b), Some(Wad::from_integer(-2)));
/// assert!(b.is_negative());
/// assert_eq!(Wad::from_integer(2).to_string(), "2.000000000000000000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct Wad(i128);

impl Wad {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// One whole unit.
    pub const ONE: Self = Self(WAD);

    /// Largest representable value.
    pub const MAX: Self = Self(i128::MAX);

    /// Smallest representable value.
    pub const MIN: Self = Self(i128::MIN);

    /// Wraps a raw value already scaled by `10^18`.
    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    /// Scales a whole number by `10^18`.  Every `i64` fits.
    pub const fn from_integer(value: i64) -> Self {
        Self(value as i128 * WAD)
    }

    /// `numerator / denominator` rounded towards zero.
    ///
    /// Returns `None` if `denominator` is zero.
    #[must_use]
    pub const fn from_fraction(numerator: i64, denominator: i64) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        Some(Self(numerator as i128 * WAD / denominator as i128))
    }

    /// Returns the raw scaled value.
    #[must_use]
    pub const fn raw(&self) -> i128 {
        self.0
    }

    /// Returns `true` if zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if strictly negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `true` if strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Magnitude as raw `u128`.
    #[must_use]
    pub const fn unsigned_abs(&self) -> u128 {
        self.0.unsigned_abs()
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(&self, other: &Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(&self, other: &Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked negation.  Fails only for [`Wad::MIN`].
    #[must_use]
    pub const fn checked_neg(&self) -> Option<Self> {
        match self.0.checked_neg() {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Clamps negative values to zero.
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Self::ZERO
        } else {
            *self
        }
    }
}

impl fmt::Display for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let scale = WAD.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:018}",
            magnitude / scale,
            magnitude % scale
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants() {
        assert_eq!(Wad::ZERO.raw(), 0);
        assert_eq!(Wad::ONE.raw(), WAD);
        assert_eq!(Wad::from_integer(7).raw(), 7 * WAD);
    }

    #[test]
    fn fractions() {
        assert_eq!(Wad::from_fraction(1, 2), Some(Wad::from_raw(WAD / 2)));
        assert_eq!(Wad::from_fraction(-1, 4), Some(Wad::from_raw(-WAD / 4)));
        assert_eq!(Wad::from_fraction(1, 0), None);
    }

    #[test]
    fn checked_ops() {
        let a = Wad::from_integer(5);
        let b = Wad::from_integer(8);
        assert_eq!(a.checked_sub(&b), Some(Wad::from_integer(-3)));
        assert_eq!(Wad::MAX.checked_add(&Wad::ONE), None);
        assert_eq!(Wad::MIN.checked_sub(&Wad::ONE), None);
        assert_eq!(Wad::MIN.checked_neg(), None);
        assert_eq!(a.checked_neg(), Some(Wad::from_integer(-5)));
    }

    #[test]
    fn sign_helpers() {
        assert!(Wad::from_integer(-1).is_negative());
        assert!(Wad::ONE.is_positive());
        assert!(Wad::ZERO.is_zero());
        assert_eq!(Wad::from_integer(-4).clamp_non_negative(), Wad::ZERO);
        assert_eq!(Wad::from_integer(-4).unsigned_abs(), 4 * WAD.unsigned_abs());
    }

    #[test]
    fn display() {
        assert_eq!(Wad::from_raw(-1_500_000_000_000_000_000).to_string(), "-1.500000000000000000");
        assert_eq!(Wad::from_raw(1).to_string(), "0.000000000000000001");
    }
}
