//! Q64.96 square-root price.

use core::fmt;

use crate::error::IrsError;

/// `2^96`, the fixed-point scale of [`SqrtPriceX96`].
pub const Q96: u128 = 1 << 96;

/// `sqrt(1.0001^tick) * 2^96` as an unsigned fixed-point number.
///
/// Every price reachable on the tick grid fits in a `u128`: the largest,
/// at [`MAX_TICK`](super::MAX_TICK), is about `2.5e30`.  Intermediate
/// products are computed in 256/512-bit space by the math module.
///
/// Construction only rejects zero; the grid bounds are enforced by
/// [`tick_math`](crate::math) and the VAMM, which know them.
///
/// # Examples
///
/// ```
/// use irs_amm::domain::{SqrtPriceX96, Q96};
///
/// let one = SqrtPriceX96::new(Q96).unwrap_or(SqrtPriceX96::ONE);
/// assert_eq!(one, SqrtPriceX96::ONE);
/// assert!(SqrtPriceX96::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SqrtPriceX96(u128);

impl SqrtPriceX96 {
    /// Price `1.0` (tick 0).
    pub const ONE: Self = Self(Q96);

    /// Creates a new sqrt price.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::InvalidSqrtPrice`] if `value` is zero.
    pub const fn new(value: u128) -> crate::error::Result<Self> {
        if value == 0 {
            return Err(IrsError::InvalidSqrtPrice("sqrt price must be positive"));
        }
        Ok(Self(value))
    }

    /// Returns the raw Q64.96 value.
    #[must_use]
    pub const fn get(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for SqrtPriceX96 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
