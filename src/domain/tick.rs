//! Discrete fixed-rate boundary on the VAMM curve.

use core::fmt;

use crate::error::IrsError;

/// Minimum valid tick index.  `1.0001^-69100` is a fixed rate of ~1000%.
pub const MIN_TICK: i32 = -69_100;

/// Maximum valid tick index.  `1.0001^69100` is a fixed rate of ~0.001%.
pub const MAX_TICK: i32 = 69_100;

/// A discrete point on the VAMM price curve.
///
/// The VAMM price is `1.0001^tick` and the fixed rate it quotes, in percent,
/// is the reciprocal: tick `0` is a 1% fixed rate, positive ticks are lower
/// rates and negative ticks are higher rates.
///
/// # Examples
///
/// ```
/// use irs_amm::domain::Tick;
///
/// let tick = Tick::new(60).unwrap_or(Tick::ZERO);
/// assert_eq!(tick.get(), 60);
/// assert!(tick.is_aligned(60));
/// assert!(Tick::new(70_000).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(i32);

impl Tick {
    /// Minimum valid tick.
    pub const MIN: Self = Self(MIN_TICK);

    /// Maximum valid tick.
    pub const MAX: Self = Self(MAX_TICK);

    /// Tick `0`, a fixed rate of exactly 1%.
    pub const ZERO: Self = Self(0);

    /// Creates a new `Tick` with range validation.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::InvalidTick`] if `value` is outside
    /// `[-69100, 69100]`.
    pub const fn new(value: i32) -> crate::error::Result<Self> {
        if value < MIN_TICK || value > MAX_TICK {
            return Err(IrsError::InvalidTick("tick out of range [-69100, 69100]"));
        }
        Ok(Self(value))
    }

    /// Returns the underlying tick index.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Returns `true` if the tick lies on a grid of the given spacing.
    ///
    /// A spacing of zero aligns nothing.
    #[must_use]
    pub const fn is_aligned(&self, spacing: i32) -> bool {
        spacing > 0 && self.0 % spacing == 0
    }

    /// Checked addition of a delta.  `None` if the result leaves the range.
    #[must_use]
    pub const fn checked_add(&self, delta: i32) -> Option<Self> {
        match self.0.checked_add(delta) {
            Some(v) if v >= MIN_TICK && v <= MAX_TICK => Some(Self(v)),
            _ => None,
        }
    }

    /// Checked subtraction of a delta.  `None` if the result leaves the range.
    #[must_use]
    pub const fn checked_sub(&self, delta: i32) -> Option<Self> {
        match self.0.checked_sub(delta) {
            Some(v) if v >= MIN_TICK && v <= MAX_TICK => Some(Self(v)),
            _ => None,
        }
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tick({})", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn valid_bounds() {
        let Ok(lo) = Tick::new(MIN_TICK) else {
            panic!("expected Ok");
        };
        let Ok(hi) = Tick::new(MAX_TICK) else {
            panic!("expected Ok");
        };
        assert_eq!(lo, Tick::MIN);
        assert_eq!(hi, Tick::MAX);
    }

    #[test]
    fn out_of_range() {
        let Err(e) = Tick::new(MAX_TICK + 1) else {
            panic!("expected Err");
        };
        assert_eq!(e, IrsError::InvalidTick("tick out of range [-69100, 69100]"));
        assert!(Tick::new(MIN_TICK - 1).is_err());
        assert!(Tick::new(i32::MIN).is_err());
    }

    #[test]
    fn alignment() {
        let Ok(t) = Tick::new(-120) else {
            panic!("expected Ok");
        };
        assert!(t.is_aligned(60));
        assert!(!t.is_aligned(50));
        assert!(!t.is_aligned(0));
    }

    #[test]
    fn checked_arithmetic_stays_in_range() {
        assert_eq!(Tick::MAX.checked_add(1), None);
        assert_eq!(Tick::MIN.checked_sub(1), None);
        assert_eq!(Tick::ZERO.checked_sub(60), Tick::new(-60).ok());
    }

    #[test]
    fn display() {
        assert_eq!(Tick::ZERO.to_string(), "Tick(0)");
    }
}
