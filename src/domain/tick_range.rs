//! Ordered, grid-aligned pair of ticks bounding a position.

use core::fmt;

use super::Tick;
use crate::error::IrsError;

/// The `[lower, upper)` tick interval of a position.
///
/// # Invariants
///
/// - `lower < upper`.
/// - Both bounds are multiples of the instance's tick spacing (checked by
///   [`TickRange::new`] against the spacing it is given).
///
/// # Examples
///
/// ```
/// use irs_amm::domain::TickRange;
///
/// let range = TickRange::new(-60, 60, 60);
/// assert!(range.is_ok());
/// assert!(TickRange::new(60, -60, 60).is_err());
/// assert!(TickRange::new(-50, 60, 60).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickRange {
    lower: Tick,
    upper: Tick,
}

impl TickRange {
    /// Creates a validated range.
    ///
    /// # Errors
    ///
    /// - [`IrsError::InvalidTick`] if either bound is outside the tick domain.
    /// - [`IrsError::InvalidTickRange`] if `lower >= upper` or either bound
    ///   is off the `spacing` grid.
    pub fn new(lower: i32, upper: i32, spacing: i32) -> crate::error::Result<Self> {
        let lower = Tick::new(lower)?;
        let upper = Tick::new(upper)?;
        if lower >= upper {
            return Err(IrsError::InvalidTickRange(
                "lower tick must be less than upper tick",
            ));
        }
        if !lower.is_aligned(spacing) || !upper.is_aligned(spacing) {
            return Err(IrsError::InvalidTickRange(
                "ticks must be aligned to tick spacing",
            ));
        }
        Ok(Self { lower, upper })
    }

    /// Lower bound (inclusive).
    #[must_use]
    pub const fn lower(&self) -> Tick {
        self.lower
    }

    /// Upper bound (exclusive).
    #[must_use]
    pub const fn upper(&self) -> Tick {
        self.upper
    }

    /// Returns `true` if `tick` lies in `[lower, upper)`.
    #[must_use]
    pub const fn contains(&self, tick: i32) -> bool {
        self.lower.get() <= tick && tick < self.upper.get()
    }
}

impl fmt::Display for TickRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.lower.get(), self.upper.get())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn valid_range() {
        let Ok(r) = TickRange::new(-120, 60, 60) else {
            panic!("expected Ok");
        };
        assert_eq!(r.lower().get(), -120);
        assert_eq!(r.upper().get(), 60);
        assert_eq!(r.to_string(), "[-120, 60)");
    }

    #[test]
    fn misordered() {
        let Err(e) = TickRange::new(60, 60, 60) else {
            panic!("expected Err");
        };
        assert_eq!(
            e,
            IrsError::InvalidTickRange("lower tick must be less than upper tick")
        );
    }

    #[test]
    fn misaligned() {
        let Err(e) = TickRange::new(-60, 90, 60) else {
            panic!("expected Err");
        };
        assert_eq!(
            e,
            IrsError::InvalidTickRange("ticks must be aligned to tick spacing")
        );
    }

    #[test]
    fn out_of_domain() {
        assert!(matches!(
            TickRange::new(-69_120, 0, 60),
            Err(IrsError::InvalidTick(_))
        ));
    }

    #[test]
    fn contains_is_half_open() {
        let Ok(r) = TickRange::new(-60, 60, 60) else {
            panic!("expected Ok");
        };
        assert!(r.contains(-60));
        assert!(r.contains(59));
        assert!(!r.contains(60));
        assert!(!r.contains(-61));
    }
}
