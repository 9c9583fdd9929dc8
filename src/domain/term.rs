//! Timestamps and the maturity window of an instance.

use core::fmt;

use super::{Wad, WAD};
use crate::error::IrsError;

/// Seconds in a 365-day year, the day-count basis for all rate math.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// A point on the globally agreed clock, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from seconds.
    #[must_use]
    pub const fn new(seconds: u64) -> Self {
        Self(seconds)
    }

    /// Returns the seconds value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Adds a number of seconds.  `None` on overflow.
    #[must_use]
    pub const fn checked_add(&self, seconds: u64) -> Option<Self> {
        match self.0.checked_add(seconds) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Seconds from `self` until `later`, or zero if `later` is not later.
    #[must_use]
    pub const fn seconds_until(&self, later: Self) -> u64 {
        later.0.saturating_sub(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Converts a number of seconds into years as a [`Wad`], rounded down.
#[must_use]
pub const fn seconds_to_years(seconds: u64) -> Wad {
    Wad::from_raw(seconds as i128 * WAD / SECONDS_PER_YEAR as i128)
}

/// The `[start, end]` life of an instance.
///
/// # Examples
///
/// ```
/// use irs_amm::domain::{TermWindow, Timestamp};
///
/// let term = TermWindow::new(Timestamp::new(0), Timestamp::new(86_400));
/// assert!(term.is_ok());
/// assert!(TermWindow::new(Timestamp::new(5), Timestamp::new(5)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TermWindow {
    start: Timestamp,
    end: Timestamp,
}

impl TermWindow {
    /// Creates a window.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::InvalidConfiguration`] if `start >= end`.
    pub const fn new(start: Timestamp, end: Timestamp) -> crate::error::Result<Self> {
        if start.0 >= end.0 {
            return Err(IrsError::InvalidConfiguration(
                "term start must precede term end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Term start.
    #[must_use]
    pub const fn start(&self) -> Timestamp {
        self.start
    }

    /// Term end (maturity).
    #[must_use]
    pub const fn end(&self) -> Timestamp {
        self.end
    }

    /// Full term length in seconds.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.end.0 - self.start.0
    }

    /// `true` once `now` has reached maturity.
    #[must_use]
    pub const fn is_matured(&self, now: Timestamp) -> bool {
        now.0 >= self.end.0
    }

    /// Seconds left until maturity, zero once matured.
    #[must_use]
    pub const fn seconds_to_maturity(&self, now: Timestamp) -> u64 {
        now.seconds_until(self.end)
    }

    /// Seconds elapsed since the term started, capped at the full term.
    #[must_use]
    pub const fn seconds_elapsed(&self, now: Timestamp) -> u64 {
        let elapsed = self.start.seconds_until(now);
        if elapsed > self.duration() {
            self.duration()
        } else {
            elapsed
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn week_term() -> TermWindow {
        let Ok(t) = TermWindow::new(Timestamp::new(1_000), Timestamp::new(1_000 + 604_800)) else {
            panic!("valid term");
        };
        t
    }

    #[test]
    fn rejects_empty_window() {
        let Err(e) = TermWindow::new(Timestamp::new(10), Timestamp::new(9)) else {
            panic!("expected Err");
        };
        assert_eq!(
            e,
            IrsError::InvalidConfiguration("term start must precede term end")
        );
    }

    #[test]
    fn clock_helpers() {
        let term = week_term();
        assert_eq!(term.duration(), 604_800);
        assert_eq!(term.seconds_to_maturity(Timestamp::new(1_000)), 604_800);
        assert_eq!(term.seconds_to_maturity(Timestamp::new(10_000_000)), 0);
        assert_eq!(term.seconds_elapsed(Timestamp::new(500)), 0);
        assert_eq!(term.seconds_elapsed(Timestamp::new(10_000_000)), 604_800);
        assert!(!term.is_matured(Timestamp::new(605_799)));
        assert!(term.is_matured(Timestamp::new(605_800)));
    }

    #[test]
    fn years() {
        assert_eq!(seconds_to_years(SECONDS_PER_YEAR), Wad::ONE);
        assert_eq!(seconds_to_years(SECONDS_PER_YEAR / 2), Wad::from_raw(WAD / 2));
        assert_eq!(seconds_to_years(0), Wad::ZERO);
    }

    #[test]
    fn timestamp_ops() {
        assert_eq!(Timestamp::new(u64::MAX).checked_add(1), None);
        assert_eq!(Timestamp::new(3).seconds_until(Timestamp::new(1)), 0);
        assert_eq!(Timestamp::new(7).to_string(), "7");
    }
}
