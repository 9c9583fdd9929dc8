//! Ring-buffer rate oracle.
//!
//! Observations are `(timestamp, rate_index)` pairs, where the rate index
//! is the cumulative growth factor of the underlying yield source (it
//! starts around `1.0` and only grows).  The realised variable rate over
//! `[t0, t1]` is `index(t1) / index(t0) - 1`.
//!
//! Storage is a fixed ring of `cardinality` slots that overwrites its
//! oldest entry once full.  [`RingBufferRateOracle::grow`] reserves more
//! slots; the ring starts using them the next time the write cursor wraps
//! to the end of the active region, so no history is lost when growing.

use crate::domain::{Rounding, Timestamp, Wad, SECONDS_PER_YEAR};
use crate::error::{IrsError, Result};
use crate::math::{mul_div_signed, CheckedArithmetic};
use crate::traits::RateOracle;

/// One recorded value of the cumulative rate index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    /// When the index was observed.
    pub timestamp: Timestamp,
    /// Cumulative rate index at `timestamp`.
    pub rate_index: Wad,
}

/// Rate oracle backed by a ring buffer of observations.
///
/// # Examples
///
/// ```
/// use irs_amm::domain::{Timestamp, Wad};
/// use irs_amm::oracle::RingBufferRateOracle;
/// use irs_amm::traits::RateOracle;
///
/// let mut oracle = RingBufferRateOracle::new(Timestamp::new(0), Wad::ONE).expect("valid");
/// oracle.grow(8);
/// oracle
///     .write(Timestamp::new(100), Wad::from_raw(1_010_000_000_000_000_000))
///     .expect("monotonic");
///
/// let rate = oracle
///     .variable_rate_between(Timestamp::new(0), Timestamp::new(100))
///     .expect("covered");
/// assert_eq!(rate, Wad::from_raw(10_000_000_000_000_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RingBufferRateOracle {
    slots: Vec<Option<Observation>>,
    index: usize,
    cardinality: usize,
    cardinality_next: usize,
}

impl RingBufferRateOracle {
    /// Creates an oracle holding a single observation.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::InvalidConfiguration`] if `rate_index` is not
    /// positive.
    pub fn new(timestamp: Timestamp, rate_index: Wad) -> Result<Self> {
        if !rate_index.is_positive() {
            return Err(IrsError::InvalidConfiguration(
                "rate index must be positive",
            ));
        }
        Ok(Self {
            slots: vec![Some(Observation {
                timestamp,
                rate_index,
            })],
            index: 0,
            cardinality: 1,
            cardinality_next: 1,
        })
    }

    /// Number of slots currently in use by the ring.
    #[must_use]
    pub const fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Number of slots the ring will grow to on its next wrap.
    #[must_use]
    pub const fn cardinality_next(&self) -> usize {
        self.cardinality_next
    }

    /// Reserves slots so the ring can hold `cardinality_next`
    /// observations.  Shrinking is a no-op.
    pub fn grow(&mut self, cardinality_next: usize) {
        if cardinality_next <= self.cardinality_next {
            return;
        }
        self.slots.resize(cardinality_next, None);
        self.cardinality_next = cardinality_next;
    }

    /// Most recent observation.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::OracleUnavailable`] if the ring is corrupt.
    pub fn latest(&self) -> Result<Observation> {
        self.slots
            .get(self.index)
            .copied()
            .flatten()
            .ok_or(IrsError::OracleUnavailable("no observations recorded"))
    }

    /// Records a new observation.
    ///
    /// # Errors
    ///
    /// - [`IrsError::InvalidConfiguration`] if `timestamp` is not strictly
    ///   after the latest observation.
    /// - [`IrsError::InvalidConfiguration`] if `rate_index` is below the
    ///   latest index.
    pub fn write(&mut self, timestamp: Timestamp, rate_index: Wad) -> Result<()> {
        let last = self.latest()?;
        if timestamp <= last.timestamp {
            return Err(IrsError::InvalidConfiguration(
                "observations must have strictly increasing timestamps",
            ));
        }
        if rate_index < last.rate_index {
            return Err(IrsError::InvalidConfiguration(
                "rate index must not decrease",
            ));
        }

        if self.cardinality_next > self.cardinality && self.index + 1 == self.cardinality {
            self.cardinality = self.cardinality_next;
        }
        let next = (self.index + 1) % self.cardinality;
        let slot = self
            .slots
            .get_mut(next)
            .ok_or(IrsError::InvariantViolation("oracle slot out of range"))?;
        *slot = Some(Observation {
            timestamp,
            rate_index,
        });
        self.index = next;
        Ok(())
    }

    /// Observations in chronological order.
    fn chronological(&self) -> Vec<Observation> {
        let active = self.slots.iter().take(self.cardinality);
        let mut observations: Vec<Observation> = active.filter_map(|slot| *slot).collect();
        observations.sort_by_key(|o| o.timestamp);
        observations
    }

    /// Rate index at `at`, linearly interpolated between the surrounding
    /// observations.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::OracleUnavailable`] if `at` is before the oldest
    /// or after the newest retained observation.
    pub fn rate_index_at(&self, at: Timestamp) -> Result<Wad> {
        let observations = self.chronological();
        let position = observations.partition_point(|o| o.timestamp < at);

        let after = observations
            .get(position)
            .ok_or(IrsError::OracleUnavailable("timestamp after newest observation"))?;
        if after.timestamp == at {
            return Ok(after.rate_index);
        }
        let before = position
            .checked_sub(1)
            .and_then(|i| observations.get(i))
            .ok_or(IrsError::OracleUnavailable("timestamp before oldest observation"))?;

        let span = before.timestamp.seconds_until(after.timestamp);
        let elapsed = before.timestamp.seconds_until(at);
        let growth = after.rate_index.safe_sub(&before.rate_index)?;
        let interpolated = mul_div_signed(
            growth.raw(),
            u128::from(elapsed),
            u128::from(span),
            Rounding::Down,
        )?;
        before.rate_index.safe_add(&Wad::from_raw(interpolated))
    }
}

impl RateOracle for RingBufferRateOracle {
    fn variable_rate_between(&self, from: Timestamp, to: Timestamp) -> Result<Wad> {
        if from > to {
            return Err(IrsError::InvalidConfiguration(
                "rate window start is after its end",
            ));
        }
        if from == to {
            return Ok(Wad::ZERO);
        }
        let start = self.rate_index_at(from)?;
        let end = self.rate_index_at(to)?;
        end.safe_div(&start, Rounding::Down)?.safe_sub(&Wad::ONE)
    }

    fn current_observed_apy(&self, now: Timestamp, lookback_seconds: u64) -> Result<Wad> {
        if lookback_seconds == 0 {
            return Err(IrsError::InvalidConfiguration(
                "apy lookback window must be positive",
            ));
        }
        let from = now
            .get()
            .checked_sub(lookback_seconds)
            .map(Timestamp::new)
            .ok_or(IrsError::OracleUnavailable("lookback reaches before time zero"))?;
        let rate = self.variable_rate_between(from, now)?;
        let apy = mul_div_signed(
            rate.raw(),
            u128::from(SECONDS_PER_YEAR),
            u128::from(lookback_seconds),
            Rounding::Down,
        )?;
        Ok(Wad::from_raw(apy))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn index(raw_percent_bps: i128) -> Wad {
        // 1.0 + bps / 10_000
        Wad::from_raw(1_000_000_000_000_000_000 + raw_percent_bps * 100_000_000_000_000)
    }

    fn oracle_with(points: &[(u64, i128)], slots: usize) -> RingBufferRateOracle {
        let Some(((t0, i0), rest)) = points.split_first() else {
            panic!("need at least one point");
        };
        let Ok(mut oracle) = RingBufferRateOracle::new(Timestamp::new(*t0), index(*i0)) else {
            panic!("expected Ok");
        };
        oracle.grow(slots);
        for (t, i) in rest {
            let Ok(()) = oracle.write(Timestamp::new(*t), index(*i)) else {
                panic!("expected Ok");
            };
        }
        oracle
    }

    #[test]
    fn rejects_non_increasing_timestamps() {
        let mut oracle = oracle_with(&[(10, 0)], 4);
        assert!(matches!(
            oracle.write(Timestamp::new(10), index(1)),
            Err(IrsError::InvalidConfiguration(_))
        ));
        assert!(oracle.write(Timestamp::new(11), index(-1)).is_err());
    }

    #[test]
    fn exact_and_interpolated_lookups() {
        let oracle = oracle_with(&[(0, 0), (100, 100)], 4);
        assert_eq!(oracle.rate_index_at(Timestamp::new(100)), Ok(index(100)));
        assert_eq!(oracle.rate_index_at(Timestamp::new(50)), Ok(index(50)));
        assert!(matches!(
            oracle.rate_index_at(Timestamp::new(101)),
            Err(IrsError::OracleUnavailable(_))
        ));
    }

    #[test]
    fn ring_overwrites_oldest() {
        let oracle = oracle_with(&[(0, 0), (10, 1), (20, 2)], 2);
        assert_eq!(oracle.cardinality(), 2);
        assert!(matches!(
            oracle.rate_index_at(Timestamp::new(0)),
            Err(IrsError::OracleUnavailable(_))
        ));
        assert_eq!(oracle.rate_index_at(Timestamp::new(10)), Ok(index(1)));
    }

    #[test]
    fn growing_keeps_history() {
        let mut oracle = oracle_with(&[(0, 0), (10, 1)], 2);
        oracle.grow(4);
        for (t, i) in [(20, 2), (30, 3)] {
            let Ok(()) = oracle.write(Timestamp::new(t), index(i)) else {
                panic!("expected Ok");
            };
        }
        assert_eq!(oracle.cardinality(), 4);
        assert_eq!(oracle.rate_index_at(Timestamp::new(0)), Ok(index(0)));
        assert_eq!(oracle.rate_index_at(Timestamp::new(30)), Ok(index(3)));
    }

    #[test]
    fn variable_rate_and_apy() {
        let year = SECONDS_PER_YEAR;
        let oracle = oracle_with(&[(0, 0), (year, 200)], 4);
        let Ok(rate) = oracle.variable_rate_between(Timestamp::new(0), Timestamp::new(year)) else {
            panic!("expected Ok");
        };
        assert_eq!(rate, Wad::from_raw(20_000_000_000_000_000));
        assert_eq!(
            oracle.variable_rate_between(Timestamp::new(5), Timestamp::new(5)),
            Ok(Wad::ZERO)
        );

        let Ok(apy) = oracle.current_observed_apy(Timestamp::new(year), year / 2) else {
            panic!("expected Ok");
        };
        // Linear index growth: the second half grows 1.01 -> 1.02.
        let expected = Wad::from_raw(19_801_980_198_019_800);
        assert!(apy.raw().abs_diff(expected.raw()) < 100, "apy {apy}");
    }

    #[test]
    fn insufficient_history_is_an_error() {
        let oracle = oracle_with(&[(100, 0), (200, 10)], 4);
        assert!(matches!(
            oracle.current_observed_apy(Timestamp::new(200), 150),
            Err(IrsError::OracleUnavailable(_))
        ));
        assert!(oracle
            .variable_rate_between(Timestamp::new(200), Timestamp::new(100))
            .is_err());
    }
}
