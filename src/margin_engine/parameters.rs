//! Versioned calculator parameters.
//!
//! Every owner update appends a version effective from the update time.
//! Voluntary position changes always use (and pin) the newest version.
//! Liquidations use the newest version whose grace period has passed, and
//! never anything older than the version a position is pinned to.

use std::collections::BTreeMap;

use crate::config::MarginCalculatorParameters;
use crate::domain::Timestamp;
use crate::error::{IrsError, Result};

/// One entry of the parameter history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterVersion {
    pub parameters: MarginCalculatorParameters,
    pub effective_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParameterHistory {
    versions: BTreeMap<u32, ParameterVersion>,
}

impl ParameterHistory {
    pub(crate) fn new(parameters: MarginCalculatorParameters) -> Result<Self> {
        parameters.validate()?;
        let mut versions = BTreeMap::new();
        versions.insert(
            0,
            ParameterVersion {
                parameters,
                effective_at: Timestamp::new(0),
            },
        );
        Ok(Self { versions })
    }

    pub(crate) fn latest_version(&self) -> u32 {
        self.versions.keys().next_back().copied().unwrap_or_default()
    }

    pub(crate) fn get(&self, version: u32) -> Option<&ParameterVersion> {
        self.versions.get(&version)
    }

    fn latest(&self) -> Result<&ParameterVersion> {
        self.versions
            .values()
            .next_back()
            .ok_or(IrsError::InvariantViolation("parameter history is empty"))
    }

    /// Appends a validated version and returns its number.
    pub(crate) fn push(
        &mut self,
        parameters: MarginCalculatorParameters,
        effective_at: Timestamp,
    ) -> Result<u32> {
        parameters.validate()?;
        if effective_at < self.latest()?.effective_at {
            return Err(IrsError::InvalidConfiguration(
                "parameter versions must be added in time order",
            ));
        }
        let version = self
            .latest_version()
            .checked_add(1)
            .ok_or(IrsError::Overflow("parameter version"))?;
        self.versions.insert(
            version,
            ParameterVersion {
                parameters,
                effective_at,
            },
        );
        Ok(version)
    }

    /// Newest parameters.
    pub(crate) fn current(&self) -> Result<&MarginCalculatorParameters> {
        self.latest().map(|v| &v.parameters)
    }

    /// Parameters a liquidation of a position pinned to `pinned` uses.
    ///
    /// This is the newest version published after `pinned` whose grace
    /// period has fully elapsed at `now`, or the pinned version itself if
    /// none has.
    pub(crate) fn for_liquidation(
        &self,
        pinned: u32,
        now: Timestamp,
        grace_period: u64,
    ) -> Result<&MarginCalculatorParameters> {
        for (_, version) in self.versions.range(pinned.saturating_add(1)..).rev() {
            let grace_ends = version
                .effective_at
                .checked_add(grace_period)
                .ok_or(IrsError::Overflow("grace period end"))?;
            if grace_ends <= now {
                return Ok(&version.parameters);
            }
        }
        self.versions
            .get(&pinned)
            .map(|v| &v.parameters)
            .ok_or(IrsError::InvariantViolation("pinned parameter version missing"))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Wad;

    fn with_floor(floor: i64) -> MarginCalculatorParameters {
        MarginCalculatorParameters {
            min_margin_to_incentivise_liquidators: Wad::from_integer(floor),
            ..MarginCalculatorParameters::default()
        }
    }

    fn history() -> ParameterHistory {
        let Ok(mut h) = ParameterHistory::new(with_floor(2)) else {
            panic!("expected Ok");
        };
        let Ok(v) = h.push(with_floor(5), Timestamp::new(100)) else {
            panic!("expected Ok");
        };
        assert_eq!(v, 1);
        h
    }

    #[test]
    fn liquidation_uses_pinned_version_during_grace() {
        let h = history();
        let Ok(p) = h.for_liquidation(0, Timestamp::new(149), 50) else {
            panic!("expected Ok");
        };
        assert_eq!(p.min_margin_to_incentivise_liquidators, Wad::from_integer(2));

        let Ok(p) = h.for_liquidation(0, Timestamp::new(150), 50) else {
            panic!("expected Ok");
        };
        assert_eq!(p.min_margin_to_incentivise_liquidators, Wad::from_integer(5));
    }

    #[test]
    fn newer_version_waits_for_its_own_grace() {
        let mut h = history();
        let Ok(2) = h.push(with_floor(50), Timestamp::new(1_000)) else {
            panic!("expected Ok");
        };
        let floor_at = |now: u64| {
            let Ok(p) = h.for_liquidation(0, Timestamp::new(now), 3_600) else {
                panic!("expected Ok");
            };
            p.min_margin_to_incentivise_liquidators
        };
        assert_eq!(floor_at(3_699), Wad::from_integer(2));
        // v1 is past its grace, v2 has only been live for 2700s.
        assert_eq!(floor_at(3_700), Wad::from_integer(5));
        assert_eq!(floor_at(4_599), Wad::from_integer(5));
        assert_eq!(floor_at(4_600), Wad::from_integer(50));
    }

    #[test]
    fn latest_pin_uses_current() {
        let h = history();
        let Ok(p) = h.for_liquidation(1, Timestamp::new(100), 1_000) else {
            panic!("expected Ok");
        };
        assert_eq!(p.min_margin_to_incentivise_liquidators, Wad::from_integer(5));
        assert_eq!(h.latest_version(), 1);
    }

    #[test]
    fn invalid_or_out_of_order_versions_rejected() {
        let mut h = history();
        let bad = MarginCalculatorParameters {
            t_max: 0,
            ..MarginCalculatorParameters::default()
        };
        assert!(h.push(bad, Timestamp::new(200)).is_err());
        assert!(h.push(with_floor(3), Timestamp::new(50)).is_err());
        assert_eq!(h.latest_version(), 1);
    }
}
