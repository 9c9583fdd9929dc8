//! Configuration for the margin/position ledger.

use crate::error::IrsError;

/// Immutable parameters of a [`MarginEngine`](crate::margin_engine::MarginEngine).
///
/// - `apy_lookback_seconds`: window over which the oracle's observed APY
///   is measured for the margin calculator.  Must be positive.
/// - `parameter_grace_period`: seconds after a calculator parameter update
///   during which liquidations keep using the version a position was
///   pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarginEngineConfig {
    apy_lookback_seconds: u64,
    parameter_grace_period: u64,
}

impl MarginEngineConfig {
    /// Creates a new `MarginEngineConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::InvalidConfiguration`] if the lookback is zero.
    pub fn new(apy_lookback_seconds: u64, parameter_grace_period: u64) -> Result<Self, IrsError> {
        let config = Self {
            apy_lookback_seconds,
            parameter_grace_period,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates all configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::InvalidConfiguration`] if the lookback is zero.
    pub fn validate(&self) -> Result<(), IrsError> {
        if self.apy_lookback_seconds == 0 {
            return Err(IrsError::InvalidConfiguration(
                "apy lookback window must be positive",
            ));
        }
        Ok(())
    }

    /// Returns the APY lookback window in seconds.
    #[must_use]
    pub const fn apy_lookback_seconds(&self) -> u64 {
        self.apy_lookback_seconds
    }

    /// Returns the parameter grace period in seconds.
    #[must_use]
    pub const fn parameter_grace_period(&self) -> u64 {
        self.parameter_grace_period
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn valid() {
        let Ok(cfg) = MarginEngineConfig::new(86_400, 3_600) else {
            panic!("expected Ok");
        };
        assert_eq!(cfg.apy_lookback_seconds(), 86_400);
        assert_eq!(cfg.parameter_grace_period(), 3_600);
    }

    #[test]
    fn zero_lookback_rejected() {
        assert_eq!(
            MarginEngineConfig::new(0, 0),
            Err(IrsError::InvalidConfiguration(
                "apy lookback window must be positive"
            ))
        );
    }
}
