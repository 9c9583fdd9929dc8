//! Configuration for the virtual AMM half of an instance.

use crate::domain::{TermWindow, Wad, MAX_TICK};
use crate::error::IrsError;

/// Immutable parameters of a [`Vamm`](crate::vamm::Vamm).
///
/// # Validation
///
/// - `tick_spacing` must be in `1..=MAX_TICK`.
/// - `fee_rate` must lie in `[0, 1]` (annualised fraction of notional).
/// - `protocol_fee_denominator` of zero disables the protocol cut; any
///   other value diverts `fee / denominator` of each step's LP fee.
/// - The term window is validated at [`TermWindow`] construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VammConfig {
    tick_spacing: u32,
    fee_rate: Wad,
    protocol_fee_denominator: u32,
    term: TermWindow,
}

impl VammConfig {
    /// Creates a new `VammConfig`.
    ///
    /// # Errors
    ///
    /// - [`IrsError::InvalidConfiguration`] if `tick_spacing` is zero or
    ///   wider than the tick domain.
    /// - [`IrsError::InvalidConfiguration`] if `fee_rate` is outside `[0, 1]`.
    pub fn new(
        tick_spacing: u32,
        fee_rate: Wad,
        protocol_fee_denominator: u32,
        term: TermWindow,
    ) -> Result<Self, IrsError> {
        let config = Self {
            tick_spacing,
            fee_rate,
            protocol_fee_denominator,
            term,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates all configuration invariants.
    ///
    /// # Errors
    ///
    /// See [`VammConfig::new`].
    pub fn validate(&self) -> Result<(), IrsError> {
        if self.tick_spacing == 0 {
            return Err(IrsError::InvalidConfiguration(
                "tick spacing must be greater than zero",
            ));
        }
        if self.tick_spacing > MAX_TICK.unsigned_abs() {
            return Err(IrsError::InvalidConfiguration(
                "tick spacing exceeds tick domain",
            ));
        }
        if self.fee_rate.is_negative() || self.fee_rate > Wad::ONE {
            return Err(IrsError::InvalidConfiguration(
                "fee rate must lie in [0, 1]",
            ));
        }
        Ok(())
    }

    /// Returns the tick spacing.
    #[must_use]
    pub const fn tick_spacing(&self) -> u32 {
        self.tick_spacing
    }

    /// Tick spacing as a signed tick delta.  Validation caps it at
    /// `MAX_TICK`, so the conversion is lossless.
    #[must_use]
    pub const fn spacing(&self) -> i32 {
        self.tick_spacing as i32
    }

    /// Returns the annualised fee rate.
    #[must_use]
    pub const fn fee_rate(&self) -> Wad {
        self.fee_rate
    }

    /// Returns the protocol fee denominator (zero when disabled).
    #[must_use]
    pub const fn protocol_fee_denominator(&self) -> u32 {
        self.protocol_fee_denominator
    }

    /// Returns the maturity window.
    #[must_use]
    pub const fn term(&self) -> TermWindow {
        self.term
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;

    fn term() -> TermWindow {
        let Ok(t) = TermWindow::new(Timestamp::new(0), Timestamp::new(1_000)) else {
            panic!("valid term");
        };
        t
    }

    fn fee() -> Wad {
        Wad::from_raw(3_000_000_000_000_000)
    }

    #[test]
    fn valid_config() {
        let Ok(cfg) = VammConfig::new(60, fee(), 10, term()) else {
            panic!("expected Ok");
        };
        assert_eq!(cfg.tick_spacing(), 60);
        assert_eq!(cfg.spacing(), 60);
        assert_eq!(cfg.fee_rate(), fee());
        assert_eq!(cfg.protocol_fee_denominator(), 10);
        assert_eq!(cfg.term(), term());
    }

    #[test]
    fn zero_spacing_rejected() {
        let Err(IrsError::InvalidConfiguration(msg)) = VammConfig::new(0, fee(), 0, term()) else {
            panic!("expected InvalidConfiguration");
        };
        assert!(msg.contains("spacing"));
    }

    #[test]
    fn oversized_spacing_rejected() {
        assert!(VammConfig::new(70_000, fee(), 0, term()).is_err());
        assert!(VammConfig::new(69_100, fee(), 0, term()).is_ok());
    }

    #[test]
    fn fee_bounds() {
        assert!(VammConfig::new(1, Wad::from_integer(-1), 0, term()).is_err());
        assert!(VammConfig::new(1, Wad::from_integer(2), 0, term()).is_err());
        assert!(VammConfig::new(1, Wad::ONE, 0, term()).is_ok());
        assert!(VammConfig::new(1, Wad::ZERO, 0, term()).is_ok());
    }
}
