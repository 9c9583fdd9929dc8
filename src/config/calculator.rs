//! Parameters of the margin calculator.

use crate::domain::{Wad, SECONDS_PER_YEAR};
use crate::error::IrsError;

const fn wad(raw: i128) -> Wad {
    Wad::from_raw(raw)
}

/// Risk parameters consumed by
/// [`required_margin`](crate::calculator::required_margin).
///
/// Units:
///
/// - multipliers, `alpha`, `beta`, `xi_*`, `dev_mul_*` and `gamma` are
///   dimensionless fractions;
/// - `min_delta_*` and `sigma_squared` are expressed on the APY as a
///   fraction (`0.01` is one percentage point);
/// - `fixed_rate_deviation_min_*` are in percent, the unit of the fixed
///   rate quoted by the curve;
/// - `min_margin_to_incentivise_liquidators` is in settlement-token units.
///
/// The record is plain data.  [`validate`](Self::validate) enforces the
/// orderings that make the Initial requirement at least the Liquidation
/// requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarginCalculatorParameters {
    pub apy_upper_multiplier: Wad,
    pub apy_lower_multiplier: Wad,
    pub min_delta_lm: Wad,
    pub min_delta_im: Wad,
    pub sigma_squared: Wad,
    pub alpha: Wad,
    pub beta: Wad,
    pub xi_upper: Wad,
    pub xi_lower: Wad,
    /// Horizon in seconds beyond which time to maturity stops adding risk.
    pub t_max: u64,
    pub dev_mul_left_unwind_lm: Wad,
    pub dev_mul_right_unwind_lm: Wad,
    pub dev_mul_left_unwind_im: Wad,
    pub dev_mul_right_unwind_im: Wad,
    pub fixed_rate_deviation_min_left_unwind_lm: Wad,
    pub fixed_rate_deviation_min_right_unwind_lm: Wad,
    pub fixed_rate_deviation_min_left_unwind_im: Wad,
    pub fixed_rate_deviation_min_right_unwind_im: Wad,
    /// Share of a liquidated position's margin paid to the liquidator.
    pub gamma: Wad,
    pub min_margin_to_incentivise_liquidators: Wad,
}

impl Default for MarginCalculatorParameters {
    fn default() -> Self {
        Self {
            apy_upper_multiplier: wad(1_500_000_000_000_000_000),
            apy_lower_multiplier: wad(700_000_000_000_000_000),
            min_delta_lm: wad(12_500_000_000_000_000),
            min_delta_im: wad(50_000_000_000_000_000),
            sigma_squared: wad(150_000_000_000_000_000),
            alpha: wad(40_000_000_000_000_000),
            beta: Wad::ONE,
            xi_upper: Wad::from_integer(2),
            xi_lower: wad(1_500_000_000_000_000_000),
            t_max: SECONDS_PER_YEAR,
            dev_mul_left_unwind_lm: wad(500_000_000_000_000_000),
            dev_mul_right_unwind_lm: wad(500_000_000_000_000_000),
            dev_mul_left_unwind_im: wad(700_000_000_000_000_000),
            dev_mul_right_unwind_im: wad(700_000_000_000_000_000),
            fixed_rate_deviation_min_left_unwind_lm: wad(100_000_000_000_000_000),
            fixed_rate_deviation_min_right_unwind_lm: wad(100_000_000_000_000_000),
            fixed_rate_deviation_min_left_unwind_im: wad(300_000_000_000_000_000),
            fixed_rate_deviation_min_right_unwind_im: wad(300_000_000_000_000_000),
            gamma: wad(50_000_000_000_000_000),
            min_margin_to_incentivise_liquidators: Wad::from_integer(2),
        }
    }
}

impl MarginCalculatorParameters {
    /// Validates the parameter set.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::InvalidConfiguration`] naming the first violated
    /// constraint.
    pub fn validate(&self) -> Result<(), IrsError> {
        if self.t_max == 0 {
            return Err(IrsError::InvalidConfiguration("t_max must be positive"));
        }
        if self.apy_upper_multiplier < Wad::ONE {
            return Err(IrsError::InvalidConfiguration(
                "apy upper multiplier must be at least one",
            ));
        }
        if self.apy_lower_multiplier.is_negative() || self.apy_lower_multiplier > Wad::ONE {
            return Err(IrsError::InvalidConfiguration(
                "apy lower multiplier must lie in [0, 1]",
            ));
        }
        if self.gamma.is_negative() || self.gamma > Wad::ONE {
            return Err(IrsError::InvalidConfiguration("gamma must lie in [0, 1]"));
        }

        let non_negative = [
            self.min_delta_lm,
            self.min_delta_im,
            self.sigma_squared,
            self.alpha,
            self.beta,
            self.xi_upper,
            self.xi_lower,
            self.dev_mul_left_unwind_lm,
            self.dev_mul_right_unwind_lm,
            self.dev_mul_left_unwind_im,
            self.dev_mul_right_unwind_im,
            self.fixed_rate_deviation_min_left_unwind_lm,
            self.fixed_rate_deviation_min_right_unwind_lm,
            self.fixed_rate_deviation_min_left_unwind_im,
            self.fixed_rate_deviation_min_right_unwind_im,
            self.min_margin_to_incentivise_liquidators,
        ];
        if non_negative.iter().any(Wad::is_negative) {
            return Err(IrsError::InvalidConfiguration(
                "calculator parameters must be non-negative",
            ));
        }

        let initial_over_liquidation = [
            (self.min_delta_im, self.min_delta_lm),
            (self.dev_mul_left_unwind_im, self.dev_mul_left_unwind_lm),
            (self.dev_mul_right_unwind_im, self.dev_mul_right_unwind_lm),
            (
                self.fixed_rate_deviation_min_left_unwind_im,
                self.fixed_rate_deviation_min_left_unwind_lm,
            ),
            (
                self.fixed_rate_deviation_min_right_unwind_im,
                self.fixed_rate_deviation_min_right_unwind_lm,
            ),
        ];
        if initial_over_liquidation.iter().any(|(im, lm)| im < lm) {
            return Err(IrsError::InvalidConfiguration(
                "initial margin parameters must not be looser than liquidation parameters",
            ));
        }
        Ok(())
    }
}
