//! Position ledger of an instance.
//!
//! The margin engine owns every position and the versioned calculator
//! parameters.  It knows nothing about the curve: growth values, swap
//! outcomes and rate statistics are handed in by the
//! [`IrsInstance`](crate::instance::IrsInstance), which sequences the
//! VAMM and the ledger inside one all-or-nothing call.

mod parameters;
mod position;

pub use parameters::ParameterVersion;
pub use position::{Position, PositionKey};

use std::collections::BTreeMap;

use crate::calculator::{required_margin, MarginMode, MarketSnapshot, RateStatistics};
use crate::config::{MarginCalculatorParameters, MarginEngineConfig};
use crate::domain::{Rounding, SwapOutcome, Timestamp, Wad};
use crate::error::{IrsError, Result};
use crate::math::CheckedArithmetic;
use crate::vamm::{Growth, GrowthCredit};
use parameters::ParameterHistory;

/// The ledger of positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarginEngine {
    config: MarginEngineConfig,
    positions: BTreeMap<PositionKey, Position>,
    parameters: ParameterHistory,
}

impl MarginEngine {
    /// Creates an empty ledger with `parameters` as version 0.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::InvalidConfiguration`] if either input fails
    /// validation.
    pub fn new(config: MarginEngineConfig, parameters: MarginCalculatorParameters) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            positions: BTreeMap::new(),
            parameters: ParameterHistory::new(parameters)?,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &MarginEngineConfig {
        &self.config
    }

    #[must_use]
    pub fn position(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(key)
    }

    /// All open positions, ordered by key.
    pub fn positions(&self) -> impl Iterator<Item = (&PositionKey, &Position)> {
        self.positions.iter()
    }

    /// Number of the newest parameter version.
    #[must_use]
    pub fn latest_parameters_version(&self) -> u32 {
        self.parameters.latest_version()
    }

    #[must_use]
    pub fn parameters_version(&self, version: u32) -> Option<&ParameterVersion> {
        self.parameters.get(version)
    }

    /// Appends a parameter version effective at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::InvalidConfiguration`] if `parameters` fail
    /// validation or `now` precedes the newest version.
    pub(crate) fn push_parameters(
        &mut self,
        parameters: MarginCalculatorParameters,
        now: Timestamp,
    ) -> Result<u32> {
        self.parameters.push(parameters, now)
    }

    /// Requirement of the position at `key` under `mode`.
    ///
    /// Initial requirements always use the newest parameters; liquidation
    /// requirements honour the grace period of the position's pinned
    /// version.
    ///
    /// # Errors
    ///
    /// - [`IrsError::PositionNotFound`] if no position exists at `key`.
    /// - Calculator errors.
    pub fn margin_requirement(
        &self,
        key: &PositionKey,
        mode: MarginMode,
        rates: &RateStatistics,
        market: &MarketSnapshot,
    ) -> Result<Wad> {
        let position = self.positions.get(key).ok_or(IrsError::PositionNotFound)?;
        let parameters = match mode {
            MarginMode::Initial => self.parameters.current()?,
            MarginMode::Liquidation => self.parameters.for_liquidation(
                position.parameters_version,
                market.now,
                self.config.parameter_grace_period(),
            )?,
        };
        required_margin(&position.snapshot(key.range), parameters, rates, market, mode)
    }

    /// Share of a liquidated margin paid to the liquidator, under the
    /// parameters the liquidation uses.
    pub(crate) fn liquidator_reward(&self, key: &PositionKey, now: Timestamp) -> Result<Wad> {
        let position = self.positions.get(key).ok_or(IrsError::PositionNotFound)?;
        let parameters = self.parameters.for_liquidation(
            position.parameters_version,
            now,
            self.config.parameter_grace_period(),
        )?;
        position
            .margin
            .clamp_non_negative()
            .safe_mul(&parameters.gamma, Rounding::Down)
    }

    pub(crate) fn get_or_create(&mut self, key: PositionKey) -> &mut Position {
        let version = self.parameters.latest_version();
        self.positions.entry(key).or_insert_with(|| Position {
            parameters_version: version,
            ..Position::default()
        })
    }

    fn get_mut(&mut self, key: &PositionKey) -> Result<&mut Position> {
        self.positions.get_mut(key).ok_or(IrsError::PositionNotFound)
    }

    /// Re-pins a position to the newest parameter version.
    pub(crate) fn pin_latest(&mut self, key: &PositionKey) -> Result<()> {
        let version = self.parameters.latest_version();
        self.get_mut(key)?.parameters_version = version;
        Ok(())
    }

    /// Credits growth accrued inside the range since the last snapshot and
    /// advances the snapshot to `inside`.
    ///
    /// Calling it twice with the same `inside` credits nothing the second
    /// time.
    pub(crate) fn update_token_balances(
        &mut self,
        key: &PositionKey,
        inside: Growth,
    ) -> Result<GrowthCredit> {
        let position = self.get_mut(key)?;
        let delta = inside.checked_sub(&position.growth_inside_last)?;
        let credit = GrowthCredit::for_liquidity(&delta, position.liquidity)?;
        position.fixed_token_balance = position.fixed_token_balance.safe_add(&credit.fixed_token)?;
        position.variable_token_balance =
            position.variable_token_balance.safe_add(&credit.variable_token)?;
        position.margin = position.margin.safe_add(&credit.fee)?;
        position.accumulated_fees = position.accumulated_fees.safe_add(&credit.fee)?;
        position.growth_inside_last = inside;
        Ok(credit)
    }

    /// Moves the growth snapshot without crediting anything.
    pub(crate) fn reset_snapshot(&mut self, key: &PositionKey, inside: Growth) -> Result<()> {
        self.get_mut(key)?.growth_inside_last = inside;
        Ok(())
    }

    /// Adds a signed amount to a position's margin.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::MarginDeltaExceedsBalance`] if a withdrawal
    /// exceeds the current margin.
    pub(crate) fn apply_margin_delta(&mut self, key: &PositionKey, delta: Wad) -> Result<Wad> {
        let position = self.get_mut(key)?;
        if delta.is_negative() {
            let requested = delta
                .checked_neg()
                .ok_or(IrsError::Overflow("margin delta"))?;
            if requested > position.margin {
                return Err(IrsError::MarginDeltaExceedsBalance {
                    requested,
                    available: position.margin,
                });
            }
        }
        position.margin = position.margin.safe_add(&delta)?;
        Ok(position.margin)
    }

    /// Adds a signed liquidity delta to a position.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::LiquidityUnderflow`] when removing more than the
    /// position holds.
    pub(crate) fn apply_liquidity_delta(&mut self, key: &PositionKey, delta: i128) -> Result<()> {
        let position = self.get_mut(key)?;
        position.liquidity = if delta < 0 {
            let requested = delta.unsigned_abs();
            position
                .liquidity
                .checked_sub(requested)
                .ok_or(IrsError::LiquidityUnderflow {
                    requested,
                    available: position.liquidity,
                })?
        } else {
            position
                .liquidity
                .checked_add(delta.unsigned_abs())
                .ok_or(IrsError::Overflow("position liquidity"))?
        };
        Ok(())
    }

    /// Books a swap's deltas and charges its fee to margin.
    pub(crate) fn apply_swap(&mut self, key: &PositionKey, outcome: &SwapOutcome) -> Result<()> {
        let position = self.get_mut(key)?;
        position.fixed_token_balance = position
            .fixed_token_balance
            .safe_add(&outcome.fixed_token_delta())?;
        position.variable_token_balance = position
            .variable_token_balance
            .safe_add(&outcome.variable_token_delta())?;
        position.margin = position.margin.safe_sub(&outcome.fee())?;
        Ok(())
    }

    /// Converts the balances into `cashflow`, credited to margin.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::PositionAlreadySettled`] on a second settlement.
    pub(crate) fn settle(&mut self, key: &PositionKey, cashflow: Wad) -> Result<()> {
        let position = self.get_mut(key)?;
        if position.is_settled {
            return Err(IrsError::PositionAlreadySettled);
        }
        position.margin = position.margin.safe_add(&cashflow)?;
        position.fixed_token_balance = Wad::ZERO;
        position.variable_token_balance = Wad::ZERO;
        position.is_settled = true;
        Ok(())
    }

    /// Drops the position if nothing is left in it.
    pub(crate) fn purge_if_empty(&mut self, key: &PositionKey) -> bool {
        let empty = self.positions.get(key).is_some_and(Position::is_empty);
        if empty {
            self.positions.remove(key);
        }
        empty
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Address, TickRange};
    use crate::vamm::GROWTH_ONE;

    fn key() -> PositionKey {
        let Ok(range) = TickRange::new(-60, 60, 60) else {
            panic!("valid range");
        };
        PositionKey::new(Address::repeat(1), range)
    }

    fn engine() -> MarginEngine {
        let Ok(config) = MarginEngineConfig::new(3_600, 0) else {
            panic!("valid config");
        };
        let Ok(engine) = MarginEngine::new(config, MarginCalculatorParameters::default()) else {
            panic!("expected Ok");
        };
        engine
    }

    #[test]
    fn withdrawal_beyond_balance_rejected() {
        let mut engine = engine();
        engine.get_or_create(key());
        let Ok(margin) = engine.apply_margin_delta(&key(), Wad::from_integer(10)) else {
            panic!("expected Ok");
        };
        assert_eq!(margin, Wad::from_integer(10));
        assert_eq!(
            engine.apply_margin_delta(&key(), Wad::from_integer(-11)),
            Err(IrsError::MarginDeltaExceedsBalance {
                requested: Wad::from_integer(11),
                available: Wad::from_integer(10),
            })
        );
    }

    #[test]
    fn balance_update_is_idempotent() {
        let mut engine = engine();
        engine.get_or_create(key());
        let Ok(()) = engine.apply_liquidity_delta(&key(), 1_000) else {
            panic!("expected Ok");
        };
        let one = GROWTH_ONE as i128;
        let inside = Growth {
            fee: one,
            fixed_token: -2 * one,
            variable_token: 3 * one,
        };
        let Ok(credit) = engine.update_token_balances(&key(), inside) else {
            panic!("expected Ok");
        };
        assert_eq!(credit.fee, Wad::from_raw(1_000));
        let Ok(again) = engine.update_token_balances(&key(), inside) else {
            panic!("expected Ok");
        };
        assert_eq!(again, GrowthCredit::default());

        let Some(position) = engine.position(&key()) else {
            panic!("position exists");
        };
        assert_eq!(position.fixed_token_balance(), Wad::from_raw(-2_000));
        assert_eq!(position.variable_token_balance(), Wad::from_raw(3_000));
        assert_eq!(position.margin(), Wad::from_raw(1_000));
        assert_eq!(position.accumulated_fees(), Wad::from_raw(1_000));
    }

    #[test]
    fn liquidity_underflow_reports_both_sides() {
        let mut engine = engine();
        engine.get_or_create(key());
        let Ok(()) = engine.apply_liquidity_delta(&key(), 5) else {
            panic!("expected Ok");
        };
        assert_eq!(
            engine.apply_liquidity_delta(&key(), -6),
            Err(IrsError::LiquidityUnderflow {
                requested: 6,
                available: 5
            })
        );
    }

    #[test]
    fn settle_once_then_purge() {
        let mut engine = engine();
        engine.get_or_create(key());
        let Ok(()) = engine.settle(&key(), Wad::ZERO) else {
            panic!("expected Ok");
        };
        assert_eq!(
            engine.settle(&key(), Wad::ZERO),
            Err(IrsError::PositionAlreadySettled)
        );
        assert!(engine.purge_if_empty(&key()));
        assert!(engine.position(&key()).is_none());
    }

    #[test]
    fn new_positions_pin_latest_parameters() {
        let mut engine = engine();
        let Ok(v) = engine.push_parameters(MarginCalculatorParameters::default(), Timestamp::new(10))
        else {
            panic!("expected Ok");
        };
        assert_eq!(v, 1);
        assert_eq!(engine.get_or_create(key()).parameters_version(), 1);
    }
}
