//! One deployed interest-rate-swap market.
//!
//! An [`IrsInstance`] pairs a [`Vamm`] with a [`MarginEngine`] and is the
//! only way to mutate either.  Every public operation:
//!
//! 1. snapshots the VAMM and the ledger,
//! 2. runs against the live state, collecting events and token transfers,
//! 3. on success executes the transfer batch through the caller's
//!    [`SettlementToken`] and publishes the events,
//! 4. on any failure (including a rejected transfer batch) restores the
//!    snapshot and discards the events.
//!
//! Tokens therefore only move once the new state is final.

use core::mem;

use tracing::{debug, warn};

use crate::calculator::{MarginMode, MarketSnapshot, RateStatistics};
use crate::config::{InstanceConfig, InstanceKey, MarginCalculatorParameters};
use crate::domain::{
    Address, SqrtPriceX96, SwapOutcome, SwapParams, TakerSide, TickRange, Timestamp, Wad,
};
use crate::error::{IrsError, Result};
use crate::events::{publish, IrsEvent};
use crate::margin_engine::{MarginEngine, Position, PositionKey};
use crate::math::settlement_cashflow;
use crate::traits::{FromConfig, RateOracle, SettlementToken, Transfer};
use crate::vamm::{GrowthCredit, SwapEnvironment, Vamm};

/// Who is calling, when, and the collaborators the call may consult.
pub struct CallContext<'a> {
    pub caller: Address,
    pub now: Timestamp,
    pub oracle: &'a dyn RateOracle,
    pub token: &'a mut dyn SettlementToken,
}

/// The read-only part of a [`CallContext`], shared by staged operations.
#[derive(Clone, Copy)]
pub(crate) struct CallEnv<'a> {
    pub(crate) caller: Address,
    pub(crate) now: Timestamp,
    pub(crate) oracle: &'a dyn RateOracle,
}

/// A deployed market: VAMM, margin engine and the event journal.
///
/// # Examples
///
/// ```
/// use irs_amm::config::{InstanceConfig, MarginCalculatorParameters, MarginEngineConfig, VammConfig};
/// use irs_amm::domain::{Address, SqrtPriceX96, TermWindow, Timestamp, Wad};
/// use irs_amm::instance::{CallContext, IrsInstance};
/// use irs_amm::oracle::RingBufferRateOracle;
/// use irs_amm::token::InMemorySettlementToken;
/// use irs_amm::traits::FromConfig;
///
/// let owner = Address::repeat(1);
/// let term = TermWindow::new(Timestamp::new(0), Timestamp::new(31_536_000)).expect("term");
/// let config = InstanceConfig::new(
///     owner,
///     Address::repeat(9),
///     Address::repeat(2),
///     Address::repeat(3),
///     VammConfig::new(60, Wad::ZERO, 0, term).expect("vamm"),
///     MarginEngineConfig::new(3_600, 0).expect("engine"),
///     MarginCalculatorParameters::default(),
/// )
/// .expect("config");
/// let mut instance = IrsInstance::from_config(&config).expect("instance");
///
/// let oracle = RingBufferRateOracle::new(Timestamp::new(0), Wad::ONE).expect("oracle");
/// let mut token = InMemorySettlementToken::default();
/// let mut ctx = CallContext {
///     caller: owner,
///     now: Timestamp::new(0),
///     oracle: &oracle,
///     token: &mut token,
/// };
/// instance.initialize_vamm(&mut ctx, SqrtPriceX96::ONE).expect("initialize");
/// assert_eq!(instance.events().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrsInstance {
    config: InstanceConfig,
    vamm: Vamm,
    engine: MarginEngine,
    staged: Vec<IrsEvent>,
    journal: Vec<IrsEvent>,
}

impl FromConfig<InstanceConfig> for IrsInstance {
    fn from_config(config: &InstanceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: *config,
            vamm: Vamm::from_config(config.vamm())?,
            engine: MarginEngine::new(*config.margin_engine(), *config.parameters())?,
            staged: Vec::new(),
            journal: Vec::new(),
        })
    }
}

impl IrsInstance {
    // -- transaction plumbing -----------------------------------------------

    /// Runs `op` all-or-nothing and settles its transfers after commit.
    pub(crate) fn transact<'a, T, F>(&mut self, ctx: &mut CallContext<'a>, op: F) -> Result<T>
    where
        F: FnOnce(&mut Self, &CallEnv<'a>, &mut Vec<Transfer>) -> Result<T>,
    {
        let env = CallEnv {
            caller: ctx.caller,
            now: ctx.now,
            oracle: ctx.oracle,
        };
        let saved_vamm = self.vamm.clone();
        let saved_engine = self.engine.clone();
        let mut batch = Vec::new();

        let result = op(self, &env, &mut batch).and_then(|value| {
            if !batch.is_empty() {
                ctx.token.execute(self.config.escrow(), &batch).map_err(|e| {
                    warn!(error = %e, transfers = batch.len(), "transfer batch rejected");
                    e
                })?;
            }
            Ok(value)
        });

        match result {
            Ok(value) => {
                let staged = mem::take(&mut self.staged);
                publish(&mut self.journal, staged);
                Ok(value)
            }
            Err(e) => {
                debug!(error = %e, caller = %env.caller, "call rolled back");
                self.vamm = saved_vamm;
                self.engine = saved_engine;
                self.staged.clear();
                Err(e)
            }
        }
    }

    fn authorize(&self, caller: Address, owner: Address) -> Result<()> {
        if caller == owner || self.vamm.periphery() == Some(caller) {
            Ok(())
        } else {
            Err(IrsError::Unauthorized(
                "caller is neither the owner nor the approved periphery",
            ))
        }
    }

    fn only_owner(&self, caller: Address) -> Result<()> {
        if caller == self.config.owner() {
            Ok(())
        } else {
            Err(IrsError::Unauthorized("caller is not the instance owner"))
        }
    }

    fn check_range(&self, range: TickRange) -> Result<()> {
        let spacing = self.config.vamm().spacing();
        if range.lower().is_aligned(spacing) && range.upper().is_aligned(spacing) {
            Ok(())
        } else {
            Err(IrsError::InvalidTickRange(
                "ticks must be aligned to tick spacing",
            ))
        }
    }

    fn market(&self, now: Timestamp) -> MarketSnapshot {
        MarketSnapshot {
            sqrt_price: self.vamm.current_sqrt_price(),
            term: self.config.vamm().term(),
            now,
        }
    }

    fn rates(&self, now: Timestamp, oracle: &dyn RateOracle) -> Result<RateStatistics> {
        let term = self.config.vamm().term();
        let historical_apy =
            oracle.current_observed_apy(now, self.engine.config().apy_lookback_seconds())?;
        let accrued_variable_factor = if now <= term.start() {
            Wad::ZERO
        } else {
            oracle.variable_rate_between(term.start(), now.min(term.end()))?
        };
        Ok(RateStatistics {
            historical_apy,
            accrued_variable_factor,
        })
    }

    /// Credits growth accrued inside the position's range.
    fn sync(&mut self, key: &PositionKey) -> Result<GrowthCredit> {
        let inside = self.vamm.growth_inside(key.range)?;
        self.engine.update_token_balances(key, inside)
    }

    fn requirement(&self, key: &PositionKey, mode: MarginMode, env: &CallEnv<'_>) -> Result<Wad> {
        let rates = self.rates(env.now, env.oracle)?;
        self.engine
            .margin_requirement(key, mode, &rates, &self.market(env.now))
    }

    fn margin_of(&self, key: &PositionKey) -> Result<Wad> {
        self.engine
            .position(key)
            .map(Position::margin)
            .ok_or(IrsError::PositionNotFound)
    }

    // -- staged operations --------------------------------------------------

    pub(crate) fn initialize_vamm_staged(
        &mut self,
        env: &CallEnv<'_>,
        sqrt_price: SqrtPriceX96,
    ) -> Result<()> {
        self.only_owner(env.caller)?;
        self.vamm.initialize(sqrt_price)?;
        self.staged.push(IrsEvent::VammInitialized {
            sqrt_price,
            tick: self.vamm.current_tick(),
        });
        Ok(())
    }

    pub(crate) fn mint_staged(
        &mut self,
        env: &CallEnv<'_>,
        owner: Address,
        range: TickRange,
        liquidity: u128,
    ) -> Result<()> {
        self.authorize(env.caller, owner)?;
        self.check_range(range)?;
        if self.config.vamm().term().is_matured(env.now) {
            return Err(IrsError::AfterTermEnd("mint"));
        }
        let key = PositionKey::new(owner, range);
        self.engine.get_or_create(key);
        self.sync(&key)?;

        self.vamm.mint(env.caller, range, liquidity)?;
        let delta =
            i128::try_from(liquidity).map_err(|_| IrsError::Overflow("liquidity exceeds i128"))?;
        self.engine.apply_liquidity_delta(&key, delta)?;
        self.engine
            .reset_snapshot(&key, self.vamm.growth_inside(range)?)?;
        self.engine.pin_latest(&key)?;

        let margin_requirement = self.requirement(&key, MarginMode::Initial, env)?;
        let margin = self.margin_of(&key)?;
        if margin < margin_requirement {
            return Err(IrsError::InsufficientMarginForMint {
                margin_requirement,
                margin,
            });
        }
        self.staged.push(IrsEvent::PositionMinted {
            sender: env.caller,
            owner,
            range,
            liquidity,
        });
        Ok(())
    }

    pub(crate) fn burn_staged(
        &mut self,
        env: &CallEnv<'_>,
        owner: Address,
        range: TickRange,
        liquidity: u128,
    ) -> Result<()> {
        self.authorize(env.caller, owner)?;
        let key = PositionKey::new(owner, range);
        if self.engine.position(&key).is_none() {
            return Err(IrsError::PositionNotFound);
        }
        self.sync(&key)?;

        let delta =
            i128::try_from(liquidity).map_err(|_| IrsError::Overflow("liquidity exceeds i128"))?;
        self.engine.apply_liquidity_delta(&key, -delta)?;
        self.vamm.burn(env.caller, range, liquidity)?;
        self.engine
            .reset_snapshot(&key, self.vamm.growth_inside(range)?)?;

        if !self.config.vamm().term().is_matured(env.now) {
            self.engine.pin_latest(&key)?;
            let margin_requirement = self.requirement(&key, MarginMode::Initial, env)?;
            if self.margin_of(&key)? < margin_requirement {
                return Err(IrsError::MarginLessThanMinimum { margin_requirement });
            }
        }
        self.staged.push(IrsEvent::PositionBurned {
            sender: env.caller,
            owner,
            range,
            liquidity,
        });
        self.engine.purge_if_empty(&key);
        Ok(())
    }

    pub(crate) fn swap_staged(
        &mut self,
        env: &CallEnv<'_>,
        params: &SwapParams,
    ) -> Result<SwapOutcome> {
        self.authorize(env.caller, params.recipient())?;
        self.check_range(params.range())?;
        let term = self.config.vamm().term();
        if env.now < term.start() {
            return Err(IrsError::BeforeTermStart("swap"));
        }
        if term.is_matured(env.now) {
            return Err(IrsError::AfterTermEnd("swap"));
        }

        let rates = self.rates(env.now, env.oracle)?;
        let outcome = self.vamm.swap(
            params,
            &SwapEnvironment {
                now: env.now,
                accrued_variable_factor: rates.accrued_variable_factor,
            },
        )?;

        let key = PositionKey::new(params.recipient(), params.range());
        self.engine.get_or_create(key);
        self.sync(&key)?;
        self.engine.apply_swap(&key, &outcome)?;
        self.engine.pin_latest(&key)?;

        let margin_requirement = self.engine.margin_requirement(
            &key,
            MarginMode::Initial,
            &rates,
            &self.market(env.now),
        )?;
        if self.margin_of(&key)? < margin_requirement {
            return Err(IrsError::MarginRequirementNotMet {
                margin_requirement,
                tick: outcome.tick_after().get(),
                fixed_token_delta: outcome.fixed_token_delta(),
                variable_token_delta: outcome.variable_token_delta(),
                fee: outcome.fee(),
                fixed_token_delta_unbalanced: outcome.fixed_token_delta_unbalanced(),
            });
        }
        self.staged.push(IrsEvent::SwapExecuted {
            sender: env.caller,
            recipient: params.recipient(),
            range: params.range(),
            side: params.side(),
            notional: params.notional(),
            fixed_token_delta: outcome.fixed_token_delta(),
            variable_token_delta: outcome.variable_token_delta(),
            fixed_token_delta_unbalanced: outcome.fixed_token_delta_unbalanced(),
            fee: outcome.fee(),
            tick_after: outcome.tick_after(),
        });
        Ok(outcome)
    }

    pub(crate) fn update_position_margin_staged(
        &mut self,
        env: &CallEnv<'_>,
        batch: &mut Vec<Transfer>,
        owner: Address,
        range: TickRange,
        margin_delta: Wad,
    ) -> Result<Wad> {
        if margin_delta.is_zero() {
            return Err(IrsError::InvalidMarginDelta("margin delta must be non-zero"));
        }
        self.check_range(range)?;
        let key = PositionKey::new(owner, range);

        let margin = if margin_delta.is_positive() {
            self.engine.get_or_create(key);
            let margin = self.engine.apply_margin_delta(&key, margin_delta)?;
            batch.push(Transfer::Deposit {
                from: env.caller,
                amount: margin_delta,
            });
            margin
        } else {
            self.authorize(env.caller, owner)?;
            let position = self.engine.position(&key).ok_or(IrsError::PositionNotFound)?;
            let matured = self.config.vamm().term().is_matured(env.now);
            if matured && !position.is_settled() {
                return Err(IrsError::PositionNotSettled);
            }
            self.sync(&key)?;
            let margin = self.engine.apply_margin_delta(&key, margin_delta)?;
            if !matured {
                self.engine.pin_latest(&key)?;
                let margin_requirement = self.requirement(&key, MarginMode::Initial, env)?;
                if margin < margin_requirement {
                    return Err(IrsError::MarginLessThanMinimum { margin_requirement });
                }
            }
            batch.push(Transfer::Payout {
                to: owner,
                amount: margin_delta
                    .checked_neg()
                    .ok_or(IrsError::Overflow("margin delta"))?,
            });
            margin
        };

        self.staged.push(IrsEvent::MarginUpdated {
            sender: env.caller,
            owner,
            range,
            margin_delta,
            margin,
        });
        self.engine.purge_if_empty(&key);
        Ok(margin)
    }

    pub(crate) fn liquidate_staged(
        &mut self,
        env: &CallEnv<'_>,
        batch: &mut Vec<Transfer>,
        owner: Address,
        range: TickRange,
    ) -> Result<Wad> {
        if self.config.vamm().term().is_matured(env.now) {
            return Err(IrsError::AfterTermEnd("liquidation"));
        }
        let key = PositionKey::new(owner, range);
        if self.engine.position(&key).is_none() {
            return Err(IrsError::PositionNotFound);
        }
        self.sync(&key)?;

        let rates = self.rates(env.now, env.oracle)?;
        let margin_requirement = self.engine.margin_requirement(
            &key,
            MarginMode::Liquidation,
            &rates,
            &self.market(env.now),
        )?;
        let margin = self.margin_of(&key)?;
        if margin >= margin_requirement {
            warn!(%key, %margin, %margin_requirement, "liquidation rejected");
            return Err(IrsError::PositionNotLiquidatable {
                margin,
                margin_requirement,
            });
        }

        let liquidity = self
            .engine
            .position(&key)
            .map_or(0, Position::liquidity);
        if liquidity > 0 {
            let delta = i128::try_from(liquidity)
                .map_err(|_| IrsError::Overflow("liquidity exceeds i128"))?;
            self.engine.apply_liquidity_delta(&key, -delta)?;
            self.vamm.remove_liquidity(range, liquidity)?;
            self.engine
                .reset_snapshot(&key, self.vamm.growth_inside(range)?)?;
        }

        let reward = self.engine.liquidator_reward(&key, env.now)?;
        if reward.is_positive() {
            let debit = reward
                .checked_neg()
                .ok_or(IrsError::Overflow("liquidator reward"))?;
            self.engine.apply_margin_delta(&key, debit)?;
            batch.push(Transfer::Payout {
                to: env.caller,
                amount: reward,
            });
        }

        let variable = self
            .engine
            .position(&key)
            .map_or(Wad::ZERO, Position::variable_token_balance);
        let notional_unwound = Wad::from_raw(
            i128::try_from(variable.unsigned_abs())
                .map_err(|_| IrsError::Overflow("unwind notional"))?,
        );
        if !variable.is_zero() {
            let side = if variable.is_positive() {
                TakerSide::FixedTaker
            } else {
                TakerSide::VariableTaker
            };
            let params = SwapParams::new(owner, side, notional_unwound, None, range)?;
            let outcome = self.vamm.swap(
                &params,
                &SwapEnvironment {
                    now: env.now,
                    accrued_variable_factor: rates.accrued_variable_factor,
                },
            )?;
            self.sync(&key)?;
            self.engine.apply_swap(&key, &outcome)?;
        }

        self.staged.push(IrsEvent::PositionLiquidated {
            liquidator: env.caller,
            owner,
            range,
            notional_unwound,
            liquidator_reward: reward,
        });
        Ok(reward)
    }

    pub(crate) fn settle_staged(
        &mut self,
        env: &CallEnv<'_>,
        owner: Address,
        range: TickRange,
    ) -> Result<Wad> {
        let term = self.config.vamm().term();
        if !term.is_matured(env.now) {
            return Err(IrsError::NotPastTermEnd {
                now: env.now,
                term_end: term.end(),
            });
        }
        let key = PositionKey::new(owner, range);
        let position = self.engine.position(&key).ok_or(IrsError::PositionNotFound)?;
        if position.is_settled() {
            return Err(IrsError::PositionAlreadySettled);
        }
        self.sync(&key)?;

        let position = self.engine.position(&key).ok_or(IrsError::PositionNotFound)?;
        let variable_factor = env.oracle.variable_rate_between(term.start(), term.end())?;
        let cashflow = settlement_cashflow(
            position.fixed_token_balance(),
            position.variable_token_balance(),
            term.duration(),
            variable_factor,
        )?;
        self.engine.settle(&key, cashflow)?;
        self.staged.push(IrsEvent::PositionSettled {
            owner,
            range,
            settlement_cashflow: cashflow,
        });
        Ok(cashflow)
    }

    // -- public operations --------------------------------------------------

    /// Sets the VAMM's starting price.  Owner only.
    ///
    /// # Errors
    ///
    /// [`IrsError::Unauthorized`], [`IrsError::VammAlreadyInitialized`],
    /// [`IrsError::InvalidSqrtPrice`].
    pub fn initialize_vamm(
        &mut self,
        ctx: &mut CallContext<'_>,
        sqrt_price: SqrtPriceX96,
    ) -> Result<()> {
        self.transact(ctx, |instance, env, _| {
            instance.initialize_vamm_staged(env, sqrt_price)
        })
    }

    /// Provides `liquidity` on `range` for `owner`.
    ///
    /// # Errors
    ///
    /// - [`IrsError::Unauthorized`] unless the caller is the owner or the
    ///   approved periphery.
    /// - [`IrsError::AlphaRestricted`] while the alpha gate is on, for any
    ///   caller but the periphery.
    /// - [`IrsError::AfterTermEnd`] at or after maturity.
    /// - [`IrsError::InsufficientMarginForMint`] if the position's margin
    ///   does not cover its new Initial requirement.
    /// - VAMM validation errors.
    pub fn mint(
        &mut self,
        ctx: &mut CallContext<'_>,
        owner: Address,
        range: TickRange,
        liquidity: u128,
    ) -> Result<()> {
        self.transact(ctx, |instance, env, _| {
            instance.mint_staged(env, owner, range, liquidity)
        })
    }

    /// Removes `liquidity` from `owner`'s position on `range`.
    ///
    /// # Errors
    ///
    /// - [`IrsError::LiquidityUnderflow`] if the position holds less.
    /// - [`IrsError::MarginLessThanMinimum`] before maturity, if the
    ///   remaining position is under-margined.
    /// - Access errors as for [`IrsInstance::mint`].
    pub fn burn(
        &mut self,
        ctx: &mut CallContext<'_>,
        owner: Address,
        range: TickRange,
        liquidity: u128,
    ) -> Result<()> {
        self.transact(ctx, |instance, env, _| {
            instance.burn_staged(env, owner, range, liquidity)
        })
    }

    /// Trades against the curve and books the exposure on
    /// `(params.recipient(), params.range())`.
    ///
    /// # Errors
    ///
    /// - [`IrsError::BeforeTermStart`] / [`IrsError::AfterTermEnd`] outside
    ///   the term.
    /// - [`IrsError::MarginRequirementNotMet`] carrying the would-be
    ///   requirement and swap deltas.
    /// - VAMM and oracle errors.
    pub fn swap(&mut self, ctx: &mut CallContext<'_>, params: &SwapParams) -> Result<SwapOutcome> {
        self.transact(ctx, |instance, env, _| instance.swap_staged(env, params))
    }

    /// Deposits (positive delta, any caller) or withdraws (negative delta,
    /// owner or periphery) margin.
    ///
    /// Deposits are pulled from the caller; withdrawals are paid to the
    /// owner.  Returns the new margin.
    ///
    /// # Errors
    ///
    /// - [`IrsError::InvalidMarginDelta`] for a zero delta.
    /// - [`IrsError::MarginDeltaExceedsBalance`],
    ///   [`IrsError::MarginLessThanMinimum`] for withdrawals.
    /// - [`IrsError::PositionNotSettled`] for a withdrawal after maturity
    ///   from an unsettled position.
    /// - [`IrsError::TransferRejected`] if the token refuses the transfer.
    pub fn update_position_margin(
        &mut self,
        ctx: &mut CallContext<'_>,
        owner: Address,
        range: TickRange,
        margin_delta: Wad,
    ) -> Result<Wad> {
        self.transact(ctx, |instance, env, batch| {
            instance.update_position_margin_staged(env, batch, owner, range, margin_delta)
        })
    }

    /// Credits growth accrued since the last update to the position's
    /// balances and margin.  Any caller; idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::PositionNotFound`] if there is no such position.
    pub fn update_position_token_balances_and_account_for_fees(
        &mut self,
        ctx: &mut CallContext<'_>,
        owner: Address,
        range: TickRange,
    ) -> Result<GrowthCredit> {
        self.transact(ctx, |instance, _, _| {
            instance.sync(&PositionKey::new(owner, range))
        })
    }

    /// Liquidates an under-margined position and returns the liquidator's
    /// reward.
    ///
    /// # Errors
    ///
    /// - [`IrsError::AfterTermEnd`] at or after maturity.
    /// - [`IrsError::PositionNotLiquidatable`] if the margin covers the
    ///   Liquidation requirement.
    pub fn liquidate_position(
        &mut self,
        ctx: &mut CallContext<'_>,
        owner: Address,
        range: TickRange,
    ) -> Result<Wad> {
        self.transact(ctx, |instance, env, batch| {
            instance.liquidate_staged(env, batch, owner, range)
        })
    }

    /// Settles a position after maturity and returns its cash flow.
    ///
    /// # Errors
    ///
    /// - [`IrsError::NotPastTermEnd`] before maturity.
    /// - [`IrsError::PositionAlreadySettled`] on a second call.
    pub fn settle_position(
        &mut self,
        ctx: &mut CallContext<'_>,
        owner: Address,
        range: TickRange,
    ) -> Result<Wad> {
        self.transact(ctx, |instance, env, _| {
            instance.settle_staged(env, owner, range)
        })
    }

    /// Turns the alpha gate on or off.  Owner only.
    ///
    /// # Errors
    ///
    /// [`IrsError::Unauthorized`], [`IrsError::AlphaStateAlreadySet`].
    pub fn set_is_alpha(&mut self, ctx: &mut CallContext<'_>, is_alpha: bool) -> Result<()> {
        self.transact(ctx, |instance, env, _| {
            instance.only_owner(env.caller)?;
            instance.vamm.set_is_alpha(is_alpha)?;
            instance.staged.push(IrsEvent::IsAlpha { is_alpha });
            Ok(())
        })
    }

    /// Approves (or clears) the periphery allowed to act for owners.
    /// Owner only.
    ///
    /// # Errors
    ///
    /// [`IrsError::Unauthorized`].
    pub fn set_periphery(
        &mut self,
        ctx: &mut CallContext<'_>,
        periphery: Option<Address>,
    ) -> Result<()> {
        self.transact(ctx, |instance, env, _| {
            instance.only_owner(env.caller)?;
            instance.vamm.set_periphery(periphery);
            instance
                .staged
                .push(IrsEvent::PeripheryUpdated { periphery });
            Ok(())
        })
    }

    /// Publishes a new calculator parameter version effective now.  Owner
    /// only.  Returns the version number.
    ///
    /// # Errors
    ///
    /// [`IrsError::Unauthorized`], [`IrsError::InvalidConfiguration`].
    pub fn update_parameters(
        &mut self,
        ctx: &mut CallContext<'_>,
        parameters: MarginCalculatorParameters,
    ) -> Result<u32> {
        self.transact(ctx, |instance, env, _| {
            instance.only_owner(env.caller)?;
            let version = instance.engine.push_parameters(parameters, env.now)?;
            instance
                .staged
                .push(IrsEvent::ParametersUpdated { version });
            Ok(version)
        })
    }

    /// Pays every accumulated protocol fee to `recipient`.  Owner only.
    ///
    /// # Errors
    ///
    /// [`IrsError::Unauthorized`], [`IrsError::TransferRejected`].
    pub fn collect_protocol_fees(
        &mut self,
        ctx: &mut CallContext<'_>,
        recipient: Address,
    ) -> Result<Wad> {
        self.transact(ctx, |instance, env, batch| {
            instance.only_owner(env.caller)?;
            let amount = instance.vamm.collect_protocol_fees();
            if amount.is_positive() {
                batch.push(Transfer::Payout {
                    to: recipient,
                    amount,
                });
                instance
                    .staged
                    .push(IrsEvent::ProtocolFeesCollected { recipient, amount });
            }
            Ok(amount)
        })
    }

    // -- queries ------------------------------------------------------------

    /// Requirement of a position under `mode`, including growth not yet
    /// credited to it.
    ///
    /// # Errors
    ///
    /// [`IrsError::PositionNotFound`], oracle and calculator errors.
    pub fn position_margin_requirement(
        &self,
        owner: Address,
        range: TickRange,
        mode: MarginMode,
        now: Timestamp,
        oracle: &dyn RateOracle,
    ) -> Result<Wad> {
        let key = PositionKey::new(owner, range);
        let mut engine = self.engine.clone();
        engine.update_token_balances(&key, self.vamm.growth_inside(range)?)?;
        let rates = self.rates(now, oracle)?;
        engine.margin_requirement(&key, mode, &rates, &self.market(now))
    }

    #[must_use]
    pub const fn config(&self) -> &InstanceConfig {
        &self.config
    }

    #[must_use]
    pub const fn key(&self) -> InstanceKey {
        self.config.key()
    }

    #[must_use]
    pub const fn vamm(&self) -> &Vamm {
        &self.vamm
    }

    #[must_use]
    pub const fn margin_engine(&self) -> &MarginEngine {
        &self.engine
    }

    /// Position of `owner` on `range`, if any.
    #[must_use]
    pub fn position(&self, owner: Address, range: TickRange) -> Option<&Position> {
        self.engine.position(&PositionKey::new(owner, range))
    }

    /// Events of every committed call, oldest first.
    #[must_use]
    pub fn events(&self) -> &[IrsEvent] {
        &self.journal
    }

    /// Hands the journal to the caller, leaving it empty.
    pub fn drain_events(&mut self) -> Vec<IrsEvent> {
        mem::take(&mut self.journal)
    }
}
