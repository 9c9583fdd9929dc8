//! Virtual AMM: concentrated liquidity over a fixed-rate curve.
//!
//! # Overview
//!
//! The curve is a Uniswap-v3 style concentrated-liquidity book where
//! fixed tokens play token 0 and variable tokens token 1.  The price
//! `1.0001^tick` maps to the fixed rate `1 / price` percent, so tick 0
//! quotes 1%.
//!
//! Liquidity providers never hold tokens on the curve.  Instead every
//! swap step spreads the LPs' side of the trade (and the LP fee) across
//! the active liquidity through three growth accumulators; the ledger
//! later converts `(growth_inside - last_snapshot) * liquidity` into
//! position balances.
//!
//! # Swap loop
//!
//! 1. Find the next initialized tick in the direction of travel
//!    (initialized ticks live in a `BTreeMap`, so this is a range query).
//! 2. Clamp the step target to the caller's price limit.
//! 3. [`compute_swap_step`] moves the price and returns the amounts.
//! 4. Book the step on the growth accumulators and the protocol fee.
//! 5. If the tick was reached, cross it: flip its outside growth and
//!    apply its net liquidity.
//!
//! The loop stops when the notional is exhausted or the price limit is
//! hit.  A failed swap leaves the VAMM untouched.
//!
//! # Lifecycle
//!
//! [`VammStatus::Uninitialized`] until [`Vamm::initialize`] sets a price,
//! [`VammStatus::Initialized`] until the first mint, then
//! [`VammStatus::Active`].

mod tick;

pub use tick::{max_liquidity_per_tick, Growth, GrowthCredit, TickInfo, GROWTH_ONE};

use tracing::debug;

use crate::config::VammConfig;
use crate::domain::{
    seconds_to_years, Address, SqrtPriceX96, SwapOutcome, SwapParams, Tick, TickRange, Timestamp,
    Wad, MAX_TICK, MIN_TICK,
};
use crate::error::{IrsError, Result};
use crate::math::{
    balanced_fixed_tokens, compute_swap_step, is_within_grid, sqrt_price_to_tick,
    tick_to_sqrt_price, to_wad, CheckedArithmetic, FeeTerms, MAX_SQRT_RATIO, MIN_SQRT_RATIO,
};
use crate::traits::FromConfig;
use tick::{apply_liquidity_delta, TickMap};

/// Lifecycle of a [`Vamm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VammStatus {
    /// No price set; every operation except `initialize` is rejected.
    Uninitialized,
    /// Price set, no liquidity minted yet.
    Initialized,
    /// At least one mint has happened.
    Active,
}

/// Market inputs a swap needs beyond the request itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapEnvironment {
    /// Clock at the call.
    pub now: Timestamp,
    /// Realised variable rate from term start to `now`.
    pub accrued_variable_factor: Wad,
}

/// Running totals of one swap, from the trader's side.
#[derive(Debug, Clone, Copy, Default)]
struct SwapTotals {
    fixed_token_delta: Wad,
    fixed_token_delta_unbalanced: Wad,
    variable_token_delta: Wad,
    fee: Wad,
}

/// The virtual AMM of one instance.
///
/// # Examples
///
/// ```
/// use irs_amm::config::VammConfig;
/// use irs_amm::domain::{Address, SqrtPriceX96, TermWindow, TickRange, Timestamp, Wad};
/// use irs_amm::traits::FromConfig;
/// use irs_amm::vamm::{Vamm, VammStatus};
///
/// let term = TermWindow::new(Timestamp::new(0), Timestamp::new(31_536_000)).expect("term");
/// let config = VammConfig::new(60, Wad::ZERO, 0, term).expect("config");
/// let mut vamm = Vamm::from_config(&config).expect("vamm");
///
/// vamm.initialize(SqrtPriceX96::ONE).expect("initialize");
/// let range = TickRange::new(-60, 60, 60).expect("range");
/// vamm.mint(Address::repeat(1), range, 1_000_000).expect("mint");
///
/// assert_eq!(vamm.status(), VammStatus::Active);
/// assert_eq!(vamm.liquidity(), 1_000_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vamm {
    config: VammConfig,
    status: VammStatus,
    sqrt_price: SqrtPriceX96,
    tick: Tick,
    liquidity: u128,
    growth: Growth,
    protocol_fees: Wad,
    is_alpha: bool,
    periphery: Option<Address>,
    ticks: TickMap,
    max_liquidity_per_tick: u128,
}

impl Vamm {
    /// Sets the starting price.
    ///
    /// # Errors
    ///
    /// - [`IrsError::VammAlreadyInitialized`] on a second call.
    /// - [`IrsError::InvalidSqrtPrice`] if the price is not strictly inside
    ///   the tick grid.
    pub fn initialize(&mut self, sqrt_price: SqrtPriceX96) -> Result<()> {
        if self.status != VammStatus::Uninitialized {
            return Err(IrsError::VammAlreadyInitialized);
        }
        if !is_within_grid(sqrt_price) {
            return Err(IrsError::InvalidSqrtPrice(
                "initial price must lie strictly inside the tick grid",
            ));
        }
        self.tick = sqrt_price_to_tick(sqrt_price)?;
        self.sqrt_price = sqrt_price;
        self.status = VammStatus::Initialized;
        Ok(())
    }

    /// Adds `liquidity` to `range`.
    ///
    /// # Errors
    ///
    /// - [`IrsError::VammNotInitialized`] before [`Vamm::initialize`].
    /// - [`IrsError::ZeroLiquidity`], [`IrsError::InvalidTickRange`].
    /// - [`IrsError::AlphaRestricted`] if the alpha gate is on and `caller`
    ///   is not the approved periphery.
    /// - [`IrsError::MaxLiquidityPerTickExceeded`].
    pub fn mint(&mut self, caller: Address, range: TickRange, liquidity: u128) -> Result<()> {
        let delta = self.check_liquidity_change(range, liquidity)?;
        self.check_alpha_gate(caller)?;
        self.modify_liquidity(range, delta)?;
        self.status = VammStatus::Active;
        Ok(())
    }

    /// Removes `liquidity` from `range`.
    ///
    /// # Errors
    ///
    /// As [`Vamm::mint`], plus [`IrsError::LiquidityUnderflow`] if a bound
    /// holds less gross liquidity than requested.
    pub fn burn(&mut self, caller: Address, range: TickRange, liquidity: u128) -> Result<()> {
        self.check_alpha_gate(caller)?;
        self.remove_liquidity(range, liquidity)
    }

    /// Removes liquidity regardless of the alpha gate.  Liquidations use
    /// this to unwind a position's range.
    pub(crate) fn remove_liquidity(&mut self, range: TickRange, liquidity: u128) -> Result<()> {
        let delta = self.check_liquidity_change(range, liquidity)?;
        self.modify_liquidity(range, -delta)
    }

    fn check_liquidity_change(&self, range: TickRange, liquidity: u128) -> Result<i128> {
        self.require_initialized()?;
        if liquidity == 0 {
            return Err(IrsError::ZeroLiquidity);
        }
        let spacing = self.config.spacing();
        if !range.lower().is_aligned(spacing) || !range.upper().is_aligned(spacing) {
            return Err(IrsError::InvalidTickRange(
                "ticks must be aligned to tick spacing",
            ));
        }
        i128::try_from(liquidity).map_err(|_| IrsError::Overflow("liquidity exceeds i128"))
    }

    fn check_alpha_gate(&self, caller: Address) -> Result<()> {
        if self.is_alpha && self.periphery != Some(caller) {
            return Err(IrsError::AlphaRestricted);
        }
        Ok(())
    }

    fn modify_liquidity(&mut self, range: TickRange, delta: i128) -> Result<()> {
        let saved = self.clone();
        let result = self.apply_liquidity(range, delta);
        if result.is_err() {
            *self = saved;
        }
        result
    }

    fn apply_liquidity(&mut self, range: TickRange, delta: i128) -> Result<()> {
        let current = self.tick.get();
        let (lower, upper) = (range.lower().get(), range.upper().get());
        self.ticks
            .update(lower, current, delta, false, &self.growth, self.max_liquidity_per_tick)?;
        self.ticks
            .update(upper, current, delta, true, &self.growth, self.max_liquidity_per_tick)?;
        if range.contains(current) {
            self.liquidity = apply_liquidity_delta(self.liquidity, delta)?;
        }
        debug!(%range, delta, active = self.liquidity, "liquidity modified");
        Ok(())
    }

    /// Executes a swap and returns the trader's deltas.
    ///
    /// # Errors
    ///
    /// - [`IrsError::VammNotInitialized`] before [`Vamm::initialize`].
    /// - [`IrsError::InvalidPriceLimit`] for a limit on the wrong side of
    ///   the current price or outside the grid.
    /// - Arithmetic errors; the VAMM is left unchanged on any error.
    pub fn swap(&mut self, params: &SwapParams, env: &SwapEnvironment) -> Result<SwapOutcome> {
        self.require_initialized()?;
        let limit = self.resolve_limit(params)?;
        let saved = self.clone();
        match self.execute_swap(params, env, limit) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                *self = saved;
                Err(e)
            }
        }
    }

    fn resolve_limit(&self, params: &SwapParams) -> Result<SqrtPriceX96> {
        let rising = params.side().is_fixed_taker();
        let Some(limit) = params.sqrt_price_limit() else {
            let edge = if rising {
                MAX_SQRT_RATIO - 1
            } else {
                MIN_SQRT_RATIO + 1
            };
            return SqrtPriceX96::new(edge);
        };
        let current = self.sqrt_price.get();
        let valid = if rising {
            limit.get() > current && limit.get() < MAX_SQRT_RATIO
        } else {
            limit.get() < current && limit.get() > MIN_SQRT_RATIO
        };
        if !valid {
            return Err(IrsError::InvalidPriceLimit(if rising {
                "fixed taker limit must be above the current price"
            } else {
                "variable taker limit must be below the current price"
            }));
        }
        Ok(limit)
    }

    fn execute_swap(
        &mut self,
        params: &SwapParams,
        env: &SwapEnvironment,
        limit: SqrtPriceX96,
    ) -> Result<SwapOutcome> {
        let rising = params.side().is_fixed_taker();
        let term = self.config.term();
        let elapsed = term.seconds_elapsed(env.now);
        let fees = FeeTerms {
            fee_rate: self.config.fee_rate(),
            years_to_maturity: seconds_to_years(term.seconds_to_maturity(env.now)),
        };
        let mut remaining = params.notional().unsigned_abs();
        let mut totals = SwapTotals::default();

        while remaining > 0 && self.sqrt_price != limit {
            let initialized = self.ticks.next_initialized(self.tick.get(), rising);
            let next_tick = initialized.unwrap_or(if rising { MAX_TICK } else { MIN_TICK });
            let sqrt_next = tick_to_sqrt_price(Tick::new(next_tick)?)?;
            let target = if rising {
                sqrt_next.min(limit)
            } else {
                sqrt_next.max(limit)
            };

            let step = compute_swap_step(self.sqrt_price, target, self.liquidity, remaining, fees)?;
            remaining = remaining
                .checked_sub(step.variable_amount)
                .ok_or(IrsError::InvariantViolation("swap step overspent notional"))?;
            self.sqrt_price = step.sqrt_price_next;

            let fixed = to_wad(step.fixed_amount)?;
            let variable = to_wad(step.variable_amount)?;
            let (fixed_unbalanced, variable_delta) = if rising {
                (fixed, negate(variable)?)
            } else {
                (negate(fixed)?, variable)
            };
            let fixed_balanced = balanced_fixed_tokens(
                fixed_unbalanced,
                variable_delta,
                env.accrued_variable_factor,
                elapsed,
                term.duration(),
            )?;
            let fee = to_wad(step.fee)?;
            if self.liquidity > 0 {
                self.book_step(fixed_balanced, variable_delta, fee)?;
            }

            totals.fixed_token_delta = totals.fixed_token_delta.safe_add(&fixed_balanced)?;
            totals.fixed_token_delta_unbalanced =
                totals.fixed_token_delta_unbalanced.safe_add(&fixed_unbalanced)?;
            totals.variable_token_delta = totals.variable_token_delta.safe_add(&variable_delta)?;
            totals.fee = totals.fee.safe_add(&fee)?;
            debug!(
                sqrt_price = %self.sqrt_price,
                liquidity = self.liquidity,
                variable = step.variable_amount,
                fixed = step.fixed_amount,
                "swap step"
            );

            if self.sqrt_price == sqrt_next {
                if initialized.is_some() {
                    let net = self.ticks.cross(next_tick, &self.growth)?;
                    let net = if rising {
                        net
                    } else {
                        net.checked_neg()
                            .ok_or(IrsError::Overflow("tick liquidity net"))?
                    };
                    self.liquidity = apply_liquidity_delta(self.liquidity, net).map_err(|_| {
                        IrsError::InvariantViolation("active liquidity underflow on crossing")
                    })?;
                    debug!(tick = next_tick, active = self.liquidity, "tick crossed");
                }
                self.tick = Tick::new(if rising { next_tick } else { next_tick - 1 })?;
            } else {
                self.tick = sqrt_price_to_tick(self.sqrt_price)?;
            }
        }

        Ok(SwapOutcome::new(
            totals.fixed_token_delta,
            totals.variable_token_delta,
            totals.fixed_token_delta_unbalanced,
            totals.fee,
            self.tick,
            self.sqrt_price,
            remaining > 0,
        ))
    }

    /// Books the LPs' side of one step on the growth accumulators.
    fn book_step(&mut self, trader_fixed: Wad, trader_variable: Wad, fee: Wad) -> Result<()> {
        let denominator = self.config.protocol_fee_denominator();
        let protocol_cut = if denominator == 0 {
            Wad::ZERO
        } else {
            Wad::from_raw(fee.raw() / i128::from(denominator))
        };
        self.protocol_fees = self.protocol_fees.safe_add(&protocol_cut)?;
        let lp_fee = fee.safe_sub(&protocol_cut)?;

        Growth::accrue(&mut self.growth.fee, lp_fee, self.liquidity)?;
        Growth::accrue(&mut self.growth.fixed_token, negate(trader_fixed)?, self.liquidity)?;
        Growth::accrue(
            &mut self.growth.variable_token,
            negate(trader_variable)?,
            self.liquidity,
        )
    }

    /// Turns the alpha gate on or off.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::AlphaStateAlreadySet`] if the flag already holds
    /// `is_alpha`.
    pub fn set_is_alpha(&mut self, is_alpha: bool) -> Result<()> {
        if self.is_alpha == is_alpha {
            return Err(IrsError::AlphaStateAlreadySet);
        }
        self.is_alpha = is_alpha;
        Ok(())
    }

    /// Sets or clears the approved periphery (router).
    pub fn set_periphery(&mut self, periphery: Option<Address>) {
        self.periphery = periphery;
    }

    /// Takes every accumulated protocol fee, leaving zero behind.
    pub fn collect_protocol_fees(&mut self) -> Wad {
        core::mem::take(&mut self.protocol_fees)
    }

    /// Growth accumulated inside `range` so far.
    ///
    /// # Errors
    ///
    /// Arithmetic errors on overflow.
    pub fn growth_inside(&self, range: TickRange) -> Result<Growth> {
        self.ticks.growth_inside(
            range.lower().get(),
            range.upper().get(),
            self.tick.get(),
            &self.growth,
        )
    }

    fn require_initialized(&self) -> Result<()> {
        if self.status == VammStatus::Uninitialized {
            return Err(IrsError::VammNotInitialized);
        }
        Ok(())
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn status(&self) -> VammStatus {
        self.status
    }

    /// The VAMM's configuration.
    #[must_use]
    pub const fn config(&self) -> &VammConfig {
        &self.config
    }

    /// Current tick.
    #[must_use]
    pub const fn current_tick(&self) -> Tick {
        self.tick
    }

    /// Current sqrt price.
    #[must_use]
    pub const fn current_sqrt_price(&self) -> SqrtPriceX96 {
        self.sqrt_price
    }

    /// Active liquidity at the current tick.
    #[must_use]
    pub const fn liquidity(&self) -> u128 {
        self.liquidity
    }

    /// Global growth accumulators.
    #[must_use]
    pub const fn growth_global(&self) -> Growth {
        self.growth
    }

    /// Protocol fees awaiting collection.
    #[must_use]
    pub const fn protocol_fees(&self) -> Wad {
        self.protocol_fees
    }

    /// Whether the alpha gate is on.
    #[must_use]
    pub const fn is_alpha(&self) -> bool {
        self.is_alpha
    }

    /// Approved periphery, if any.
    #[must_use]
    pub const fn periphery(&self) -> Option<Address> {
        self.periphery
    }

    /// Gross liquidity ceiling for any single tick.
    #[must_use]
    pub const fn max_liquidity_per_tick(&self) -> u128 {
        self.max_liquidity_per_tick
    }

    /// State of an initialized tick.
    #[must_use]
    pub fn tick_info(&self, tick: i32) -> Option<TickInfo> {
        self.ticks.get(tick).copied()
    }

    /// All initialized ticks in ascending order.
    pub fn initialized_ticks(&self) -> impl Iterator<Item = (i32, TickInfo)> + '_ {
        self.ticks.iter().map(|(&t, &info)| (t, info))
    }
}

fn negate(value: Wad) -> Result<Wad> {
    value
        .checked_neg()
        .ok_or(IrsError::Overflow("wad negation"))
}

impl FromConfig<VammConfig> for Vamm {
    fn from_config(config: &VammConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: *config,
            status: VammStatus::Uninitialized,
            sqrt_price: SqrtPriceX96::ONE,
            tick: Tick::ZERO,
            liquidity: 0,
            growth: Growth::default(),
            protocol_fees: Wad::ZERO,
            is_alpha: false,
            periphery: None,
            ticks: TickMap::default(),
            max_liquidity_per_tick: max_liquidity_per_tick(config.spacing()),
        })
    }
}
