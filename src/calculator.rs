//! Margin requirements for positions.
//!
//! The calculator is a pure function of the position's exposure, the
//! parameter set, the oracle's rate statistics and the market snapshot.
//! It answers "how much could this position lose if it had to be unwound
//! at a stressed fixed rate?".
//!
//! # Model
//!
//! 1. Time factor `tau = min(time_to_maturity, t_max) / t_max`.
//! 2. APY band around the observed APY, widened by the confidence term
//!    `xi * sqrt(sigma^2 * (alpha + beta * apy) * tau)` and kept at least
//!    `min_delta` away from the APY.  The Initial band additionally scales
//!    the APY by the upper/lower multipliers.
//! 3. Stressed unwind rates left and right of the current fixed rate
//!    `r`, at least `max(r * dev_mul * tau, deviation_min)` away from it
//!    and no tighter than the band.
//! 4. Cash flow to maturity if the variable leg realised the stressed
//!    rate; the requirement is the worse loss of the two scenarios.
//! 5. LP positions are also evaluated after absorbing the trades that
//!    would push the price to either edge of their range.
//! 6. Any non-empty position requires at least the liquidator incentive.
//!
//! Initial mode yields a requirement at least as large as Liquidation
//! mode for every validated parameter set.

use integer_sqrt::IntegerSquareRoot;

use crate::config::MarginCalculatorParameters;
use crate::domain::{
    seconds_to_years, Rounding, SqrtPriceX96, TermWindow, TickRange, Timestamp, Wad, WAD,
};
use crate::error::{IrsError, Result};
use crate::math::{
    amounts_for_price_move, balanced_fixed_tokens, fixed_factor, fixed_rate_at,
    tick_to_sqrt_price, CheckedArithmetic, FeeTerms,
};

/// Which requirement to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarginMode {
    /// Checked on voluntary changes (mint, swap, withdrawal).
    Initial,
    /// Below this a position may be liquidated.
    Liquidation,
}

/// Exposure of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSnapshot {
    pub range: TickRange,
    pub liquidity: u128,
    pub fixed_token_balance: Wad,
    pub variable_token_balance: Wad,
}

impl PositionSnapshot {
    /// `true` if the position carries neither liquidity nor balances.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.liquidity == 0
            && self.fixed_token_balance.is_zero()
            && self.variable_token_balance.is_zero()
    }
}

/// Rate statistics read from the oracle at the time of the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateStatistics {
    /// Observed APY over the lookback window, as a fraction.
    pub historical_apy: Wad,
    /// Realised variable rate from term start to now.
    pub accrued_variable_factor: Wad,
}

/// Market state at the time of the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketSnapshot {
    pub sqrt_price: SqrtPriceX96,
    pub term: TermWindow,
    pub now: Timestamp,
}

/// Stressed fixed rates (percent) used to unwind a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UnwindRates {
    left: Wad,
    right: Wad,
}

/// Margin `position` must hold under `mode`.
///
/// # Examples
///
/// ```
/// use irs_amm::calculator::{
///     required_margin, MarginMode, MarketSnapshot, PositionSnapshot, RateStatistics,
/// };
/// use irs_amm::config::MarginCalculatorParameters;
/// use irs_amm::domain::{SqrtPriceX96, TermWindow, TickRange, Timestamp, Wad};
///
/// let position = PositionSnapshot {
///     range: TickRange::new(-60, 60, 60).expect("range"),
///     liquidity: 0,
///     fixed_token_balance: Wad::from_integer(100),
///     variable_token_balance: Wad::from_integer(-100),
/// };
/// let market = MarketSnapshot {
///     sqrt_price: SqrtPriceX96::ONE,
///     term: TermWindow::new(Timestamp::new(0), Timestamp::new(31_536_000)).expect("term"),
///     now: Timestamp::new(0),
/// };
/// let rates = RateStatistics {
///     historical_apy: Wad::from_raw(10_000_000_000_000_000),
///     accrued_variable_factor: Wad::ZERO,
/// };
/// let params = MarginCalculatorParameters::default();
///
/// let im = required_margin(&position, &params, &rates, &market, MarginMode::Initial).expect("im");
/// let lm = required_margin(&position, &params, &rates, &market, MarginMode::Liquidation).expect("lm");
/// assert!(im >= lm);
/// assert!(lm > Wad::from_integer(2));
/// ```
///
/// # Errors
///
/// Arithmetic errors on overflow; tick errors for malformed ranges.
pub fn required_margin(
    position: &PositionSnapshot,
    params: &MarginCalculatorParameters,
    rates: &RateStatistics,
    market: &MarketSnapshot,
    mode: MarginMode,
) -> Result<Wad> {
    if position.is_empty() {
        return Ok(Wad::ZERO);
    }
    let tau = time_factor(market.term.seconds_to_maturity(market.now), params.t_max)?;
    let (band_lower, band_upper) = apy_band(params, rates.historical_apy, tau, mode)?;

    let current_rate = fixed_rate_at(market.sqrt_price, Rounding::Down)?;
    let mut requirement = unwind_loss(
        position.fixed_token_balance,
        position.variable_token_balance,
        current_rate,
        (band_lower, band_upper),
        tau,
        params,
        rates,
        market,
        mode,
    )?;

    if position.liquidity > 0 {
        for edge in [position.range.lower(), position.range.upper()] {
            let edge_price = tick_to_sqrt_price(edge)?;
            let (fixed, variable) = exposure_at(position, edge_price, rates, market)?;
            let edge_rate = fixed_rate_at(edge_price, Rounding::Down)?;
            let loss = unwind_loss(
                fixed,
                variable,
                edge_rate,
                (band_lower, band_upper),
                tau,
                params,
                rates,
                market,
                mode,
            )?;
            requirement = requirement.max(loss);
        }
    }

    Ok(requirement.max(params.min_margin_to_incentivise_liquidators))
}

/// `min(seconds, t_max) / t_max` as a fraction.
fn time_factor(seconds_to_maturity: u64, t_max: u64) -> Result<Wad> {
    if t_max == 0 {
        return Err(IrsError::InvalidConfiguration("t_max must be positive"));
    }
    let capped = seconds_to_maturity.min(t_max);
    Ok(Wad::from_raw(i128::from(capped) * WAD / i128::from(t_max)))
}

/// Square root of a non-negative wad, rounded down.
fn wad_sqrt(value: Wad) -> Result<Wad> {
    if !value.is_positive() {
        return Ok(Wad::ZERO);
    }
    let scaled = value
        .unsigned_abs()
        .checked_mul(WAD.unsigned_abs())
        .ok_or(IrsError::Overflow("wad square root"))?;
    let root = i128::try_from(scaled.integer_sqrt())
        .map_err(|_| IrsError::Overflow("wad square root"))?;
    Ok(Wad::from_raw(root))
}

/// Lower and upper APY bounds, converted to percent.
fn apy_band(
    params: &MarginCalculatorParameters,
    apy: Wad,
    tau: Wad,
    mode: MarginMode,
) -> Result<(Wad, Wad)> {
    let (upper_base, lower_base, min_delta) = match mode {
        MarginMode::Initial => (
            apy.safe_mul(&params.apy_upper_multiplier, Rounding::Up)?,
            apy.safe_mul(&params.apy_lower_multiplier, Rounding::Down)?,
            params.min_delta_im,
        ),
        MarginMode::Liquidation => (apy, apy, params.min_delta_lm),
    };

    let variance = params
        .alpha
        .safe_add(&params.beta.safe_mul(&apy, Rounding::Up)?)?
        .safe_mul(&params.sigma_squared, Rounding::Up)?
        .safe_mul(&tau, Rounding::Up)?;
    let confidence = wad_sqrt(variance)?;

    let upper = upper_base
        .safe_add(&params.xi_upper.safe_mul(&confidence, Rounding::Up)?)?
        .max(apy.safe_add(&min_delta)?);
    let lower = lower_base
        .safe_sub(&params.xi_lower.safe_mul(&confidence, Rounding::Up)?)?
        .min(apy.safe_sub(&min_delta)?)
        .clamp_non_negative();

    let hundred = Wad::from_integer(100);
    Ok((
        lower.safe_mul(&hundred, Rounding::Down)?,
        upper.safe_mul(&hundred, Rounding::Up)?,
    ))
}

fn unwind_rates(
    rate: Wad,
    band: (Wad, Wad),
    tau: Wad,
    params: &MarginCalculatorParameters,
    mode: MarginMode,
) -> Result<UnwindRates> {
    let (mul_left, mul_right, min_left, min_right) = match mode {
        MarginMode::Initial => (
            params.dev_mul_left_unwind_im,
            params.dev_mul_right_unwind_im,
            params.fixed_rate_deviation_min_left_unwind_im,
            params.fixed_rate_deviation_min_right_unwind_im,
        ),
        MarginMode::Liquidation => (
            params.dev_mul_left_unwind_lm,
            params.dev_mul_right_unwind_lm,
            params.fixed_rate_deviation_min_left_unwind_lm,
            params.fixed_rate_deviation_min_right_unwind_lm,
        ),
    };
    let deviation = |mul: &Wad, floor: Wad| -> Result<Wad> {
        Ok(rate
            .safe_mul(mul, Rounding::Up)?
            .safe_mul(&tau, Rounding::Up)?
            .max(floor))
    };
    let left = rate
        .safe_sub(&deviation(&mul_left, min_left)?)?
        .min(band.0)
        .clamp_non_negative();
    let right = rate.safe_add(&deviation(&mul_right, min_right)?)?.max(band.1);
    Ok(UnwindRates { left, right })
}

/// Worst loss of `(fixed, variable)` over the two stressed rates.
#[allow(clippy::too_many_arguments)]
fn unwind_loss(
    fixed: Wad,
    variable: Wad,
    rate: Wad,
    band: (Wad, Wad),
    tau: Wad,
    params: &MarginCalculatorParameters,
    rates: &RateStatistics,
    market: &MarketSnapshot,
    mode: MarginMode,
) -> Result<Wad> {
    let stressed = unwind_rates(rate, band, tau, params, mode)?;
    let years = seconds_to_years(market.term.seconds_to_maturity(market.now));
    let known = fixed
        .safe_mul(&fixed_factor(market.term.duration()), Rounding::Down)?
        .safe_add(&variable.safe_mul(&rates.accrued_variable_factor, Rounding::Down)?)?;

    let loss_at = |percent: Wad| -> Result<Wad> {
        let future = variable
            .safe_mul(&percent, Rounding::Down)?
            .safe_mul(&years, Rounding::Down)?
            .safe_div(&Wad::from_integer(100), Rounding::Down)?;
        let cashflow = known.safe_add(&future)?;
        if cashflow.is_negative() {
            negate(cashflow)
        } else {
            Ok(Wad::ZERO)
        }
    };
    Ok(loss_at(stressed.left)?.max(loss_at(stressed.right)?))
}

/// Balances the LP would hold after the price travelled to `edge`.
fn exposure_at(
    position: &PositionSnapshot,
    edge: SqrtPriceX96,
    rates: &RateStatistics,
    market: &MarketSnapshot,
) -> Result<(Wad, Wad)> {
    let lower = tick_to_sqrt_price(position.range.lower())?;
    let upper = tick_to_sqrt_price(position.range.upper())?;
    // Only the part of the path inside the range is absorbed.
    let start = market.sqrt_price.clamp(lower, upper);
    let end = edge.clamp(lower, upper);

    let traded = amounts_for_price_move(start, end, position.liquidity, FeeTerms::ZERO)?;
    let lp_fixed = negate(traded.fixed_token_delta)?;
    let lp_variable = negate(traded.variable_token_delta)?;
    let lp_fixed = balanced_fixed_tokens(
        lp_fixed,
        lp_variable,
        rates.accrued_variable_factor,
        market.term.seconds_elapsed(market.now),
        market.term.duration(),
    )?;
    Ok((
        position.fixed_token_balance.safe_add(&lp_fixed)?,
        position.variable_token_balance.safe_add(&lp_variable)?,
    ))
}

fn negate(value: Wad) -> Result<Wad> {
    value
        .checked_neg()
        .ok_or(IrsError::Overflow("wad negation"))
}
