//! One step of the swap loop and the fee charged on it.
//!
//! A step moves the price from `current` towards `target` (the next
//! initialized tick or the caller's limit, whichever is nearer) until the
//! target is hit or the remaining notional is used up.  Notional is always
//! measured in variable tokens:
//!
//! - a **fixed taker** pays variable tokens in and receives fixed tokens;
//!   the price rises.
//! - a **variable taker** receives variable tokens out and pays fixed
//!   tokens; the price falls.
//!
//! The fee for a step is `variable_amount * fee_rate * years_to_maturity`.

use super::full_math::mul_div_u128;
use super::sqrt_price_math::{
    fixed_amount_delta, next_sqrt_price_from_variable_in, next_sqrt_price_from_variable_out,
    variable_amount_delta,
};
use crate::domain::{Rounding, SqrtPriceX96, Wad, WAD};
use crate::error::{IrsError, Result};

/// Fee schedule applied to every step of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeTerms {
    /// Annualised fee as a fraction of notional.
    pub fee_rate: Wad,
    /// Remaining life of the instance in years.
    pub years_to_maturity: Wad,
}

impl FeeTerms {
    /// No fee.
    pub const ZERO: Self = Self {
        fee_rate: Wad::ZERO,
        years_to_maturity: Wad::ZERO,
    };

    /// Fee owed on `variable_amount` variable tokens, rounded up.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::Overflow`] if the fee exceeds `u128`.
    pub fn fee_on(&self, variable_amount: u128) -> Result<u128> {
        let scale = WAD.unsigned_abs();
        let annual = mul_div_u128(
            variable_amount,
            self.fee_rate.clamp_non_negative().unsigned_abs(),
            scale,
            Rounding::Up,
        )?;
        mul_div_u128(
            annual,
            self.years_to_maturity.clamp_non_negative().unsigned_abs(),
            scale,
            Rounding::Up,
        )
    }
}

/// Unsigned amounts moved by one price step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapStep {
    /// Price reached by the step.
    pub sqrt_price_next: SqrtPriceX96,
    /// Fixed tokens moved.
    pub fixed_amount: u128,
    /// Variable tokens moved.  This is the notional the step consumed.
    pub variable_amount: u128,
    /// Fee charged on `variable_amount`.
    pub fee: u128,
}

/// Computes one swap step.
///
/// The direction is implied by the prices: `target < current` is a
/// variable-taker step, `target > current` a fixed-taker step.  With zero
/// liquidity the step jumps straight to `target` and moves nothing.
///
/// # Errors
///
/// Propagates arithmetic errors from the amount functions.
pub fn compute_swap_step(
    current: SqrtPriceX96,
    target: SqrtPriceX96,
    liquidity: u128,
    notional_remaining: u128,
    fees: FeeTerms,
) -> Result<SwapStep> {
    let variable_taker = target.get() <= current.get();

    let (sqrt_price_next, fixed_amount, variable_amount) = if variable_taker {
        let max_out = variable_amount_delta(target, current, liquidity, Rounding::Down)?;
        if notional_remaining >= max_out {
            let fixed_in = fixed_amount_delta(target, current, liquidity, Rounding::Up)?;
            (target, fixed_in, max_out)
        } else {
            let next =
                next_sqrt_price_from_variable_out(current, liquidity, notional_remaining)?;
            let fixed_in = fixed_amount_delta(next, current, liquidity, Rounding::Up)?;
            (next, fixed_in, notional_remaining)
        }
    } else {
        let max_in = variable_amount_delta(current, target, liquidity, Rounding::Up)?;
        if notional_remaining >= max_in {
            let fixed_out = fixed_amount_delta(current, target, liquidity, Rounding::Down)?;
            (target, fixed_out, max_in)
        } else {
            let next = next_sqrt_price_from_variable_in(current, liquidity, notional_remaining)?;
            let fixed_out = fixed_amount_delta(current, next, liquidity, Rounding::Down)?;
            (next, fixed_out, notional_remaining)
        }
    };

    if variable_amount > notional_remaining {
        return Err(IrsError::InvariantViolation("swap step overspent notional"));
    }

    Ok(SwapStep {
        sqrt_price_next,
        fixed_amount,
        variable_amount,
        fee: fees.fee_on(variable_amount)?,
    })
}

/// Signed token deltas of moving the price from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceMoveAmounts {
    /// Fixed-token delta for the trader.
    pub fixed_token_delta: Wad,
    /// Variable-token delta for the trader.
    pub variable_token_delta: Wad,
    /// Fee the trader owes for the move.
    pub fee: Wad,
}

/// Token deltas a trader realises when the price moves from `start` to
/// `end` at constant `liquidity`.
///
/// A falling price is a variable-taker move (`+variable`, `-fixed`); a
/// rising price a fixed-taker move (`-variable`, `+fixed`).  Received legs
/// round down and paid legs round up.
///
/// # Errors
///
/// Returns [`IrsError::Overflow`] if an amount does not fit in a [`Wad`].
pub fn amounts_for_price_move(
    start: SqrtPriceX96,
    end: SqrtPriceX96,
    liquidity: u128,
    fees: FeeTerms,
) -> Result<PriceMoveAmounts> {
    let falling = end.get() < start.get();
    let (fixed_rounding, variable_rounding) = if falling {
        (Rounding::Up, Rounding::Down)
    } else {
        (Rounding::Down, Rounding::Up)
    };
    let fixed = fixed_amount_delta(start, end, liquidity, fixed_rounding)?;
    let variable = variable_amount_delta(start, end, liquidity, variable_rounding)?;
    let fee = fees.fee_on(variable)?;

    let fixed = to_wad(fixed)?;
    let variable = to_wad(variable)?;
    let (fixed_token_delta, variable_token_delta) = if falling {
        (negate(fixed)?, variable)
    } else {
        (fixed, negate(variable)?)
    };
    Ok(PriceMoveAmounts {
        fixed_token_delta,
        variable_token_delta,
        fee: to_wad(fee)?,
    })
}

/// Converts a raw unsigned amount into a [`Wad`].
///
/// # Errors
///
/// Returns [`IrsError::Overflow`] if the amount exceeds `i128::MAX`.
pub fn to_wad(raw: u128) -> Result<Wad> {
    i128::try_from(raw)
        .map(Wad::from_raw)
        .map_err(|_| IrsError::Overflow("amount exceeds wad range"))
}

fn negate(value: Wad) -> Result<Wad> {
    value
        .checked_neg()
        .ok_or(IrsError::Overflow("wad negation"))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Tick;
    use crate::math::tick_to_sqrt_price;

    const L: u128 = 10_000_000_000_000_000_000_000;
    const TEN: u128 = 10_000_000_000_000_000_000;

    fn sqrt_at(v: i32) -> SqrtPriceX96 {
        let Ok(t) = Tick::new(v) else {
            panic!("valid tick");
        };
        let Ok(p) = tick_to_sqrt_price(t) else {
            panic!("valid price");
        };
        p
    }

    fn one_percent_a_year() -> FeeTerms {
        FeeTerms {
            fee_rate: Wad::from_raw(10_000_000_000_000_000),
            years_to_maturity: Wad::ONE,
        }
    }

    #[test]
    fn fee_scales_with_time() {
        let fees = FeeTerms {
            fee_rate: Wad::from_raw(10_000_000_000_000_000),
            years_to_maturity: Wad::from_raw(500_000_000_000_000_000),
        };
        assert_eq!(fees.fee_on(TEN), Ok(TEN / 200));
        assert_eq!(FeeTerms::ZERO.fee_on(TEN), Ok(0));
    }

    #[test]
    fn variable_taker_partial_step() {
        let Ok(step) = compute_swap_step(SqrtPriceX96::ONE, sqrt_at(-600), L, TEN, one_percent_a_year())
        else {
            panic!("expected Ok");
        };
        assert_eq!(step.variable_amount, TEN);
        assert!(step.sqrt_price_next < SqrtPriceX96::ONE);
        assert!(step.sqrt_price_next > sqrt_at(-600));
        assert!(step.fixed_amount > 0);
        assert_eq!(step.fee, TEN / 100);
    }

    #[test]
    fn fixed_taker_reaches_target() {
        let target = sqrt_at(1);
        let Ok(step) = compute_swap_step(SqrtPriceX96::ONE, target, L, u128::MAX / 2, FeeTerms::ZERO)
        else {
            panic!("expected Ok");
        };
        assert_eq!(step.sqrt_price_next, target);
        let Ok(expected) = variable_amount_delta(SqrtPriceX96::ONE, target, L, Rounding::Up) else {
            panic!("expected Ok");
        };
        assert_eq!(step.variable_amount, expected);
    }

    #[test]
    fn zero_liquidity_jumps_to_target() {
        let target = sqrt_at(-60);
        let Ok(step) = compute_swap_step(SqrtPriceX96::ONE, target, 0, TEN, one_percent_a_year())
        else {
            panic!("expected Ok");
        };
        assert_eq!(step.sqrt_price_next, target);
        assert_eq!(step.variable_amount, 0);
        assert_eq!(step.fixed_amount, 0);
        assert_eq!(step.fee, 0);
    }

    #[test]
    fn price_move_signs() {
        let Ok(down) = amounts_for_price_move(SqrtPriceX96::ONE, sqrt_at(-60), L, FeeTerms::ZERO)
        else {
            panic!("expected Ok");
        };
        assert!(down.variable_token_delta.is_positive());
        assert!(down.fixed_token_delta.is_negative());

        let Ok(up) = amounts_for_price_move(SqrtPriceX96::ONE, sqrt_at(60), L, one_percent_a_year())
        else {
            panic!("expected Ok");
        };
        assert!(up.variable_token_delta.is_negative());
        assert!(up.fixed_token_delta.is_positive());
        assert!(up.fee.is_positive());
    }
}
