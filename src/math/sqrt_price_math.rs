//! Token amounts moved by a sqrt-price change at constant liquidity.
//!
//! Within one tick interval the curve behaves like a constant-product pool
//! parameterised by `L` and `sqrt(P)`:
//!
//! - fixed tokens (token 0): `L * (1/sqrt(a) - 1/sqrt(b))`
//! - variable tokens (token 1): `L * (sqrt(b) - sqrt(a))`
//!
//! Every function takes an explicit [`Rounding`]; callers round amounts
//! the trader receives down and amounts the trader pays up.

use primitive_types::U256;

use super::full_math::{mul_div, to_u128};
use crate::domain::{Rounding, SqrtPriceX96, Wad, Q96, WAD};
use crate::error::{IrsError, Result};

fn ordered(a: SqrtPriceX96, b: SqrtPriceX96) -> (u128, u128) {
    if a.get() <= b.get() {
        (a.get(), b.get())
    } else {
        (b.get(), a.get())
    }
}

/// Fixed-token amount between two sqrt prices.
///
/// # Errors
///
/// Returns [`IrsError::Overflow`] if the amount exceeds `u128`.
pub fn fixed_amount_delta(
    a: SqrtPriceX96,
    b: SqrtPriceX96,
    liquidity: u128,
    rounding: Rounding,
) -> Result<u128> {
    let (lower, upper) = ordered(a, b);
    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = U256::from(upper - lower);
    let upper = U256::from(upper);
    let lower = U256::from(lower);

    let amount = match rounding {
        Rounding::Up => {
            let partial = mul_div(numerator1, numerator2, upper, Rounding::Up)?;
            let (q, r) = partial.div_mod(lower);
            if r.is_zero() {
                q
            } else {
                q + U256::one()
            }
        }
        Rounding::Down => mul_div(numerator1, numerator2, upper, Rounding::Down)? / lower,
    };
    to_u128(amount, "fixed token amount exceeds 128 bits")
}

/// Variable-token amount between two sqrt prices.
///
/// # Errors
///
/// Returns [`IrsError::Overflow`] if the amount exceeds `u128`.
pub fn variable_amount_delta(
    a: SqrtPriceX96,
    b: SqrtPriceX96,
    liquidity: u128,
    rounding: Rounding,
) -> Result<u128> {
    let (lower, upper) = ordered(a, b);
    let amount = mul_div(
        U256::from(liquidity),
        U256::from(upper - lower),
        U256::from(Q96),
        rounding,
    )?;
    to_u128(amount, "variable token amount exceeds 128 bits")
}

/// Price after a trader pays `amount` variable tokens in (price rises).
///
/// Rounds the new price down, so the trader moves the price slightly less
/// than the amount paid would allow.
///
/// # Errors
///
/// - [`IrsError::DivisionByZero`] if `liquidity` is zero.
/// - [`IrsError::Overflow`] if the new price exceeds `u128`.
pub fn next_sqrt_price_from_variable_in(
    sqrt_price: SqrtPriceX96,
    liquidity: u128,
    amount: u128,
) -> Result<SqrtPriceX96> {
    let quotient = mul_div(
        U256::from(amount),
        U256::from(Q96),
        U256::from(liquidity),
        Rounding::Down,
    )?;
    let next = U256::from(sqrt_price.get())
        .checked_add(quotient)
        .ok_or(IrsError::Overflow("next sqrt price"))?;
    SqrtPriceX96::new(to_u128(next, "next sqrt price exceeds 128 bits")?)
}

/// Price after a trader receives `amount` variable tokens out (price falls).
///
/// Rounds the new price down, so the trader pays slightly more fixed
/// tokens than the exact curve would charge.
///
/// # Errors
///
/// - [`IrsError::DivisionByZero`] if `liquidity` is zero.
/// - [`IrsError::InvariantViolation`] if the range cannot supply `amount`.
pub fn next_sqrt_price_from_variable_out(
    sqrt_price: SqrtPriceX96,
    liquidity: u128,
    amount: u128,
) -> Result<SqrtPriceX96> {
    let quotient = mul_div(
        U256::from(amount),
        U256::from(Q96),
        U256::from(liquidity),
        Rounding::Up,
    )?;
    let current = U256::from(sqrt_price.get());
    if current <= quotient {
        return Err(IrsError::InvariantViolation(
            "variable amount out exceeds range capacity",
        ));
    }
    SqrtPriceX96::new(to_u128(current - quotient, "next sqrt price exceeds 128 bits")?)
}

/// Liquidity whose variable-token content over `[a, b]` is `amount`.
///
/// Used by the router to turn a notional into a liquidity amount.  Rounds
/// down.
///
/// # Errors
///
/// - [`IrsError::DivisionByZero`] if `a == b`.
/// - [`IrsError::Overflow`] if the liquidity exceeds `u128`.
pub fn liquidity_for_variable_amount(
    a: SqrtPriceX96,
    b: SqrtPriceX96,
    amount: u128,
) -> Result<u128> {
    let (lower, upper) = ordered(a, b);
    let liquidity = mul_div(
        U256::from(amount),
        U256::from(Q96),
        U256::from(upper - lower),
        Rounding::Down,
    )?;
    to_u128(liquidity, "liquidity exceeds 128 bits")
}

/// Fixed rate quoted at a sqrt price, in percent as a [`Wad`].
///
/// The price is `1.0001^tick`, the fixed rate is its reciprocal:
/// `2^192 / sqrt_price^2`.  At tick 0 this is exactly `1.0` (1%).
///
/// # Errors
///
/// Returns [`IrsError::Overflow`] if the rate exceeds `i128`.
pub fn fixed_rate_at(sqrt_price: SqrtPriceX96, rounding: Rounding) -> Result<Wad> {
    let p = U256::from(sqrt_price.get());
    let numerator = U256::from(WAD.unsigned_abs()) << 96;
    let rate = mul_div(numerator, U256::from(Q96), p * p, rounding)?;
    let rate = to_u128(rate, "fixed rate exceeds 128 bits")?;
    let rate = i128::try_from(rate).map_err(|_| IrsError::Overflow("fixed rate exceeds i128"))?;
    Ok(Wad::from_raw(rate))
}
