//! Conversions between fixed/variable token balances and cash flows.
//!
//! Fixed tokens accrue at 1% a year per token: a balance of `F` fixed
//! tokens held for `s` seconds is worth `F * s / (SECONDS_PER_YEAR * 100)`.
//! Variable tokens accrue the realised variable rate reported by the
//! oracle over the same window.
//!
//! A swap executed mid-term has already missed part of the term's
//! cash flow.  [`balanced_fixed_tokens`] rescales the fixed leg so that
//! settling the position at maturity only pays the legs from the swap
//! onwards.

use super::checked::CheckedArithmetic;
use crate::domain::{Rounding, Wad, SECONDS_PER_YEAR, WAD};
use crate::error::{IrsError, Result};

/// Accrual factor of one fixed token over `seconds`.
///
/// ```
/// use irs_amm::domain::{Wad, SECONDS_PER_YEAR};
/// use irs_amm::math::fixed_factor;
///
/// // One fixed token held a full year pays 1%.
/// assert_eq!(fixed_factor(SECONDS_PER_YEAR), Wad::from_raw(10_000_000_000_000_000));
/// ```
#[must_use]
pub const fn fixed_factor(seconds: u64) -> Wad {
    Wad::from_raw(seconds as i128 * WAD / (SECONDS_PER_YEAR as i128 * 100))
}

/// Fixed-token balance that neutralises the cash flow already accrued
/// between term start and the swap.
///
/// `amount_fixed` and `amount_variable` are the raw swap legs;
/// `accrued_variable_factor` is the oracle's variable rate from term start
/// to now.
///
/// # Errors
///
/// - [`IrsError::InvalidConfiguration`] if `term_seconds` is zero.
/// - Arithmetic errors on overflow.
pub fn balanced_fixed_tokens(
    amount_fixed: Wad,
    amount_variable: Wad,
    accrued_variable_factor: Wad,
    elapsed_seconds: u64,
    term_seconds: u64,
) -> Result<Wad> {
    if term_seconds == 0 {
        return Err(IrsError::InvalidConfiguration("term has zero length"));
    }
    let excess = amount_fixed
        .safe_mul(&fixed_factor(elapsed_seconds), Rounding::Down)?
        .safe_add(&amount_variable.safe_mul(&accrued_variable_factor, Rounding::Down)?)?;
    let correction = excess.safe_div(&fixed_factor(term_seconds), Rounding::Up)?;
    amount_fixed.safe_sub(&correction)
}

/// Net cash flow of a position's balances over a window.
///
/// `fixed * fixed_factor(seconds) + variable * variable_factor`, rounded
/// down so the holder never receives more than accrued.
///
/// # Errors
///
/// Arithmetic errors on overflow.
pub fn settlement_cashflow(
    fixed_token_balance: Wad,
    variable_token_balance: Wad,
    seconds: u64,
    variable_factor: Wad,
) -> Result<Wad> {
    fixed_token_balance
        .safe_mul(&fixed_factor(seconds), Rounding::Down)?
        .safe_add(&variable_token_balance.safe_mul(&variable_factor, Rounding::Down)?)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const YEAR: u64 = SECONDS_PER_YEAR;

    #[test]
    fn fixed_factor_is_linear() {
        assert_eq!(fixed_factor(0), Wad::ZERO);
        assert_eq!(
            fixed_factor(YEAR / 2),
            Wad::from_raw(5_000_000_000_000_000)
        );
    }

    #[test]
    fn balancing_at_term_start_is_identity() {
        let f = Wad::from_integer(-100);
        let v = Wad::from_integer(100);
        assert_eq!(balanced_fixed_tokens(f, v, Wad::ZERO, 0, YEAR), Ok(f));
    }

    #[test]
    fn balanced_position_settles_only_future_legs() {
        // Variable taker at 1% fixed, halfway through a one-year term,
        // while the variable index has already accrued 2%.
        let f = Wad::from_integer(-100);
        let v = Wad::from_integer(100);
        let accrued = Wad::from_raw(20_000_000_000_000_000);
        let Ok(balanced) = balanced_fixed_tokens(f, v, accrued, YEAR / 2, YEAR) else {
            panic!("expected Ok");
        };
        // Excess = -100 * 0.005 + 100 * 0.02 = 1.5; correction = 150.
        assert_eq!(balanced, Wad::from_integer(-250));

        // Over the full term the variable leg realises 3%: 2% already
        // accrued and 1% after the swap.
        let total = Wad::from_raw(30_000_000_000_000_000);
        let Ok(cf) = settlement_cashflow(balanced, v, YEAR, total) else {
            panic!("expected Ok");
        };
        // Future legs only: -100 * 0.005 + 100 * 0.01 = 0.5.
        assert_eq!(cf, Wad::from_raw(500_000_000_000_000_000));
    }

    #[test]
    fn zero_term_is_rejected() {
        assert!(matches!(
            balanced_fixed_tokens(Wad::ONE, Wad::ONE, Wad::ZERO, 0, 0),
            Err(IrsError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn settlement_signs() {
        // A fixed payer gains when the variable rate beats the fixed rate.
        let Ok(cf) = settlement_cashflow(
            Wad::from_integer(-100),
            Wad::from_integer(100),
            YEAR,
            Wad::from_raw(20_000_000_000_000_000),
        ) else {
            panic!("expected Ok");
        };
        assert_eq!(cf, Wad::ONE);
    }
}
