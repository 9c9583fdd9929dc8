//! Fixed-point arithmetic for the rate curve.
//!
//! Every function here is pure and checked: overflow is an
//! [`IrsError`](crate::error::IrsError), never a wrap, and every division
//! takes an explicit [`Rounding`](crate::domain::Rounding).
//!
//! | Module | Contents |
//! |--------|----------|
//! | `full_math` | 256/512-bit multiply-divide |
//! | `tick_math` | tick ⇄ Q64.96 sqrt price |
//! | `sqrt_price_math` | token amounts for a price move |
//! | `swap_math` | one swap step and its fee |
//! | `fixed_and_variable` | balances ⇄ cash flows |
//! | `checked` | [`CheckedArithmetic`] for domain types |

mod checked;
mod fixed_and_variable;
mod full_math;
mod sqrt_price_math;
mod swap_math;
mod tick_math;

pub use checked::CheckedArithmetic;
pub use fixed_and_variable::{balanced_fixed_tokens, fixed_factor, settlement_cashflow};
pub use full_math::{apply_sign, mul_div, mul_div_signed, mul_div_u128, to_u128};
pub use sqrt_price_math::{
    fixed_amount_delta, fixed_rate_at, liquidity_for_variable_amount,
    next_sqrt_price_from_variable_in, next_sqrt_price_from_variable_out, variable_amount_delta,
};
pub use swap_math::{
    amounts_for_price_move, compute_swap_step, to_wad, FeeTerms, PriceMoveAmounts, SwapStep,
};
pub use tick_math::{
    is_within_grid, sqrt_price_to_tick, tick_to_sqrt_price, MAX_SQRT_RATIO, MIN_SQRT_RATIO,
};
