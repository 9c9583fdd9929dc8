//! Fundamental value types of the interest-rate-swap domain.
//!
//! Ticks, tick ranges, sqrt prices, fixed-point amounts, timestamps and
//! swap requests/outcomes.  All types are newtypes with validated
//! constructors so that an invalid value cannot be named.

mod address;
mod rounding;
mod sqrt_price;
mod swap_params;
mod swap_result;
mod term;
mod tick;
mod tick_range;
mod wad;

pub use address::Address;
pub use rounding::Rounding;
pub use sqrt_price::{SqrtPriceX96, Q96};
pub use swap_params::{SwapParams, TakerSide};
pub use swap_result::SwapOutcome;
pub use term::{seconds_to_years, TermWindow, Timestamp, SECONDS_PER_YEAR};
pub use tick::{Tick, MAX_TICK, MIN_TICK};
pub use tick_range::TickRange;
pub use wad::{Wad, WAD};
