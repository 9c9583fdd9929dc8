//! Outcome of a VAMM swap, from the trader's point of view.

use super::{SqrtPriceX96, Tick, Wad};

/// Deltas realised by a swap, signed from the trader's perspective.
///
/// A fixed taker ends with a positive fixed delta and a negative variable
/// delta; a variable taker the reverse.  The liquidity providers whose
/// ranges were traversed hold exactly the opposite deltas, distributed
/// through the growth accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapOutcome {
    fixed_token_delta: Wad,
    variable_token_delta: Wad,
    fixed_token_delta_unbalanced: Wad,
    fee: Wad,
    tick_after: Tick,
    sqrt_price_after: SqrtPriceX96,
    price_limit_reached: bool,
}

impl SwapOutcome {
    pub(crate) const fn new(
        fixed_token_delta: Wad,
        variable_token_delta: Wad,
        fixed_token_delta_unbalanced: Wad,
        fee: Wad,
        tick_after: Tick,
        sqrt_price_after: SqrtPriceX96,
        price_limit_reached: bool,
    ) -> Self {
        Self {
            fixed_token_delta,
            variable_token_delta,
            fixed_token_delta_unbalanced,
            fee,
            tick_after,
            sqrt_price_after,
            price_limit_reached,
        }
    }

    /// Fixed-token delta after balancing against accrued variable interest.
    pub const fn fixed_token_delta(&self) -> Wad {
        self.fixed_token_delta
    }

    /// Variable-token delta.
    pub const fn variable_token_delta(&self) -> Wad {
        self.variable_token_delta
    }

    /// Raw fixed-token delta as moved along the curve.
    pub const fn fixed_token_delta_unbalanced(&self) -> Wad {
        self.fixed_token_delta_unbalanced
    }

    /// Total fee charged to the trader, including the protocol share.
    pub const fn fee(&self) -> Wad {
        self.fee
    }

    /// Current tick after the swap.
    #[must_use]
    pub const fn tick_after(&self) -> Tick {
        self.tick_after
    }

    /// Current sqrt price after the swap.
    #[must_use]
    pub const fn sqrt_price_after(&self) -> SqrtPriceX96 {
        self.sqrt_price_after
    }

    /// `true` if the swap stopped at its price limit with notional left over.
    #[must_use]
    pub const fn price_limit_reached(&self) -> bool {
        self.price_limit_reached
    }
}
