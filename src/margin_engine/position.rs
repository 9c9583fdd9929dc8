//! Positions held in the margin engine.

use core::fmt;

use crate::calculator::PositionSnapshot;
use crate::domain::{Address, TickRange, Wad};
use crate::vamm::Growth;

/// Identity of a position within one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionKey {
    pub owner: Address,
    pub range: TickRange,
}

impl PositionKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(owner: Address, range: TickRange) -> Self {
        Self { owner, range }
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.owner, self.range)
    }
}

/// Margin, token balances and liquidity of one `(owner, range)`.
///
/// Balances are signed from the holder's side: a positive variable
/// balance receives the variable rate, a positive fixed balance receives
/// 1% a year per token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub(super) liquidity: u128,
    pub(super) margin: Wad,
    pub(super) fixed_token_balance: Wad,
    pub(super) variable_token_balance: Wad,
    pub(super) growth_inside_last: Growth,
    pub(super) accumulated_fees: Wad,
    pub(super) is_settled: bool,
    pub(super) parameters_version: u32,
}

impl Position {
    #[must_use]
    pub const fn liquidity(&self) -> u128 {
        self.liquidity
    }

    #[must_use]
    pub const fn margin(&self) -> Wad {
        self.margin
    }

    #[must_use]
    pub const fn fixed_token_balance(&self) -> Wad {
        self.fixed_token_balance
    }

    #[must_use]
    pub const fn variable_token_balance(&self) -> Wad {
        self.variable_token_balance
    }

    /// Growth inside the range when the balances were last updated.
    #[must_use]
    pub const fn growth_inside_last(&self) -> Growth {
        self.growth_inside_last
    }

    /// Fees earned as an LP over the position's life.
    #[must_use]
    pub const fn accumulated_fees(&self) -> Wad {
        self.accumulated_fees
    }

    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.is_settled
    }

    /// Calculator parameter version the position is pinned to.
    #[must_use]
    pub const fn parameters_version(&self) -> u32 {
        self.parameters_version
    }

    /// `true` once nothing is left to account for.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.liquidity == 0
            && self.margin.is_zero()
            && self.fixed_token_balance.is_zero()
            && self.variable_token_balance.is_zero()
    }

    /// Exposure handed to the margin calculator.
    #[must_use]
    pub const fn snapshot(&self, range: TickRange) -> PositionSnapshot {
        PositionSnapshot {
            range,
            liquidity: self.liquidity,
            fixed_token_balance: self.fixed_token_balance,
            variable_token_balance: self.variable_token_balance,
        }
    }
}
