//! Validated swap request.

use super::{Address, SqrtPriceX96, TickRange, Wad};
use crate::error::IrsError;

/// Which side of the swap the trader takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TakerSide {
    /// Receives fixed, pays variable.  Pushes the price up and the fixed
    /// rate down.
    FixedTaker,
    /// Pays fixed, receives variable.  Pushes the price down and the fixed
    /// rate up.
    VariableTaker,
}

impl TakerSide {
    /// Returns `true` for [`TakerSide::FixedTaker`].
    #[must_use]
    pub const fn is_fixed_taker(&self) -> bool {
        matches!(self, Self::FixedTaker)
    }

    /// The side that closes this one.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::FixedTaker => Self::VariableTaker,
            Self::VariableTaker => Self::FixedTaker,
        }
    }
}

/// A swap request against one instance.
///
/// The trader's exposure is booked on the position
/// `(recipient, range)`.  `notional` is measured in variable tokens.
///
/// # Examples
///
/// ```
/// use irs_amm::domain::{Address, SqrtPriceX96, SwapParams, TakerSide, TickRange, Wad};
///
/// let range = TickRange::new(-60, 60, 60).expect("valid range");
/// let params = SwapParams::new(
///     Address::repeat(7),
///     TakerSide::VariableTaker,
///     Wad::from_integer(10),
///     None,
///     range,
/// );
/// assert!(params.is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwapParams {
    recipient: Address,
    side: TakerSide,
    notional: Wad,
    sqrt_price_limit: Option<SqrtPriceX96>,
    range: TickRange,
}

impl SwapParams {
    /// Creates a swap request.
    ///
    /// A `sqrt_price_limit` of `None` lets the swap run to the edge of the
    /// tick grid.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::ZeroNotional`] if `notional` is not positive.
    pub const fn new(
        recipient: Address,
        side: TakerSide,
        notional: Wad,
        sqrt_price_limit: Option<SqrtPriceX96>,
        range: TickRange,
    ) -> crate::error::Result<Self> {
        if !notional.is_positive() {
            return Err(IrsError::ZeroNotional);
        }
        Ok(Self {
            recipient,
            side,
            notional,
            sqrt_price_limit,
            range,
        })
    }

    /// Owner of the position the exposure is booked on.
    #[must_use]
    pub const fn recipient(&self) -> Address {
        self.recipient
    }

    /// Taker side.
    #[must_use]
    pub const fn side(&self) -> TakerSide {
        self.side
    }

    /// Notional in variable tokens.
    pub const fn notional(&self) -> Wad {
        self.notional
    }

    /// Optional sqrt price limit.
    #[must_use]
    pub const fn sqrt_price_limit(&self) -> Option<SqrtPriceX96> {
        self.sqrt_price_limit
    }

    /// Range of the position the exposure is booked on.
    #[must_use]
    pub const fn range(&self) -> TickRange {
        self.range
    }
}
