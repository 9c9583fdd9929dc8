//! Events emitted by committed calls.
//!
//! Events are staged alongside the state they describe and published
//! (appended to the journal and logged at `info`) only when the call
//! commits, so a rolled-back call leaves no trace.

use core::fmt;

use crate::config::InstanceKey;
use crate::domain::{Address, SqrtPriceX96, TakerSide, Tick, TickRange, Wad};

/// Something that happened to an instance or the router.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IrsEvent {
    VammInitialized {
        sqrt_price: SqrtPriceX96,
        tick: Tick,
    },
    PositionMinted {
        sender: Address,
        owner: Address,
        range: TickRange,
        liquidity: u128,
    },
    PositionBurned {
        sender: Address,
        owner: Address,
        range: TickRange,
        liquidity: u128,
    },
    SwapExecuted {
        sender: Address,
        recipient: Address,
        range: TickRange,
        side: TakerSide,
        notional: Wad,
        fixed_token_delta: Wad,
        variable_token_delta: Wad,
        fixed_token_delta_unbalanced: Wad,
        fee: Wad,
        tick_after: Tick,
    },
    MarginUpdated {
        sender: Address,
        owner: Address,
        range: TickRange,
        margin_delta: Wad,
        margin: Wad,
    },
    PositionLiquidated {
        liquidator: Address,
        owner: Address,
        range: TickRange,
        notional_unwound: Wad,
        liquidator_reward: Wad,
    },
    PositionSettled {
        owner: Address,
        range: TickRange,
        settlement_cashflow: Wad,
    },
    /// Alpha gate toggled.
    IsAlpha {
        is_alpha: bool,
    },
    PeripheryUpdated {
        periphery: Option<Address>,
    },
    ParametersUpdated {
        version: u32,
    },
    ProtocolFeesCollected {
        recipient: Address,
        amount: Wad,
    },
    /// Router-level LP notional cap changed.
    NotionalCapUpdated {
        instance: InstanceKey,
        cap: Wad,
    },
}

impl IrsEvent {
    /// Short name used as the log message field.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::VammInitialized { .. } => "vamm_initialized",
            Self::PositionMinted { .. } => "mint",
            Self::PositionBurned { .. } => "burn",
            Self::SwapExecuted { .. } => "swap",
            Self::MarginUpdated { .. } => "position_margin_update",
            Self::PositionLiquidated { .. } => "position_liquidation",
            Self::PositionSettled { .. } => "position_settlement",
            Self::IsAlpha { .. } => "is_alpha",
            Self::PeripheryUpdated { .. } => "periphery_updated",
            Self::ParametersUpdated { .. } => "parameters_updated",
            Self::ProtocolFeesCollected { .. } => "protocol_fees_collected",
            Self::NotionalCapUpdated { .. } => "notional_cap",
        }
    }
}

impl fmt::Display for IrsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Publishes committed events.
pub(crate) fn publish(journal: &mut Vec<IrsEvent>, staged: Vec<IrsEvent>) {
    for event in staged {
        tracing::info!(event = event.name(), details = ?event, "event");
        journal.push(event);
    }
}
