//! Convenience re-exports for common types and traits.
//!
//! ```rust
//! use irs_amm::prelude::*;
//! ```

pub use crate::domain::{
    Address, SqrtPriceX96, SwapOutcome, SwapParams, TakerSide, TermWindow, Tick, TickRange,
    Timestamp, Wad,
};

pub use crate::traits::{FromConfig, RateOracle, SettlementToken, Transfer};

pub use crate::math::CheckedArithmetic;

pub use crate::config::{
    InstanceConfig, InstanceKey, MarginCalculatorParameters, MarginEngineConfig, VammConfig,
};

pub use crate::error::{IrsError, Result};

pub use crate::calculator::MarginMode;
pub use crate::events::IrsEvent;
pub use crate::factory::{InstanceId, Registry};
pub use crate::instance::{CallContext, IrsInstance};
pub use crate::periphery::{MintOrBurnParams, Router, SwapQuote};
