//! Periphery in front of the instances.
//!
//! The [`Router`] is what end users talk to: it quotes swaps and
//! liquidity changes, caps how much LP notional an instance takes, and
//! combines margin deposits with the trade that needs them.  Every router
//! call is still a single all-or-nothing call on one instance.

mod router;

pub use router::{MintOrBurnParams, Router, SwapQuote};
