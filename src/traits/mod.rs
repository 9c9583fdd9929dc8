//! Seams between the core and its collaborators.
//!
//! - [`RateOracle`]: realised variable rates and observed APY.
//! - [`SettlementToken`]: the only place tokens move, after commit.
//! - [`FromConfig`]: configuration-driven construction.

mod from_config;
mod rate_oracle;
mod settlement_token;

pub use from_config::FromConfig;
pub use rate_oracle::RateOracle;
pub use settlement_token::{SettlementToken, Transfer};
