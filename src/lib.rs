//! # IRS AMM
//!
//! Interest-rate-swap automated market maker: liquidity providers supply
//! concentrated liquidity over fixed-rate tick ranges, traders swap
//! fixed-for-variable cash flows against it, and a margin engine keeps
//! every position collateralised until maturity.
//!
//! # Quick Start
//!
//! ```rust
//! use irs_amm::config::{InstanceConfig, MarginCalculatorParameters, MarginEngineConfig, VammConfig};
//! use irs_amm::domain::{Address, SqrtPriceX96, TermWindow, TickRange, Timestamp, Wad};
//! use irs_amm::factory::Registry;
//! use irs_amm::instance::CallContext;
//! use irs_amm::oracle::RingBufferRateOracle;
//! use irs_amm::token::InMemorySettlementToken;
//!
//! let owner = Address::repeat(1);
//! let lp = Address::repeat(10);
//!
//! // 1. Describe and deploy an instance for a one-year term
//! let term = TermWindow::new(Timestamp::new(3_600), Timestamp::new(3_600 + 31_536_000))
//!     .expect("valid term");
//! let config = InstanceConfig::new(
//!     owner,
//!     Address::repeat(9),
//!     Address::repeat(2),
//!     Address::repeat(3),
//!     VammConfig::new(60, Wad::ZERO, 0, term).expect("valid vamm config"),
//!     MarginEngineConfig::new(3_600, 0).expect("valid engine config"),
//!     MarginCalculatorParameters::default(),
//! )
//! .expect("valid config");
//! let mut registry = Registry::default();
//! let id = registry.deploy(&config).expect("deployed");
//! let instance = registry.instance_mut(id).expect("known id");
//!
//! // 2. Collaborators: a rate oracle and a settlement token
//! let mut oracle = RingBufferRateOracle::new(Timestamp::new(0), Wad::ONE).expect("oracle");
//! oracle.grow(8);
//! oracle
//!     .write(Timestamp::new(100_000_000), Wad::from_raw(1_100_000_000_000_000_000))
//!     .expect("observation");
//! let mut token = InMemorySettlementToken::default();
//! token.mint(lp, Wad::from_integer(1_000)).expect("funded");
//!
//! // 3. Open the market, deposit margin and provide liquidity
//! let now = Timestamp::new(3_600);
//! let mut ctx = CallContext { caller: owner, now, oracle: &oracle, token: &mut token };
//! instance.initialize_vamm(&mut ctx, SqrtPriceX96::ONE).expect("initialized");
//!
//! let range = TickRange::new(-600, 600, 60).expect("valid range");
//! let mut ctx = CallContext { caller: lp, now, oracle: &oracle, token: &mut token };
//! instance
//!     .update_position_margin(&mut ctx, lp, range, Wad::from_integer(1_000))
//!     .expect("deposit");
//! instance.mint(&mut ctx, lp, range, 1_000_000_000_000_000_000).expect("mint");
//!
//! assert_eq!(instance.vamm().liquidity(), 1_000_000_000_000_000_000);
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Router     │  notional caps, quotes, deposit + trade bundles
//! └──────┬──────┘
//!        │ staged operations inside one transaction
//!        ▼
//! ┌─────────────┐
//! │  Instance    │  all-or-nothing calls, events, transfer batches
//! └──┬───────┬──┘
//!    │       │
//!    ▼       ▼
//! ┌──────┐ ┌──────────────┐
//! │ VAMM │ │ Margin engine │──▶ Margin calculator
//! └──────┘ └──────────────┘
//! ```
//!
//! # Module Guide
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`domain`] | Value types: [`Wad`](domain::Wad), [`Tick`](domain::Tick), [`SqrtPriceX96`](domain::SqrtPriceX96), [`TickRange`](domain::TickRange), etc. |
//! | [`math`] | Tick math, sqrt-price amounts, swap steps, full-precision mul-div |
//! | [`vamm`] | Curve state, tick ledger and swap loop |
//! | [`margin_engine`] | Positions, margin and versioned calculator parameters |
//! | [`calculator`] | Initial and liquidation margin requirements |
//! | [`instance`] | [`IrsInstance`](instance::IrsInstance): the transactional entry point |
//! | [`periphery`] | [`Router`](periphery::Router) with caps and quotes |
//! | [`factory`] | [`Registry`](factory::Registry) of deployed instances |
//! | [`oracle`] | Ring-buffer [`RateOracle`](traits::RateOracle) |
//! | [`token`] | In-memory [`SettlementToken`](traits::SettlementToken) |
//! | [`events`] | [`IrsEvent`](events::IrsEvent) journal entries |
//! | [`config`] | Validated configuration structs |
//! | [`error`] | [`IrsError`](error::IrsError) unified error enum |
//! | [`prelude`] | Convenience re-exports for common types and traits |

pub mod calculator;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod factory;
pub mod instance;
pub mod margin_engine;
pub mod math;
pub mod oracle;
pub mod periphery;
pub mod prelude;
pub mod token;
pub mod traits;
pub mod vamm;

#[cfg(test)]
#[allow(clippy::panic)]
mod proptest_properties;
