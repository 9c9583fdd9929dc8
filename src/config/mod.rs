//! Instance configuration structs.
//!
//! [`InstanceConfig`] is the declarative blueprint for deploying an
//! instance.  It nests the per-component configs: [`VammConfig`] for the
//! curve, [`MarginEngineConfig`] for the ledger and
//! [`MarginCalculatorParameters`] for the risk model.

mod calculator;
mod instance;
mod margin_engine;
mod vamm;

pub use calculator::MarginCalculatorParameters;
pub use instance::{InstanceConfig, InstanceKey};
pub use margin_engine::MarginEngineConfig;
pub use vamm::VammConfig;
