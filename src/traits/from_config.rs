//! Generic construction trait for building from configuration.
//!
//! [`FromConfig`] gives the [`Registry`](crate::factory::Registry) a
//! uniform way to construct components from their config structs.
//!
//! # Validation Contract
//!
//! Implementations **must** validate all configuration invariants during
//! construction.  A successfully constructed value is guaranteed to be in
//! a valid initial state.
//!
//! There is no blanket implementation: each type explicitly implements
//! the trait for its own config.

use crate::error::IrsError;

/// Construction from a validated configuration.
///
/// # Implementors
///
/// - `impl FromConfig<VammConfig> for Vamm`
/// - `impl FromConfig<InstanceConfig> for IrsInstance`
pub trait FromConfig<C> {
    /// Creates a new value from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::InvalidConfiguration`] (or a more specific
    /// validation variant) if the configuration is invalid.
    fn from_config(config: &C) -> Result<Self, IrsError>
    where
        Self: Sized;
}
