//! Top-level instance blueprint.
//!
//! [`InstanceConfig`] fully describes one (VAMM, margin engine) pair.  The
//! [`Registry`](crate::factory::Registry) validates it, derives its
//! [`InstanceKey`] and refuses to deploy a second instance under the same
//! key.

use core::fmt;

use super::{MarginCalculatorParameters, MarginEngineConfig, VammConfig};
use crate::domain::{Address, Timestamp};
use crate::error::IrsError;

/// Identity of an instance: what it trades, against which oracle, over
/// which term and on which tick grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceKey {
    pub underlying: Address,
    pub oracle: Address,
    pub term_start: Timestamp,
    pub term_end: Timestamp,
    pub tick_spacing: u32,
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} [{}, {}] spacing {}",
            self.underlying, self.oracle, self.term_start, self.term_end, self.tick_spacing
        )
    }
}

/// Declarative blueprint for an [`IrsInstance`](crate::instance::IrsInstance).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceConfig {
    owner: Address,
    escrow: Address,
    underlying: Address,
    oracle: Address,
    vamm: VammConfig,
    margin_engine: MarginEngineConfig,
    parameters: MarginCalculatorParameters,
}

impl InstanceConfig {
    /// Creates a new `InstanceConfig`.
    ///
    /// # Errors
    ///
    /// - [`IrsError::InvalidConfiguration`] if the owner or the escrow is
    ///   the zero address.
    /// - Any error from the nested configs' `validate()`.
    pub fn new(
        owner: Address,
        escrow: Address,
        underlying: Address,
        oracle: Address,
        vamm: VammConfig,
        margin_engine: MarginEngineConfig,
        parameters: MarginCalculatorParameters,
    ) -> Result<Self, IrsError> {
        let config = Self {
            owner,
            escrow,
            underlying,
            oracle,
            vamm,
            margin_engine,
            parameters,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates this config and every nested config.
    ///
    /// # Errors
    ///
    /// See [`InstanceConfig::new`].
    pub fn validate(&self) -> Result<(), IrsError> {
        if self.owner.is_zero() {
            return Err(IrsError::InvalidConfiguration(
                "instance owner must not be the zero address",
            ));
        }
        if self.escrow.is_zero() {
            return Err(IrsError::InvalidConfiguration(
                "instance escrow must not be the zero address",
            ));
        }
        self.vamm.validate()?;
        self.margin_engine.validate()?;
        self.parameters.validate()
    }

    /// Registry key of the instance.
    #[must_use]
    pub const fn key(&self) -> InstanceKey {
        InstanceKey {
            underlying: self.underlying,
            oracle: self.oracle,
            term_start: self.vamm.term().start(),
            term_end: self.vamm.term().end(),
            tick_spacing: self.vamm.tick_spacing(),
        }
    }

    /// Returns the owner.
    #[must_use]
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// Returns the account holding the instance's settlement tokens.
    #[must_use]
    pub const fn escrow(&self) -> Address {
        self.escrow
    }

    /// Returns the underlying asset.
    #[must_use]
    pub const fn underlying(&self) -> Address {
        self.underlying
    }

    /// Returns the rate oracle identity.
    #[must_use]
    pub const fn oracle(&self) -> Address {
        self.oracle
    }

    /// Returns the VAMM config.
    #[must_use]
    pub const fn vamm(&self) -> &VammConfig {
        &self.vamm
    }

    /// Returns the margin engine config.
    #[must_use]
    pub const fn margin_engine(&self) -> &MarginEngineConfig {
        &self.margin_engine
    }

    /// Returns the initial calculator parameters.
    #[must_use]
    pub const fn parameters(&self) -> &MarginCalculatorParameters {
        &self.parameters
    }
}
