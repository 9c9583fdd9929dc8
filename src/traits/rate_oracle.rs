//! Source of realised variable rates.
//!
//! [`RateOracle`] is the only window the ledger and the calculator have on
//! the floating leg of a swap.  Rates are returned as fractions in a
//! [`Wad`]: `0.02` means 2%.
//!
//! # Availability Contract
//!
//! An oracle that cannot answer from recorded history must return
//! [`IrsError::OracleUnavailable`](crate::error::IrsError::OracleUnavailable).
//! Implementations must never extrapolate past their newest observation or
//! before their oldest one.

use crate::domain::{Timestamp, Wad};
use crate::error::Result;

/// Historical and current variable-rate observations.
///
/// # Implementors
///
/// - [`RingBufferRateOracle`](crate::oracle::RingBufferRateOracle)
pub trait RateOracle {
    /// Variable rate realised over `[from, to]`, not annualised.
    ///
    /// # Errors
    ///
    /// - [`IrsError::OracleUnavailable`](crate::error::IrsError::OracleUnavailable)
    ///   if either end lies outside recorded history.
    /// - [`IrsError::InvalidConfiguration`](crate::error::IrsError::InvalidConfiguration)
    ///   if `from > to`.
    fn variable_rate_between(&self, from: Timestamp, to: Timestamp) -> Result<Wad>;

    /// Annualised APY observed over the oracle's lookback window ending at
    /// `now`.
    ///
    /// # Errors
    ///
    /// Returns
    /// [`IrsError::OracleUnavailable`](crate::error::IrsError::OracleUnavailable)
    /// if the window is not fully covered by recorded history.
    fn current_observed_apy(&self, now: Timestamp, lookback_seconds: u64) -> Result<Wad>;
}
