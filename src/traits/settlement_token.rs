//! External settlement-token boundary.
//!
//! Instances never move tokens while they compute.  Every call collects
//! the [`Transfer`]s it needs, commits its internal state, and only then
//! hands the batch to a [`SettlementToken`].  If the token rejects the
//! batch the instance restores the state it had before the call.

use crate::domain::{Address, Wad};
use crate::error::Result;

/// One movement of settlement tokens between an account and an
/// instance's escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Transfer {
    /// `amount` moves from `from` into the instance.
    Deposit {
        /// Paying account.
        from: Address,
        /// Positive amount.
        amount: Wad,
    },
    /// `amount` moves from the instance to `to`.
    Payout {
        /// Receiving account.
        to: Address,
        /// Positive amount.
        amount: Wad,
    },
}

impl Transfer {
    /// Returns the transferred amount.
    #[must_use]
    pub const fn amount(&self) -> Wad {
        match self {
            Self::Deposit { amount, .. } | Self::Payout { amount, .. } => *amount,
        }
    }
}

/// Executes transfer batches on behalf of an instance.
///
/// # Atomicity Contract
///
/// [`execute`](Self::execute) either applies every transfer of the batch
/// or none of them.
///
/// # Implementors
///
/// - [`InMemorySettlementToken`](crate::token::InMemorySettlementToken)
pub trait SettlementToken {
    /// Applies a batch of transfers for the instance escrow identified by
    /// `escrow`.
    ///
    /// # Errors
    ///
    /// Returns
    /// [`IrsError::TransferRejected`](crate::error::IrsError::TransferRejected)
    /// if any transfer cannot be honoured.
    fn execute(&mut self, escrow: Address, batch: &[Transfer]) -> Result<()>;
}
