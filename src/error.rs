//! Unified error types for the interest-rate-swap AMM.
//!
//! Every fallible operation in the crate returns [`IrsError`].  Variants are
//! grouped by [`ErrorKind`] so callers (and the router's quoting path) can
//! tell a malformed request from an economically rejected one.
//!
//! Economic failures carry the values that were attempted, so a preview of
//! a rejected call can still report the margin it would have required.

use crate::domain::{Timestamp, Wad};

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, IrsError>;

/// Broad classification of an [`IrsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input, rejected before any state is computed.
    Validation,
    /// Caller is not allowed to perform the operation.
    Access,
    /// The would-be state is economically unacceptable.
    Economic,
    /// The operation was attempted outside its allowed time window.
    Temporal,
    /// The rate oracle could not answer.
    Oracle,
    /// Checked arithmetic failed.
    Arithmetic,
    /// An internal invariant was broken. Unreachable in correct operation.
    Invariant,
}

/// All errors produced by the crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IrsError {
    // -- validation ---------------------------------------------------------
    /// Tick outside `[MIN_TICK, MAX_TICK]`.
    #[error("invalid tick: {0}")]
    InvalidTick(&'static str),

    /// Misordered or misaligned tick range.
    #[error("invalid tick range: {0}")]
    InvalidTickRange(&'static str),

    /// Square-root price outside the tick grid bounds.
    #[error("invalid sqrt price: {0}")]
    InvalidSqrtPrice(&'static str),

    /// Swap price limit on the wrong side of the current price.
    #[error("invalid price limit: {0}")]
    InvalidPriceLimit(&'static str),

    /// A swap was requested with a zero or negative notional.
    #[error("notional must be positive")]
    ZeroNotional,

    /// A mint or burn was requested with zero liquidity.
    #[error("liquidity delta must be non-zero")]
    ZeroLiquidity,

    /// Invalid margin delta (e.g. zero).
    #[error("invalid margin delta: {0}")]
    InvalidMarginDelta(&'static str),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    /// The VAMM has no price yet.
    #[error("vamm is not initialized")]
    VammNotInitialized,

    /// The VAMM price was already set.
    #[error("vamm is already initialized")]
    VammAlreadyInitialized,

    /// The alpha flag already holds the requested value.
    #[error("alpha state already set")]
    AlphaStateAlreadySet,

    /// No position exists under the given key.
    #[error("position not found")]
    PositionNotFound,

    /// No instance exists under the given id or key.
    #[error("instance not found")]
    InstanceNotFound,

    /// An instance with the same key was already deployed.
    #[error("instance already deployed")]
    InstanceAlreadyExists,

    // -- access -------------------------------------------------------------
    /// Mint or burn attempted during the alpha phase by a non-router caller.
    #[error("periphery only")]
    AlphaRestricted,

    /// Caller lacks the role required by the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    // -- economic -----------------------------------------------------------
    /// Minting would leave the position under its initial margin requirement.
    #[error("insufficient margin for mint: required {margin_requirement}, available {margin}")]
    InsufficientMarginForMint {
        /// Initial margin requirement after the mint.
        margin_requirement: Wad,
        /// Position margin after the mint.
        margin: Wad,
    },

    /// A swap would leave the trader under its initial margin requirement.
    #[error(
        "MarginRequirementNotMet({margin_requirement}, {tick}, {fixed_token_delta}, \
         {variable_token_delta}, {fee}, {fixed_token_delta_unbalanced})"
    )]
    MarginRequirementNotMet {
        /// Initial margin requirement after the swap.
        margin_requirement: Wad,
        /// Current tick after the swap.
        tick: i32,
        /// Balanced fixed-token delta of the swap.
        fixed_token_delta: Wad,
        /// Variable-token delta of the swap.
        variable_token_delta: Wad,
        /// Fee charged for the swap.
        fee: Wad,
        /// Fixed-token delta before balancing.
        fixed_token_delta_unbalanced: Wad,
    },

    /// A withdrawal would leave the position under its initial margin requirement.
    #[error("MarginLessThanMinimum({margin_requirement})")]
    MarginLessThanMinimum {
        /// Initial margin requirement the withdrawal violated.
        margin_requirement: Wad,
    },

    /// A withdrawal exceeds the position's margin.
    #[error("margin delta exceeds balance: requested {requested}, available {available}")]
    MarginDeltaExceedsBalance {
        /// Requested withdrawal.
        requested: Wad,
        /// Margin available.
        available: Wad,
    },

    /// Burn of more liquidity than the position holds.
    #[error("liquidity underflow: requested {requested}, available {available}")]
    LiquidityUnderflow {
        /// Liquidity requested.
        requested: u128,
        /// Liquidity held.
        available: u128,
    },

    /// A tick would exceed the per-tick gross liquidity ceiling.
    #[error("max liquidity per tick exceeded")]
    MaxLiquidityPerTickExceeded,

    /// Liquidation attempted on a sufficiently collateralised position.
    #[error("position not liquidatable: margin {margin}, requirement {margin_requirement}")]
    PositionNotLiquidatable {
        /// Position margin.
        margin: Wad,
        /// Liquidation margin requirement.
        margin_requirement: Wad,
    },

    /// A mint through the router would exceed the instance's LP notional cap.
    #[error("lp cap limit: cap {cap}, attempted {attempted}")]
    NotionalCapExceeded {
        /// Configured cap.
        cap: Wad,
        /// Cumulative notional the mint would reach.
        attempted: Wad,
    },

    /// The settlement-token boundary rejected a transfer batch.
    #[error("settlement transfer rejected: {0}")]
    TransferRejected(&'static str),

    // -- temporal -----------------------------------------------------------
    /// Settlement attempted before maturity.
    #[error("not past term end: now {now}, term end {term_end}")]
    NotPastTermEnd {
        /// Clock at the call.
        now: Timestamp,
        /// Maturity of the instance.
        term_end: Timestamp,
    },

    /// Operation attempted at or after maturity.
    #[error("after term end: {0}")]
    AfterTermEnd(&'static str),

    /// Operation attempted before the term started.
    #[error("before term start: {0}")]
    BeforeTermStart(&'static str),

    /// Margin withdrawal after maturity from an unsettled position.
    #[error("position must be settled before withdrawing after maturity")]
    PositionNotSettled,

    /// Second settlement of the same position.
    #[error("position already settled")]
    PositionAlreadySettled,

    // -- oracle -------------------------------------------------------------
    /// The oracle has insufficient history to answer the query.
    #[error("rate oracle unavailable: {0}")]
    OracleUnavailable(&'static str),

    // -- arithmetic ---------------------------------------------------------
    /// Checked arithmetic overflowed.
    #[error("arithmetic overflow: {0}")]
    Overflow(&'static str),

    /// Checked arithmetic underflowed.
    #[error("arithmetic underflow: {0}")]
    Underflow(&'static str),

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    // -- invariant ----------------------------------------------------------
    /// An internal invariant does not hold.
    #[error("invariant violated: {0}")]
    InvariantViolation(&'static str),
}

impl IrsError {
    /// Returns the broad category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTick(_)
            | Self::InvalidTickRange(_)
            | Self::InvalidSqrtPrice(_)
            | Self::InvalidPriceLimit(_)
            | Self::ZeroNotional
            | Self::ZeroLiquidity
            | Self::InvalidMarginDelta(_)
            | Self::InvalidConfiguration(_)
            | Self::VammNotInitialized
            | Self::VammAlreadyInitialized
            | Self::AlphaStateAlreadySet
            | Self::PositionNotFound
            | Self::InstanceNotFound
            | Self::InstanceAlreadyExists => ErrorKind::Validation,
            Self::AlphaRestricted | Self::Unauthorized(_) => ErrorKind::Access,
            Self::InsufficientMarginForMint { .. }
            | Self::MarginRequirementNotMet { .. }
            | Self::MarginLessThanMinimum { .. }
            | Self::MarginDeltaExceedsBalance { .. }
            | Self::LiquidityUnderflow { .. }
            | Self::MaxLiquidityPerTickExceeded
            | Self::PositionNotLiquidatable { .. }
            | Self::NotionalCapExceeded { .. }
            | Self::TransferRejected(_) => ErrorKind::Economic,
            Self::NotPastTermEnd { .. }
            | Self::AfterTermEnd(_)
            | Self::BeforeTermStart(_)
            | Self::PositionNotSettled
            | Self::PositionAlreadySettled => ErrorKind::Temporal,
            Self::OracleUnavailable(_) => ErrorKind::Oracle,
            Self::Overflow(_) | Self::Underflow(_) | Self::DivisionByZero => {
                ErrorKind::Arithmetic
            }
            Self::InvariantViolation(_) => ErrorKind::Invariant,
        }
    }
}
