//! Explicit rounding direction for arithmetic operations.

/// Rounding direction for division and multiply-divide.
///
/// Every division in the crate takes a `Rounding` so that the direction
/// is always chosen against the caller: amounts a trader receives round
/// down, amounts a trader pays round up.  For signed values the directions
/// are towards negative and positive infinity respectively.
///
/// # Examples
///
/// ```
/// use irs_amm::domain::Rounding;
///
/// assert!(Rounding::Up.is_up());
/// assert!(Rounding::Down.is_down());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rounding {
    /// Towards positive infinity (ceiling).
    Up,
    /// Towards negative infinity (floor).
    Down,
}

impl Rounding {
    /// Returns `true` if this is [`Rounding::Up`].
    #[must_use]
    pub const fn is_up(&self) -> bool {
        matches!(self, Self::Up)
    }

    /// Returns `true` if this is [`Rounding::Down`].
    #[must_use]
    pub const fn is_down(&self) -> bool {
        matches!(self, Self::Down)
    }

    /// Returns the opposite direction.
    #[must_use]
    pub const fn flip(&self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}
