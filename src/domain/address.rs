//! Account identifier for owners, liquidators, routers and token contracts.

use core::fmt;

/// A 20-byte account identifier.
///
/// Used for position owners, liquidators, the approved router, instance
/// owners, and the underlying settlement asset and rate oracle of an
/// instance.  All byte sequences are valid, so construction is infallible.
///
/// # Examples
///
/// ```
/// use irs_amm::domain::Address;
///
/// let addr = Address::from_bytes([1u8; 20]);
/// assert_eq!(addr.as_bytes(), [1u8; 20]);
/// assert_ne!(addr, Address::zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address([u8; 20]);

impl Address {
    /// Creates an `Address` from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address whose every byte is `byte`.  Handy in tests.
    #[must_use]
    pub const fn repeat(byte: u8) -> Self {
        Self([byte; 20])
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> [u8; 20] {
        self.0
    }

    /// Returns the all-zero address.
    #[must_use]
    pub const fn zero() -> Self {
        Self([0u8; 20])
    }

    /// Returns `true` for the all-zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_round_trip() {
        let bytes = [42u8; 20];
        assert_eq!(Address::from_bytes(bytes).as_bytes(), bytes);
    }

    #[test]
    fn zero_detection() {
        assert!(Address::zero().is_zero());
        assert!(!Address::repeat(1).is_zero());
        assert_eq!(Address::default(), Address::zero());
    }

    #[test]
    fn display_is_hex() {
        let mut bytes = [0u8; 20];
        bytes[19] = 0xab;
        assert_eq!(
            Address::from_bytes(bytes).to_string(),
            "0x00000000000000000000000000000000000000ab"
        );
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(Address::repeat(0) < Address::repeat(1));
    }
}
