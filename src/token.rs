//! In-memory settlement token.
//!
//! [`InMemorySettlementToken`] keeps account balances in a
//! `BTreeMap<Address, Wad>`.  It validates a whole batch against a scratch
//! copy and only then swaps it in, so a rejected batch leaves balances
//! untouched.

use std::collections::BTreeMap;

use crate::domain::{Address, Wad};
use crate::error::{IrsError, Result};
use crate::math::CheckedArithmetic;
use crate::traits::{SettlementToken, Transfer};

/// A settlement token whose ledger lives in memory.
///
/// # Examples
///
/// ```
/// use irs_amm::domain::{Address, Wad};
/// use irs_amm::token::InMemorySettlementToken;
/// use irs_amm::traits::{SettlementToken, Transfer};
///
/// let alice = Address::repeat(1);
/// let escrow = Address::repeat(9);
/// let mut token = InMemorySettlementToken::default();
/// token.mint(alice, Wad::from_integer(10)).expect("mint");
///
/// let batch = [Transfer::Deposit { from: alice, amount: Wad::from_integer(4) }];
/// token.execute(escrow, &batch).expect("deposit");
/// assert_eq!(token.balance_of(alice), Wad::from_integer(6));
/// assert_eq!(token.balance_of(escrow), Wad::from_integer(4));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemorySettlementToken {
    balances: BTreeMap<Address, Wad>,
}

impl InMemorySettlementToken {
    /// Credits `amount` to `to` out of thin air.
    ///
    /// # Errors
    ///
    /// - [`IrsError::TransferRejected`] if `amount` is not positive.
    /// - [`IrsError::Overflow`] if the balance overflows.
    pub fn mint(&mut self, to: Address, amount: Wad) -> Result<()> {
        if !amount.is_positive() {
            return Err(IrsError::TransferRejected("mint amount must be positive"));
        }
        let balance = self.balance_of(to).safe_add(&amount)?;
        self.balances.insert(to, balance);
        Ok(())
    }

    /// Balance of `account`, zero if unknown.
    #[must_use]
    pub fn balance_of(&self, account: Address) -> Wad {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn debit(balances: &mut BTreeMap<Address, Wad>, account: Address, amount: Wad) -> Result<()> {
        let current = balances.get(&account).copied().unwrap_or_default();
        if current < amount {
            return Err(IrsError::TransferRejected("insufficient token balance"));
        }
        balances.insert(account, current.safe_sub(&amount)?);
        Ok(())
    }

    fn credit(balances: &mut BTreeMap<Address, Wad>, account: Address, amount: Wad) -> Result<()> {
        let current = balances.get(&account).copied().unwrap_or_default();
        balances.insert(account, current.safe_add(&amount)?);
        Ok(())
    }
}

impl SettlementToken for InMemorySettlementToken {
    fn execute(&mut self, escrow: Address, batch: &[Transfer]) -> Result<()> {
        let mut scratch = self.balances.clone();
        for transfer in batch {
            if !transfer.amount().is_positive() {
                return Err(IrsError::TransferRejected(
                    "transfer amount must be positive",
                ));
            }
            match *transfer {
                Transfer::Deposit { from, amount } => {
                    Self::debit(&mut scratch, from, amount)?;
                    Self::credit(&mut scratch, escrow, amount)?;
                }
                Transfer::Payout { to, amount } => {
                    Self::debit(&mut scratch, escrow, amount)?;
                    Self::credit(&mut scratch, to, amount)?;
                }
            }
        }
        self.balances = scratch;
        Ok(())
    }
}
