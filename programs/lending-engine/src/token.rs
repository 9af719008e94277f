//! Token transfer collaborator
//!
//! The engine never owns balances. It moves tokens between accounts through a
//! `TokenLedger`, with the configured vault acting as custody for every
//! market.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;
use std::collections::BTreeMap;

use crate::error::LendingError;
use crate::math::Wad;

pub trait TokenLedger {
    fn balance_of(&self, owner: &Pubkey, asset: &Pubkey) -> Wad;

    /// Fails with `InsufficientBalance` when `owner` holds less than `amount`
    fn debit(&mut self, owner: &Pubkey, asset: &Pubkey, amount: Wad) -> Result<(), LendingError>;

    fn credit(&mut self, owner: &Pubkey, asset: &Pubkey, amount: Wad) -> Result<(), LendingError>;

    fn transfer(
        &mut self,
        from: &Pubkey,
        to: &Pubkey,
        asset: &Pubkey,
        amount: Wad,
    ) -> Result<(), LendingError> {
        self.debit(from, asset, amount)?;
        if let Err(e) = self.credit(to, asset, amount) {
            self.credit(from, asset, amount)?;
            return Err(e);
        }
        Ok(())
    }
}

/// Balance table keyed by (owner, asset)
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryTokenLedger {
    balances: BTreeMap<(Pubkey, Pubkey), Wad>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create tokens out of thin air, for funding accounts
    pub fn mint(&mut self, owner: &Pubkey, asset: &Pubkey, amount: Wad) -> Result<(), LendingError> {
        self.credit(owner, asset, amount)
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn balance_of(&self, owner: &Pubkey, asset: &Pubkey) -> Wad {
        self.balances
            .get(&(*owner, *asset))
            .copied()
            .unwrap_or_default()
    }

    fn debit(&mut self, owner: &Pubkey, asset: &Pubkey, amount: Wad) -> Result<(), LendingError> {
        let balance = self.balance_of(owner, asset);
        if balance < amount {
            return Err(LendingError::InsufficientBalance);
        }

        let remaining = balance.checked_sub(amount)?;
        if remaining.is_zero() {
            self.balances.remove(&(*owner, *asset));
        } else {
            self.balances.insert((*owner, *asset), remaining);
        }
        Ok(())
    }

    fn credit(&mut self, owner: &Pubkey, asset: &Pubkey, amount: Wad) -> Result<(), LendingError> {
        if amount.is_zero() {
            return Ok(());
        }
        let balance = self.balance_of(owner, asset).checked_add(amount)?;
        self.balances.insert((*owner, *asset), balance);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum LedgerEntry {
    Debit { owner: Pubkey, asset: Pubkey, amount: Wad },
    Credit { owner: Pubkey, asset: Pubkey, amount: Wad },
}

/// Ledger wrapper that records every movement so it can be undone
pub struct JournaledLedger<'a> {
    inner: &'a mut dyn TokenLedger,
    entries: Vec<LedgerEntry>,
}

impl<'a> JournaledLedger<'a> {
    pub fn new(inner: &'a mut dyn TokenLedger) -> Self {
        Self {
            inner,
            entries: Vec::new(),
        }
    }

    /// Number of recorded movements
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Undo every recorded movement, newest first
    pub fn rollback(mut self) -> Result<(), LendingError> {
        while let Some(entry) = self.entries.pop() {
            match entry {
                LedgerEntry::Debit { owner, asset, amount } => {
                    self.inner.credit(&owner, &asset, amount)?;
                }
                LedgerEntry::Credit { owner, asset, amount } => {
                    self.inner.debit(&owner, &asset, amount)?;
                }
            }
        }
        Ok(())
    }
}

impl TokenLedger for JournaledLedger<'_> {
    fn balance_of(&self, owner: &Pubkey, asset: &Pubkey) -> Wad {
        self.inner.balance_of(owner, asset)
    }

    fn debit(&mut self, owner: &Pubkey, asset: &Pubkey, amount: Wad) -> Result<(), LendingError> {
        self.inner.debit(owner, asset, amount)?;
        self.entries.push(LedgerEntry::Debit {
            owner: *owner,
            asset: *asset,
            amount,
        });
        Ok(())
    }

    fn credit(&mut self, owner: &Pubkey, asset: &Pubkey, amount: Wad) -> Result<(), LendingError> {
        self.inner.credit(owner, asset, amount)?;
        self.entries.push(LedgerEntry::Credit {
            owner: *owner,
            asset: *asset,
            amount,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_requires_funds() {
        let mut ledger = InMemoryTokenLedger::new();
        let owner = Pubkey::new_unique();
        let asset = Pubkey::new_unique();
        ledger.mint(&owner, &asset, Wad::from_num(10)).unwrap();

        assert_eq!(
            ledger.debit(&owner, &asset, Wad::from_num(11)),
            Err(LendingError::InsufficientBalance)
        );
        ledger.debit(&owner, &asset, Wad::from_num(10)).unwrap();
        assert_eq!(ledger.balance_of(&owner, &asset), Wad::ZERO);
        assert_eq!(ledger, InMemoryTokenLedger::new());
    }

    #[test]
    fn test_transfer() {
        let mut ledger = InMemoryTokenLedger::new();
        let (a, b, asset) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        ledger.mint(&a, &asset, Wad::from_num(5)).unwrap();

        ledger.transfer(&a, &b, &asset, Wad::from_num(2)).unwrap();
        assert_eq!(ledger.balance_of(&a, &asset), Wad::from_num(3));
        assert_eq!(ledger.balance_of(&b, &asset), Wad::from_num(2));

        assert_eq!(
            ledger.transfer(&b, &a, &asset, Wad::from_num(3)),
            Err(LendingError::InsufficientBalance)
        );
    }

    #[test]
    fn test_journal_rollback_restores_balances() {
        let mut ledger = InMemoryTokenLedger::new();
        let (a, b, c, asset) = (
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        );
        ledger.mint(&a, &asset, Wad::from_num(100)).unwrap();
        let before = ledger.clone();

        let mut journal = JournaledLedger::new(&mut ledger);
        journal.transfer(&a, &b, &asset, Wad::from_num(60)).unwrap();
        journal.transfer(&b, &c, &asset, Wad::from_num(60)).unwrap();
        assert_eq!(journal.len(), 4);
        journal.rollback().unwrap();

        assert_eq!(ledger, before);
    }
}
