use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;
use std::ops::RangeInclusive;

use crate::error::LendingError;
use crate::math::Wad;
use crate::state::Market;

/// Store key: (account, asset)
pub type PositionKey = (Pubkey, Pubkey);

/// Key range covering every position held by `owner`
pub fn owner_range(owner: &Pubkey) -> RangeInclusive<PositionKey> {
    (*owner, Pubkey::new_from_array([0; 32]))..=(*owner, Pubkey::new_from_array([u8::MAX; 32]))
}

/// One account's principal in one market
///
/// Principals are stored together with the market index observed when they
/// were last written. The current balance is
/// `principal * current_index / index_snapshot`, so accrual never has to
/// visit individual positions.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub owner: Pubkey,
    pub asset: Pubkey,
    pub supplied_principal: Wad,
    pub borrowed_principal: Wad,
    pub supply_index_snapshot: Wad,
    pub borrow_index_snapshot: Wad,
    pub use_as_collateral: bool,
    pub last_update: i64,
}

impl Position {
    pub fn new(owner: Pubkey, market: &Market, use_as_collateral: bool, now: i64) -> Self {
        Self {
            owner,
            asset: market.asset,
            supplied_principal: Wad::ZERO,
            borrowed_principal: Wad::ZERO,
            supply_index_snapshot: market.supply_index,
            borrow_index_snapshot: market.borrow_index,
            use_as_collateral,
            last_update: now,
        }
    }

    pub fn key(&self) -> PositionKey {
        (self.owner, self.asset)
    }

    /// Current supplied balance, rounded down
    pub fn supplied_balance(&self, market: &Market) -> Result<Wad, LendingError> {
        if self.supplied_principal.is_zero() {
            return Ok(Wad::ZERO);
        }
        self.supplied_principal
            .mul_div_floor(market.supply_index, self.supply_index_snapshot)
    }

    /// Current debt, rounded up
    pub fn borrowed_balance(&self, market: &Market) -> Result<Wad, LendingError> {
        if self.borrowed_principal.is_zero() {
            return Ok(Wad::ZERO);
        }
        self.borrowed_principal
            .mul_div_ceil(market.borrow_index, self.borrow_index_snapshot)
    }

    /// Fold accrued interest into principal and move the snapshots to the
    /// market's current indices.
    pub fn rebase(&mut self, market: &Market, now: i64) -> Result<(), LendingError> {
        self.supplied_principal = self.supplied_balance(market)?;
        self.borrowed_principal = self.borrowed_balance(market)?;
        self.supply_index_snapshot = market.supply_index;
        self.borrow_index_snapshot = market.borrow_index;
        self.last_update = now;
        Ok(())
    }

    /// Empty positions are dropped from the store
    pub fn is_empty(&self) -> bool {
        self.supplied_principal.is_zero() && self.borrowed_principal.is_zero()
    }
}
