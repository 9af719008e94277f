//! Staged write-set for a single engine operation
//!
//! Operations never touch the store directly. They stage the markets and
//! positions they change, accrued and rebased to the operation's timestamp,
//! validate against the staged view, and only then write everything back.
//! Dropping a `Changeset` discards the operation.

use solana_program::pubkey::Pubkey;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use crate::engine::LendingEngine;
use crate::error::LendingError;
use crate::health::{evaluate_owned, AccountHealth};
use crate::oracle::PriceOracle;
use crate::state::{owner_range, Asset, Market, Position, PositionKey};

pub struct Changeset {
    now: i64,
    markets: BTreeMap<Pubkey, Market>,
    positions: BTreeMap<PositionKey, Position>,
}

impl Changeset {
    pub fn new(now: i64) -> Self {
        Self {
            now,
            markets: BTreeMap::new(),
            positions: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    fn stage_market(&mut self, engine: &LendingEngine, asset: &Pubkey) -> Result<(), LendingError> {
        if self.markets.contains_key(asset) {
            return Ok(());
        }
        let market = engine.projected_market(asset, self.now)?;
        self.markets.insert(*asset, market);
        Ok(())
    }

    /// Staged market, accrued to `now`
    pub fn market_mut(
        &mut self,
        engine: &LendingEngine,
        asset: &Pubkey,
    ) -> Result<&mut Market, LendingError> {
        self.stage_market(engine, asset)?;
        self.markets
            .get_mut(asset)
            .ok_or(LendingError::MarketNotFound)
    }

    /// Staged market and the account's position in it, rebased to `now`.
    /// Missing positions start empty, flagged as collateral when the asset
    /// allows it.
    pub fn stage(
        &mut self,
        engine: &LendingEngine,
        account: &Pubkey,
        asset: &Pubkey,
    ) -> Result<(&mut Market, &mut Position), LendingError> {
        self.stage_market(engine, asset)?;
        let market = self
            .markets
            .get_mut(asset)
            .ok_or(LendingError::MarketNotFound)?;

        let key = (*account, *asset);
        let position = match self.positions.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let mut position = match engine.positions.get(&key) {
                    Some(existing) => existing.clone(),
                    None => Position::new(
                        *account,
                        market,
                        engine.asset(asset)?.risk.collateral_enabled,
                        self.now,
                    ),
                };
                position.rebase(market, self.now)?;
                entry.insert(position)
            }
        };

        Ok((market, position))
    }

    /// Every position of `account` as it would look after commit, paired
    /// with its market at `now`
    fn account_entries(
        &self,
        engine: &LendingEngine,
        account: &Pubkey,
    ) -> Result<Vec<(Position, Market, Asset)>, LendingError> {
        let assets: BTreeSet<Pubkey> = engine
            .positions
            .range(owner_range(account))
            .map(|(key, _)| key.1)
            .chain(self.positions.range(owner_range(account)).map(|(key, _)| key.1))
            .collect();

        let mut entries = Vec::with_capacity(assets.len());
        for asset in assets {
            let key = (*account, asset);
            let position = match self.positions.get(&key).or_else(|| engine.positions.get(&key)) {
                Some(position) => position.clone(),
                None => continue,
            };
            let market = match self.markets.get(&asset) {
                Some(market) => market.clone(),
                None => engine.projected_market(&asset, self.now)?,
            };
            entries.push((position, market, engine.asset(&asset)?.clone()));
        }
        Ok(entries)
    }

    /// Whether `account` owes anything in the staged view. Needs no prices.
    pub fn has_debt(&self, engine: &LendingEngine, account: &Pubkey) -> Result<bool, LendingError> {
        for (position, market, _) in self.account_entries(engine, account)? {
            if !position.borrowed_balance(&market)?.is_zero() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Health of `account` evaluated against the staged view
    pub fn account_health(
        &self,
        engine: &LendingEngine,
        account: &Pubkey,
        oracle: &dyn PriceOracle,
    ) -> Result<AccountHealth, LendingError> {
        let entries = self.account_entries(engine, account)?;
        evaluate_owned(&entries, oracle, self.now)
    }

    /// Fail with `InsufficientCollateral` unless `account` stays solvent.
    /// Accounts without debt pass without consulting the oracle.
    pub fn require_solvent(
        &self,
        engine: &LendingEngine,
        account: &Pubkey,
        oracle: &dyn PriceOracle,
    ) -> Result<(), LendingError> {
        if !self.has_debt(engine, account)? {
            return Ok(());
        }
        let health = self.account_health(engine, account, oracle)?;
        if !health.is_solvent() {
            return Err(LendingError::InsufficientCollateral);
        }
        Ok(())
    }

    /// Refresh rates on every staged market. This is the last fallible step;
    /// the returned `Commit` can only be applied.
    pub fn finish(mut self, engine: &LendingEngine) -> Result<Commit, LendingError> {
        for (asset, market) in self.markets.iter_mut() {
            market.refresh_rates(engine.asset(asset)?)?;
        }
        Ok(Commit {
            markets: self.markets,
            positions: self.positions,
        })
    }
}

/// Validated write-set, ready to replace store entries
#[must_use]
pub struct Commit {
    markets: BTreeMap<Pubkey, Market>,
    positions: BTreeMap<PositionKey, Position>,
}

impl Commit {
    pub fn apply(self, engine: &mut LendingEngine) {
        engine.markets.extend(self.markets);
        for (key, position) in self.positions {
            if position.is_empty() {
                engine.positions.remove(&key);
            } else {
                engine.positions.insert(key, position);
            }
        }
    }
}
