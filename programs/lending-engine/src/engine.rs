use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::Clock, msg, pubkey::Pubkey};
use std::collections::BTreeMap;

use crate::{
    changeset::Changeset,
    error::LendingError,
    health::AccountHealth,
    math::Wad,
    oracle::PriceOracle,
    state::{owner_range, Asset, LendingConfig, Market, Position, PositionKey},
    token::TokenLedger,
};

/// Result of a repayment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepayOutcome {
    /// Amount actually collected from the payer
    pub repaid: Wad,
    pub remaining_debt: Wad,
}

/// Current balances of one position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionView {
    pub owner: Pubkey,
    pub asset: Pubkey,
    pub supplied: Wad,
    pub borrowed: Wad,
    pub use_as_collateral: bool,
}

/// Lending engine state: registry, market ledgers and positions
///
/// Mutating entry points take `&mut self` and run under a single-writer
/// guard. Queries take `&self` and project accrual onto copies, so they
/// never change stored state.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct LendingEngine {
    pub discriminator: [u8; 8],
    pub(crate) config: LendingConfig,
    pub(crate) assets: BTreeMap<Pubkey, Asset>,
    pub(crate) markets: BTreeMap<Pubkey, Market>,
    pub(crate) positions: BTreeMap<PositionKey, Position>,
    #[borsh_skip]
    in_flight: bool,
}

impl LendingEngine {
    pub const DISCRIMINATOR: [u8; 8] = [76, 69, 78, 68, 95, 69, 78, 71]; // "LEND_ENG"

    pub fn new(config: LendingConfig) -> Result<Self, LendingError> {
        config.validate()?;
        Ok(Self {
            discriminator: Self::DISCRIMINATOR,
            config,
            assets: BTreeMap::new(),
            markets: BTreeMap::new(),
            positions: BTreeMap::new(),
            in_flight: false,
        })
    }

    /// Deserialize and validate persisted state
    pub fn load(data: &[u8]) -> Result<Self, LendingError> {
        let engine =
            Self::try_from_slice(data).map_err(|_| LendingError::InvalidStateData)?;
        engine.validate()?;
        Ok(engine)
    }

    pub fn save(&self) -> Result<Vec<u8>, LendingError> {
        self.try_to_vec().map_err(|_| LendingError::InvalidStateData)
    }

    pub fn validate(&self) -> Result<(), LendingError> {
        if self.discriminator != Self::DISCRIMINATOR {
            return Err(LendingError::InvalidStateData);
        }
        self.config
            .validate()
            .map_err(|_| LendingError::InvalidStateData)?;

        if self.assets.len() != self.markets.len() {
            return Err(LendingError::InvalidStateData);
        }
        for (mint, market) in &self.markets {
            let asset = self.assets.get(mint).ok_or(LendingError::InvalidStateData)?;
            if asset.mint != *mint || market.asset != *mint {
                return Err(LendingError::InvalidStateData);
            }
        }
        for (key, position) in &self.positions {
            if position.key() != *key || !self.markets.contains_key(&key.1) {
                return Err(LendingError::InvalidStateData);
            }
        }
        Ok(())
    }

    /// Run `op` as the only writer. Nested entry fails with `ReentrantCall`.
    pub(crate) fn guarded<R>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<R, LendingError>,
    ) -> Result<R, LendingError> {
        if self.in_flight {
            msg!("Rejected reentrant call");
            return Err(LendingError::ReentrantCall);
        }
        self.in_flight = true;
        let result = op(self);
        self.in_flight = false;
        result
    }

    pub fn config(&self) -> &LendingConfig {
        &self.config
    }

    pub fn asset(&self, mint: &Pubkey) -> Result<&Asset, LendingError> {
        self.assets.get(mint).ok_or(LendingError::MarketNotFound)
    }

    /// Listed asset mints in key order
    pub fn asset_mints(&self) -> impl Iterator<Item = &Pubkey> {
        self.assets.keys()
    }

    /// Stored market accrued to `now` on a copy
    pub(crate) fn projected_market(&self, mint: &Pubkey, now: i64) -> Result<Market, LendingError> {
        let asset = self.asset(mint)?;
        self.markets
            .get(mint)
            .ok_or(LendingError::MarketNotFound)?
            .projected(asset, now)
    }

    // Position ledger

    /// Deposit `amount` of `asset` from `account` into the vault
    pub fn supply(
        &mut self,
        tokens: &mut dyn TokenLedger,
        clock: &Clock,
        account: &Pubkey,
        asset: &Pubkey,
        amount: Wad,
    ) -> Result<(), LendingError> {
        self.guarded(|engine| {
            require_amount(amount)?;
            let mut changes = Changeset::new(clock.unix_timestamp);

            let (market, position) = changes.stage(engine, account, asset)?;
            if !market.is_active {
                return Err(LendingError::MarketInactive);
            }
            position.supplied_principal = position.supplied_principal.checked_add(amount)?;
            market.total_supplied = market.total_supplied.checked_add(amount)?;

            let commit = changes.finish(engine)?;
            tokens.transfer(account, &engine.config.vault, asset, amount)?;
            commit.apply(engine);

            msg!("Supplied {} of {} for {}", amount, asset, account);
            Ok(())
        })
    }

    /// Return `amount` of supplied `asset` to `account`
    pub fn withdraw(
        &mut self,
        tokens: &mut dyn TokenLedger,
        oracle: &dyn PriceOracle,
        clock: &Clock,
        account: &Pubkey,
        asset: &Pubkey,
        amount: Wad,
    ) -> Result<(), LendingError> {
        self.guarded(|engine| {
            require_amount(amount)?;
            let mut changes = Changeset::new(clock.unix_timestamp);

            let (market, position) = changes.stage(engine, account, asset)?;
            if position.supplied_principal < amount {
                return Err(LendingError::InsufficientBalance);
            }
            if market.available_liquidity() < amount {
                return Err(LendingError::InsufficientLiquidity);
            }
            position.supplied_principal = position.supplied_principal.checked_sub(amount)?;
            market.total_supplied = market.total_supplied.saturating_sub(amount);

            changes.require_solvent(engine, account, oracle)?;

            let commit = changes.finish(engine)?;
            tokens.transfer(&engine.config.vault, account, asset, amount)?;
            commit.apply(engine);

            msg!("Withdrew {} of {} for {}", amount, asset, account);
            Ok(())
        })
    }

    /// Lend `amount` of `asset` to `account` against its collateral
    pub fn borrow(
        &mut self,
        tokens: &mut dyn TokenLedger,
        oracle: &dyn PriceOracle,
        clock: &Clock,
        account: &Pubkey,
        asset: &Pubkey,
        amount: Wad,
    ) -> Result<(), LendingError> {
        self.guarded(|engine| {
            require_amount(amount)?;
            let mut changes = Changeset::new(clock.unix_timestamp);

            let (market, position) = changes.stage(engine, account, asset)?;
            if !market.is_active {
                return Err(LendingError::MarketInactive);
            }
            if market.available_liquidity() < amount {
                return Err(LendingError::InsufficientLiquidity);
            }
            position.borrowed_principal = position.borrowed_principal.checked_add(amount)?;
            market.total_borrowed = market.total_borrowed.checked_add(amount)?;

            changes.require_solvent(engine, account, oracle)?;

            let commit = changes.finish(engine)?;
            tokens.transfer(&engine.config.vault, account, asset, amount)?;
            commit.apply(engine);

            msg!("Borrowed {} of {} for {}", amount, asset, account);
            Ok(())
        })
    }

    /// Pay down `account`'s debt. Only the part of `amount` that covers
    /// current debt is collected.
    pub fn repay(
        &mut self,
        tokens: &mut dyn TokenLedger,
        clock: &Clock,
        account: &Pubkey,
        asset: &Pubkey,
        amount: Wad,
    ) -> Result<RepayOutcome, LendingError> {
        self.guarded(|engine| {
            require_amount(amount)?;
            let mut changes = Changeset::new(clock.unix_timestamp);

            let (market, position) = changes.stage(engine, account, asset)?;
            let debt = position.borrowed_principal;
            if debt.is_zero() {
                return Err(LendingError::InsufficientBalance);
            }

            let repaid = amount.min(debt);
            position.borrowed_principal = debt.checked_sub(repaid)?;
            market.total_borrowed = market.total_borrowed.saturating_sub(repaid);
            let remaining_debt = position.borrowed_principal;

            let commit = changes.finish(engine)?;
            tokens.transfer(account, &engine.config.vault, asset, repaid)?;
            commit.apply(engine);

            msg!("Repaid {} of {} for {}, {} remaining", repaid, asset, account, remaining_debt);
            Ok(RepayOutcome {
                repaid,
                remaining_debt,
            })
        })
    }

    /// Choose whether a supplied balance backs `account`'s debt
    pub fn set_collateral(
        &mut self,
        oracle: &dyn PriceOracle,
        clock: &Clock,
        account: &Pubkey,
        asset: &Pubkey,
        enabled: bool,
    ) -> Result<(), LendingError> {
        self.guarded(|engine| {
            if enabled && !engine.asset(asset)?.risk.collateral_enabled {
                return Err(LendingError::InvalidParameter);
            }

            let mut changes = Changeset::new(clock.unix_timestamp);
            let (_, position) = changes.stage(engine, account, asset)?;
            if position.is_empty() {
                return Err(LendingError::InsufficientBalance);
            }
            position.use_as_collateral = enabled;

            if !enabled {
                changes.require_solvent(engine, account, oracle)?;
            }

            changes.finish(engine)?.apply(engine);

            msg!("Collateral flag for {} on {} set to {}", account, asset, enabled);
            Ok(())
        })
    }

    // Queries

    /// Market state accrued to the clock's timestamp
    pub fn market_state(&self, asset: &Pubkey, clock: &Clock) -> Result<Market, LendingError> {
        self.projected_market(asset, clock.unix_timestamp)
    }

    /// Current balances of `account` in `asset`, zero when it holds nothing
    pub fn position(
        &self,
        account: &Pubkey,
        asset: &Pubkey,
        clock: &Clock,
    ) -> Result<PositionView, LendingError> {
        let market = self.projected_market(asset, clock.unix_timestamp)?;
        match self.positions.get(&(*account, *asset)) {
            Some(position) => view(position, &market),
            None => Ok(PositionView {
                owner: *account,
                asset: *asset,
                supplied: Wad::ZERO,
                borrowed: Wad::ZERO,
                use_as_collateral: false,
            }),
        }
    }

    /// Every open position of `account`, ordered by asset
    pub fn account_positions(
        &self,
        account: &Pubkey,
        clock: &Clock,
    ) -> Result<Vec<PositionView>, LendingError> {
        self.positions
            .range(owner_range(account))
            .map(|(key, position)| {
                let market = self.projected_market(&key.1, clock.unix_timestamp)?;
                view(position, &market)
            })
            .collect()
    }

    pub fn account_health(
        &self,
        account: &Pubkey,
        oracle: &dyn PriceOracle,
        clock: &Clock,
    ) -> Result<AccountHealth, LendingError> {
        Changeset::new(clock.unix_timestamp).account_health(self, account, oracle)
    }

    /// Collateral-factor health factor, `Wad::MAX` without debt
    pub fn health_factor(
        &self,
        account: &Pubkey,
        oracle: &dyn PriceOracle,
        clock: &Clock,
    ) -> Result<Wad, LendingError> {
        Ok(self.account_health(account, oracle, clock)?.health_factor)
    }
}

fn view(position: &Position, market: &Market) -> Result<PositionView, LendingError> {
    Ok(PositionView {
        owner: position.owner,
        asset: position.asset,
        supplied: position.supplied_balance(market)?,
        borrowed: position.borrowed_balance(market)?,
        use_as_collateral: position.use_as_collateral,
    })
}

pub(crate) fn require_amount(amount: Wad) -> Result<(), LendingError> {
    if amount.is_zero() {
        return Err(LendingError::InvalidParameter);
    }
    Ok(())
}
