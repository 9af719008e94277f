use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::LendingError;
use crate::interest::{utilization, SECONDS_PER_YEAR};
use crate::math::{mul_div_floor, Wad};
use crate::state::Asset;

/// Aggregate ledger for one asset across all accounts
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Market {
    /// Asset mint
    pub asset: Pubkey,

    /// Suppliers' claim on the pool, interest included
    pub total_supplied: Wad,

    /// Outstanding debt, interest included
    pub total_borrowed: Wad,

    /// Protocol share of interest and flash fees
    pub total_reserves: Wad,

    /// Cumulative supply growth, starts at 1.0
    pub supply_index: Wad,

    /// Cumulative borrow growth, starts at 1.0
    pub borrow_index: Wad,

    /// Annual supply rate at the last refresh
    pub supply_rate: Wad,

    /// Annual borrow rate at the last refresh
    pub borrow_rate: Wad,

    /// Unix timestamp of the last accrual
    pub last_accrual_time: i64,

    /// Inactive markets only accept unwinding operations
    pub is_active: bool,

    pub created_at: i64,
}

impl Market {
    pub fn new(asset: &Asset, now: i64) -> Result<Self, LendingError> {
        let mut market = Self {
            asset: asset.mint,
            total_supplied: Wad::ZERO,
            total_borrowed: Wad::ZERO,
            total_reserves: Wad::ZERO,
            supply_index: Wad::ONE,
            borrow_index: Wad::ONE,
            supply_rate: Wad::ZERO,
            borrow_rate: Wad::ZERO,
            last_accrual_time: now,
            is_active: true,
            created_at: now,
        };
        market.refresh_rates(asset)?;
        Ok(market)
    }

    /// Liquidity that is neither lent out nor owned by the protocol
    pub fn available_liquidity(&self) -> Wad {
        self.total_supplied.saturating_sub(self.total_borrowed)
    }

    pub fn utilization(&self) -> Result<Wad, LendingError> {
        utilization(self.total_supplied, self.total_borrowed)
    }

    /// Recompute rates from current utilization
    pub fn refresh_rates(&mut self, asset: &Asset) -> Result<(), LendingError> {
        let u = self.utilization()?;
        self.borrow_rate = asset.rate_model.borrow_rate(u)?;
        self.supply_rate = asset
            .rate_model
            .supply_rate(u, asset.risk.reserve_factor)?;
        Ok(())
    }

    /// Bring totals and indices forward to `now` using the stored borrow rate.
    /// Calling it again with the same timestamp changes nothing.
    pub fn accrue(&mut self, asset: &Asset, now: i64) -> Result<(), LendingError> {
        if now <= self.last_accrual_time {
            return Ok(());
        }

        let elapsed = now
            .checked_sub(self.last_accrual_time)
            .ok_or(LendingError::MathOverflow)? as u128;

        if self.total_borrowed.is_zero() || self.borrow_rate.is_zero() {
            self.last_accrual_time = now;
            return Ok(());
        }

        let growth = Wad::from_raw(mul_div_floor(
            self.borrow_rate.raw,
            elapsed,
            SECONDS_PER_YEAR,
        )?);

        let borrow_interest = self.total_borrowed.try_mul(growth)?;
        let new_borrowed = self.total_borrowed.checked_add(borrow_interest)?;

        // Suppliers' share is raised when the reserve cut would leave debt
        // larger than supply.
        let kept = Wad::ONE.checked_sub(asset.risk.reserve_factor)?;
        let shortfall = new_borrowed.saturating_sub(self.total_supplied);
        let supplier_interest = borrow_interest
            .try_mul(kept)?
            .max(shortfall)
            .min(borrow_interest);
        let reserve_interest = borrow_interest.checked_sub(supplier_interest)?;

        let new_supplied = self.total_supplied.checked_add(supplier_interest)?;

        self.supply_index = self
            .supply_index
            .mul_div_floor(new_supplied, self.total_supplied)?;
        self.borrow_index = self
            .borrow_index
            .try_mul(Wad::ONE.checked_add(growth)?)?;

        self.total_borrowed = new_borrowed;
        self.total_supplied = new_supplied;
        self.total_reserves = self.total_reserves.checked_add(reserve_interest)?;
        self.last_accrual_time = now;

        Ok(())
    }

    /// Copy of this market accrued to `now`
    pub fn projected(&self, asset: &Asset, now: i64) -> Result<Market, LendingError> {
        let mut market = self.clone();
        market.accrue(asset, now)?;
        Ok(market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interest::{InterestRateModel, SECONDS_PER_YEAR};
    use crate::state::RiskParameters;

    const YEAR: i64 = SECONDS_PER_YEAR as i64;

    fn asset() -> Asset {
        Asset::new(
            Pubkey::new_unique(),
            RiskParameters::default(),
            InterestRateModel::default(),
        )
        .unwrap()
    }

    fn market_at(asset: &Asset, supplied: u64, borrowed: u64) -> Market {
        let mut market = Market::new(asset, 0).unwrap();
        market.total_supplied = Wad::from_num(supplied);
        market.total_borrowed = Wad::from_num(borrowed);
        market.refresh_rates(asset).unwrap();
        market
    }

    #[test]
    fn test_new_market() {
        let asset = asset();
        let market = Market::new(&asset, 42).unwrap();
        assert_eq!(market.supply_index, Wad::ONE);
        assert_eq!(market.borrow_index, Wad::ONE);
        assert_eq!(market.borrow_rate, Wad::from_bps(200));
        assert_eq!(market.supply_rate, Wad::ZERO);
        assert_eq!(market.last_accrual_time, 42);
        assert!(market.is_active);
    }

    #[test]
    fn test_one_year_accrual() {
        let asset = asset();
        let mut market = market_at(&asset, 1_000, 800);
        assert_eq!(market.borrow_rate, Wad::from_bps(1_400));

        market.accrue(&asset, YEAR).unwrap();

        // 800 * 14% = 112 interest, 10% of it to reserves
        assert_eq!(market.total_borrowed, Wad::from_num(912));
        assert_eq!(market.total_supplied, Wad::from_raw(1_100_800_000_000_000_000_000));
        assert_eq!(market.total_reserves, Wad::from_raw(11_200_000_000_000_000_000));
        assert_eq!(market.borrow_index, Wad::from_bps(11_400));
        assert_eq!(market.supply_index, Wad::from_raw(1_100_800_000_000_000_000));
        assert_eq!(market.last_accrual_time, YEAR);
    }

    #[test]
    fn test_accrual_idempotent() {
        let asset = asset();
        let mut market = market_at(&asset, 1_000, 500);

        market.accrue(&asset, 3_600).unwrap();
        let once = market.clone();
        market.accrue(&asset, 3_600).unwrap();
        assert_eq!(market, once);

        // A clock that goes backwards is ignored
        market.accrue(&asset, 10).unwrap();
        assert_eq!(market, once);
    }

    #[test]
    fn test_elapsed_overflow() {
        let asset = asset();
        let mut market = market_at(&asset, 1_000, 500);
        market.last_accrual_time = -10;
        let before = market.clone();

        assert_eq!(market.accrue(&asset, i64::MAX), Err(LendingError::MathOverflow));
        assert_eq!(market, before);
    }

    #[test]
    fn test_indices_non_decreasing() {
        let asset = asset();
        let mut market = market_at(&asset, 1_000, 650);

        let mut last_supply = market.supply_index;
        let mut last_borrow = market.borrow_index;
        for step in 1..50 {
            market.accrue(&asset, step * 86_400).unwrap();
            market.refresh_rates(&asset).unwrap();
            assert!(market.supply_index >= last_supply);
            assert!(market.borrow_index >= last_borrow);
            last_supply = market.supply_index;
            last_borrow = market.borrow_index;
        }
    }

    #[test]
    fn test_full_utilization_keeps_debt_covered() {
        let asset = asset();
        let mut market = market_at(&asset, 1_000, 1_000);

        market.accrue(&asset, YEAR).unwrap();

        assert!(market.total_borrowed <= market.total_supplied);
        assert_eq!(market.total_reserves, Wad::ZERO);
    }

    #[test]
    fn test_idle_market_only_moves_clock() {
        let asset = asset();
        let mut market = market_at(&asset, 1_000, 0);

        market.accrue(&asset, YEAR).unwrap();

        assert_eq!(market.total_supplied, Wad::from_num(1_000));
        assert_eq!(market.supply_index, Wad::ONE);
        assert_eq!(market.last_accrual_time, YEAR);
    }

    #[test]
    fn test_projection_leaves_stored_market() {
        let asset = asset();
        let market = market_at(&asset, 1_000, 800);
        let projected = market.projected(&asset, YEAR).unwrap();

        assert_eq!(market.last_accrual_time, 0);
        assert!(projected.total_borrowed > market.total_borrowed);
    }
}
