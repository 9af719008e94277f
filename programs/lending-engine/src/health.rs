//! Account valuation
//!
//! Health is always recomputed from positions, market indices and live
//! prices. Nothing here is cached between calls.

use crate::error::LendingError;
use crate::math::Wad;
use crate::oracle::PriceOracle;
use crate::state::{Asset, Market, Position};

/// Valuation of one account at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountHealth {
    /// Supplied value weighted by collateral factors
    pub collateral_value: Wad,
    /// Supplied value weighted by liquidation thresholds
    pub liquidation_collateral_value: Wad,
    pub debt_value: Wad,
    /// `collateral_value / debt_value`, `Wad::MAX` without debt
    pub health_factor: Wad,
    /// `liquidation_collateral_value / debt_value`, `Wad::MAX` without debt.
    /// Reported only, liquidation is gated on `health_factor`.
    pub liquidation_health_factor: Wad,
}

impl AccountHealth {
    /// Health factor >= 1.0, compared without dividing
    pub fn is_solvent(&self) -> bool {
        self.collateral_value >= self.debt_value
    }
}

/// One position together with the market and registry entry it belongs to
pub struct PositionEntry<'a> {
    pub position: &'a Position,
    pub market: &'a Market,
    pub asset: &'a Asset,
}

/// Price every non-empty position and sum collateral and debt.
///
/// Collateral rounds down, debt rounds up. Oracle errors propagate.
pub fn evaluate_account<'a>(
    entries: impl IntoIterator<Item = PositionEntry<'a>>,
    oracle: &dyn PriceOracle,
    now: i64,
) -> Result<AccountHealth, LendingError> {
    let mut collateral_value = Wad::ZERO;
    let mut liquidation_collateral_value = Wad::ZERO;
    let mut debt_value = Wad::ZERO;

    for entry in entries {
        let supplied = entry.position.supplied_balance(entry.market)?;
        let borrowed = entry.position.borrowed_balance(entry.market)?;
        if supplied.is_zero() && borrowed.is_zero() {
            continue;
        }

        let price = oracle.price(&entry.asset.mint, now)?;

        if !supplied.is_zero() && entry.position.use_as_collateral {
            let value = supplied.try_mul(price)?;
            collateral_value =
                collateral_value.checked_add(value.try_mul(entry.asset.collateral_weight())?)?;
            liquidation_collateral_value = liquidation_collateral_value
                .checked_add(value.try_mul(entry.asset.liquidation_weight())?)?;
        }

        if !borrowed.is_zero() {
            debt_value = debt_value.checked_add(borrowed.try_mul_ceil(price)?)?;
        }
    }

    Ok(AccountHealth {
        collateral_value,
        liquidation_collateral_value,
        debt_value,
        health_factor: ratio(collateral_value, debt_value)?,
        liquidation_health_factor: ratio(liquidation_collateral_value, debt_value)?,
    })
}

fn ratio(collateral: Wad, debt: Wad) -> Result<Wad, LendingError> {
    if debt.is_zero() {
        return Ok(Wad::MAX);
    }
    collateral.try_div(debt)
}

/// Convenience for callers holding owned triples
pub fn evaluate_owned(
    entries: &[(Position, Market, Asset)],
    oracle: &dyn PriceOracle,
    now: i64,
) -> Result<AccountHealth, LendingError> {
    evaluate_account(
        entries.iter().map(|(position, market, asset)| PositionEntry {
            position,
            market,
            asset,
        }),
        oracle,
        now,
    )
}
