//! Liquidation of accounts with a health factor below 1.0
//!
//! A liquidator repays part of an unhealthy account's debt and receives the
//! borrower's supplied collateral, worth the repaid value times the
//! liquidation bonus, as a supply position of its own.

use solana_program::{clock::Clock, msg, pubkey::Pubkey};

use crate::{
    changeset::Changeset,
    engine::LendingEngine,
    error::LendingError,
    math::Wad,
    oracle::PriceOracle,
    token::TokenLedger,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationOutcome {
    /// Debt actually repaid, after the close factor cap
    pub repaid: Wad,
    pub collateral_seized: Wad,
    /// Borrower's health factor before and after
    pub health_before: Wad,
    pub health_after: Wad,
}

impl LendingEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn liquidate(
        &mut self,
        tokens: &mut dyn TokenLedger,
        oracle: &dyn PriceOracle,
        clock: &Clock,
        liquidator: &Pubkey,
        borrower: &Pubkey,
        debt_asset: &Pubkey,
        collateral_asset: &Pubkey,
        repay_amount: Wad,
    ) -> Result<LiquidationOutcome, LendingError> {
        self.guarded(|engine| {
            if liquidator == borrower || repay_amount.is_zero() {
                return Err(LendingError::InvalidParameter);
            }

            let now = clock.unix_timestamp;
            let mut changes = Changeset::new(now);

            let before = changes.account_health(engine, borrower, oracle)?;
            if before.is_solvent() {
                msg!(
                    "Borrower {} is healthy: {} (at liquidation threshold {})",
                    borrower,
                    before.health_factor,
                    before.liquidation_health_factor
                );
                return Err(LendingError::PositionHealthy);
            }

            let repaid = {
                let (market, position) = changes.stage(engine, borrower, debt_asset)?;
                let debt = position.borrowed_principal;
                if debt.is_zero() {
                    return Err(LendingError::InsufficientBalance);
                }

                let max_repay = debt.try_mul_ceil(engine.config.close_factor)?.min(debt);
                let repaid = repay_amount.min(max_repay);
                position.borrowed_principal = debt.checked_sub(repaid)?;
                market.total_borrowed = market.total_borrowed.saturating_sub(repaid);
                repaid
            };

            let debt_price = oracle.price(debt_asset, now)?;
            let collateral_price = oracle.price(collateral_asset, now)?;
            let seized = repaid.mul_div_floor(
                debt_price.try_mul(engine.config.liquidation_bonus)?,
                collateral_price,
            )?;

            {
                let collateral_enabled = engine.asset(collateral_asset)?.risk.collateral_enabled;
                let (_, position) = changes.stage(engine, borrower, collateral_asset)?;
                let available = if position.use_as_collateral && collateral_enabled {
                    position.supplied_principal
                } else {
                    Wad::ZERO
                };
                if seized > available {
                    msg!("Seizure {} exceeds available collateral {}", seized, available);
                    return Err(LendingError::InsufficientCollateral);
                }
                position.supplied_principal = position.supplied_principal.checked_sub(seized)?;
            }

            {
                let (_, position) = changes.stage(engine, liquidator, collateral_asset)?;
                position.supplied_principal = position.supplied_principal.checked_add(seized)?;
            }

            let after = changes.account_health(engine, borrower, oracle)?;
            if after.health_factor <= before.health_factor {
                msg!(
                    "Liquidation would move health from {} to {}",
                    before.health_factor,
                    after.health_factor
                );
                return Err(LendingError::LiquidationWorsensHealth);
            }

            let commit = changes.finish(engine)?;
            tokens.transfer(liquidator, &engine.config.vault, debt_asset, repaid)?;
            commit.apply(engine);

            msg!(
                "Liquidated {}: repaid {} of {}, seized {} of {}, health {} -> {}",
                borrower,
                repaid,
                debt_asset,
                seized,
                collateral_asset,
                before.health_factor,
                after.health_factor
            );

            Ok(LiquidationOutcome {
                repaid,
                collateral_seized: seized,
                health_before: before.health_factor,
                health_after: after.health_factor,
            })
        })
    }
}
