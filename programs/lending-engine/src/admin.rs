//! Entry points reserved for the configured authority

use solana_program::{clock::Clock, msg, pubkey::Pubkey};

use crate::{
    changeset::Changeset,
    engine::{require_amount, LendingEngine},
    error::LendingError,
    interest::InterestRateModel,
    math::Wad,
    state::{Asset, Market, RiskParameters},
    token::TokenLedger,
};

impl LendingEngine {
    fn require_authority(&self, signer: &Pubkey) -> Result<(), LendingError> {
        if *signer != self.config.authority {
            msg!("Signer {} is not the lending authority", signer);
            return Err(LendingError::Unauthorized);
        }
        Ok(())
    }

    /// List a new asset with an empty market
    pub fn add_market(
        &mut self,
        signer: &Pubkey,
        clock: &Clock,
        mint: &Pubkey,
        risk: RiskParameters,
        rate_model: InterestRateModel,
    ) -> Result<(), LendingError> {
        self.guarded(|engine| {
            engine.require_authority(signer)?;
            if engine.assets.contains_key(mint) {
                return Err(LendingError::MarketAlreadyExists);
            }

            let asset = Asset::new(*mint, risk, rate_model)?;
            let market = Market::new(&asset, clock.unix_timestamp)?;
            engine.assets.insert(*mint, asset);
            engine.markets.insert(*mint, market);

            msg!("Market added for {}", mint);
            Ok(())
        })
    }

    /// Replace risk parameters. Interest up to now is split with the old
    /// reserve factor.
    pub fn update_risk_parameters(
        &mut self,
        signer: &Pubkey,
        clock: &Clock,
        mint: &Pubkey,
        risk: RiskParameters,
    ) -> Result<(), LendingError> {
        self.guarded(|engine| {
            engine.require_authority(signer)?;
            let mut asset = engine.asset(mint)?.clone();
            asset.risk = risk;
            asset.risk.validate()?;
            engine.replace_asset(asset, clock.unix_timestamp)?;

            msg!(
                "Risk parameters for {}: cf {} lt {} rf {}",
                mint,
                risk.collateral_factor,
                risk.liquidation_threshold,
                risk.reserve_factor
            );
            Ok(())
        })
    }

    /// Replace the interest curve. Interest up to now accrues on the old one.
    pub fn update_interest_rate_model(
        &mut self,
        signer: &Pubkey,
        clock: &Clock,
        mint: &Pubkey,
        rate_model: InterestRateModel,
    ) -> Result<(), LendingError> {
        self.guarded(|engine| {
            engine.require_authority(signer)?;
            rate_model.validate()?;
            let mut asset = engine.asset(mint)?.clone();
            asset.rate_model = rate_model;
            engine.replace_asset(asset, clock.unix_timestamp)?;

            msg!("Interest rate model updated for {}", mint);
            Ok(())
        })
    }

    fn replace_asset(&mut self, asset: Asset, now: i64) -> Result<(), LendingError> {
        let mut market = self.projected_market(&asset.mint, now)?;
        market.refresh_rates(&asset)?;
        self.markets.insert(asset.mint, market);
        self.assets.insert(asset.mint, asset);
        Ok(())
    }

    /// Inactive markets refuse new supply, borrows and flash borrows
    pub fn set_market_active(
        &mut self,
        signer: &Pubkey,
        mint: &Pubkey,
        active: bool,
    ) -> Result<(), LendingError> {
        self.guarded(|engine| {
            engine.require_authority(signer)?;
            let market = engine
                .markets
                .get_mut(mint)
                .ok_or(LendingError::MarketNotFound)?;
            market.is_active = active;

            msg!("Market {} active: {}", mint, active);
            Ok(())
        })
    }

    /// Update engine-wide parameters; `None` keeps the current value
    pub fn update_config(
        &mut self,
        signer: &Pubkey,
        clock: &Clock,
        close_factor: Option<Wad>,
        liquidation_bonus: Option<Wad>,
        flash_fee_rate: Option<Wad>,
    ) -> Result<(), LendingError> {
        self.guarded(|engine| {
            engine.require_authority(signer)?;
            let mut config = engine.config.clone();

            if let Some(close_factor) = close_factor {
                config.close_factor = close_factor;
            }
            if let Some(liquidation_bonus) = liquidation_bonus {
                config.liquidation_bonus = liquidation_bonus;
            }
            if let Some(flash_fee_rate) = flash_fee_rate {
                config.flash_fee_rate = flash_fee_rate;
            }
            config.last_update = clock.unix_timestamp;
            config.validate()?;
            engine.config = config;

            msg!("Lending config updated");
            Ok(())
        })
    }

    /// Pay accumulated reserves of `mint` out of the vault
    pub fn withdraw_reserves(
        &mut self,
        signer: &Pubkey,
        tokens: &mut dyn TokenLedger,
        clock: &Clock,
        mint: &Pubkey,
        amount: Wad,
        recipient: &Pubkey,
    ) -> Result<(), LendingError> {
        self.guarded(|engine| {
            engine.require_authority(signer)?;
            require_amount(amount)?;

            let mut changes = Changeset::new(clock.unix_timestamp);
            let market = changes.market_mut(engine, mint)?;
            if market.total_reserves < amount {
                return Err(LendingError::InsufficientBalance);
            }
            market.total_reserves = market.total_reserves.checked_sub(amount)?;

            let commit = changes.finish(engine)?;
            tokens.transfer(&engine.config.vault, recipient, mint, amount)?;
            commit.apply(engine);

            msg!("Withdrew {} reserves of {} to {}", amount, mint, recipient);
            Ok(())
        })
    }
}
