use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::LendingError;
use crate::interest::InterestRateModel;
use crate::math::Wad;

/// Risk settings owned by the parameter authority
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskParameters {
    /// Share of supplied value that counts as borrowing power
    pub collateral_factor: Wad,

    /// Share of supplied value below which debt becomes liquidatable
    pub liquidation_threshold: Wad,

    /// Share of borrow interest kept as protocol reserves
    pub reserve_factor: Wad,

    /// Whether supplied balances may back debt at all
    pub collateral_enabled: bool,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            collateral_factor: Wad::from_bps(7_500),     // 75%
            liquidation_threshold: Wad::from_bps(8_000), // 80%
            reserve_factor: Wad::from_bps(1_000),        // 10%
            collateral_enabled: true,
        }
    }
}

impl RiskParameters {
    pub fn validate(&self) -> Result<(), LendingError> {
        if self.collateral_factor > Wad::ONE {
            return Err(LendingError::InvalidParameter);
        }

        if self.liquidation_threshold <= self.collateral_factor
            || self.liquidation_threshold > Wad::ONE
        {
            return Err(LendingError::InvalidParameter);
        }

        if self.reserve_factor >= Wad::ONE {
            return Err(LendingError::InvalidParameter);
        }

        Ok(())
    }
}

/// Registry entry for a lendable asset
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub mint: Pubkey,
    pub risk: RiskParameters,
    pub rate_model: InterestRateModel,
}

impl Asset {
    pub fn new(
        mint: Pubkey,
        risk: RiskParameters,
        rate_model: InterestRateModel,
    ) -> Result<Self, LendingError> {
        risk.validate()?;
        rate_model.validate()?;

        Ok(Self {
            mint,
            risk,
            rate_model,
        })
    }

    /// Collateral weight applied to this asset's supplied value
    pub fn collateral_weight(&self) -> Wad {
        if self.risk.collateral_enabled {
            self.risk.collateral_factor
        } else {
            Wad::ZERO
        }
    }

    pub fn liquidation_weight(&self) -> Wad {
        if self.risk.collateral_enabled {
            self.risk.liquidation_threshold
        } else {
            Wad::ZERO
        }
    }
}
