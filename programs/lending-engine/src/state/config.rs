use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::LendingError;
use crate::math::Wad;

/// Upper bound on the liquidation bonus (1.5x)
pub const MAX_LIQUIDATION_BONUS: Wad = Wad::from_bps(15_000);

/// Upper bound on the flash fee (10%)
pub const MAX_FLASH_FEE_RATE: Wad = Wad::from_bps(1_000);

/// Engine-wide settings
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct LendingConfig {
    /// Authority that can list markets and change parameters
    pub authority: Pubkey,

    /// Custody account holding every market's pooled tokens
    pub vault: Pubkey,

    /// Largest share of a debt one liquidation may repay (default: 50%)
    pub close_factor: Wad,

    /// Collateral paid per unit of repaid debt value (default: 1.05)
    pub liquidation_bonus: Wad,

    /// Fee charged on flash borrows (default: 0.09%)
    pub flash_fee_rate: Wad,

    /// Last update timestamp
    pub last_update: i64,
}

impl LendingConfig {
    /// Create default configuration
    pub fn new(authority: Pubkey, vault: Pubkey) -> Self {
        Self {
            authority,
            vault,
            close_factor: Wad::from_bps(5_000),
            liquidation_bonus: Wad::from_bps(10_500),
            flash_fee_rate: Wad::from_bps(9),
            last_update: 0,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), LendingError> {
        if self.close_factor.is_zero() || self.close_factor > Wad::ONE {
            return Err(LendingError::InvalidParameter);
        }

        if self.liquidation_bonus <= Wad::ONE || self.liquidation_bonus > MAX_LIQUIDATION_BONUS {
            return Err(LendingError::InvalidParameter);
        }

        if self.flash_fee_rate > MAX_FLASH_FEE_RATE {
            return Err(LendingError::InvalidParameter);
        }

        if self.vault == self.authority {
            return Err(LendingError::InvalidParameter);
        }

        Ok(())
    }
}
