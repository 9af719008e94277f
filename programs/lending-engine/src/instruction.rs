use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::LendingError;
use crate::interest::InterestRateModel;
use crate::math::Wad;
use crate::state::RiskParameters;

/// Serialized entry points. The signer is passed alongside the data.
/// Flash borrows need a callback and are only reachable through
/// `LendingEngine::flash_borrow`.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum LendingInstruction {
    /// List an asset
    /// Signer: authority
    AddMarket {
        asset: Pubkey,
        risk: RiskParameters,
        rate_model: InterestRateModel,
    },

    /// Signer: authority
    UpdateRiskParameters {
        asset: Pubkey,
        risk: RiskParameters,
    },

    /// Signer: authority
    UpdateInterestRateModel {
        asset: Pubkey,
        rate_model: InterestRateModel,
    },

    /// Signer: authority
    SetMarketActive {
        asset: Pubkey,
        active: bool,
    },

    /// Update engine-wide parameters; `None` keeps the current value
    /// Signer: authority
    UpdateConfig {
        close_factor: Option<Wad>,
        liquidation_bonus: Option<Wad>,
        flash_fee_rate: Option<Wad>,
    },

    /// Signer: authority
    WithdrawReserves {
        asset: Pubkey,
        amount: Wad,
        recipient: Pubkey,
    },

    /// Signer: supplier
    Supply {
        asset: Pubkey,
        amount: Wad,
    },

    /// Signer: supplier
    Withdraw {
        asset: Pubkey,
        amount: Wad,
    },

    /// Signer: borrower
    Borrow {
        asset: Pubkey,
        amount: Wad,
    },

    /// Signer: borrower
    Repay {
        asset: Pubkey,
        amount: Wad,
    },

    /// Signer: position owner
    SetCollateral {
        asset: Pubkey,
        enabled: bool,
    },

    /// Signer: liquidator
    Liquidate {
        borrower: Pubkey,
        debt_asset: Pubkey,
        collateral_asset: Pubkey,
        amount: Wad,
    },
}

impl LendingInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, LendingError> {
        Self::try_from_slice(input).map_err(|_| LendingError::InvalidInstruction)
    }

    pub fn pack(&self) -> Result<Vec<u8>, LendingError> {
        self.try_to_vec().map_err(|_| LendingError::InvalidInstruction)
    }
}
