use solana_program::{
    clock::Clock, entrypoint::ProgramResult, msg, program_error::PrintProgramError,
    pubkey::Pubkey,
};

use crate::{
    engine::LendingEngine, error::LendingError, instruction::LendingInstruction,
    oracle::PriceOracle, token::TokenLedger,
};

pub struct Processor;

impl Processor {
    /// Decode `instruction_data` and run it against `engine` on behalf of
    /// `signer`
    pub fn process(
        engine: &mut LendingEngine,
        tokens: &mut dyn TokenLedger,
        oracle: &dyn PriceOracle,
        clock: &Clock,
        signer: &Pubkey,
        instruction_data: &[u8],
    ) -> ProgramResult {
        let result = Self::dispatch(engine, tokens, oracle, clock, signer, instruction_data);
        if let Err(error) = &result {
            error.print::<LendingError>();
        }
        result
    }

    fn dispatch(
        engine: &mut LendingEngine,
        tokens: &mut dyn TokenLedger,
        oracle: &dyn PriceOracle,
        clock: &Clock,
        signer: &Pubkey,
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = LendingInstruction::unpack(instruction_data)?;

        match instruction {
            LendingInstruction::AddMarket {
                asset,
                risk,
                rate_model,
            } => {
                msg!("Instruction: AddMarket");
                engine.add_market(signer, clock, &asset, risk, rate_model)?;
            }
            LendingInstruction::UpdateRiskParameters { asset, risk } => {
                msg!("Instruction: UpdateRiskParameters");
                engine.update_risk_parameters(signer, clock, &asset, risk)?;
            }
            LendingInstruction::UpdateInterestRateModel { asset, rate_model } => {
                msg!("Instruction: UpdateInterestRateModel");
                engine.update_interest_rate_model(signer, clock, &asset, rate_model)?;
            }
            LendingInstruction::SetMarketActive { asset, active } => {
                msg!("Instruction: SetMarketActive");
                engine.set_market_active(signer, &asset, active)?;
            }
            LendingInstruction::UpdateConfig {
                close_factor,
                liquidation_bonus,
                flash_fee_rate,
            } => {
                msg!("Instruction: UpdateConfig");
                engine.update_config(signer, clock, close_factor, liquidation_bonus, flash_fee_rate)?;
            }
            LendingInstruction::WithdrawReserves {
                asset,
                amount,
                recipient,
            } => {
                msg!("Instruction: WithdrawReserves");
                engine.withdraw_reserves(signer, tokens, clock, &asset, amount, &recipient)?;
            }
            LendingInstruction::Supply { asset, amount } => {
                msg!("Instruction: Supply");
                engine.supply(tokens, clock, signer, &asset, amount)?;
            }
            LendingInstruction::Withdraw { asset, amount } => {
                msg!("Instruction: Withdraw");
                engine.withdraw(tokens, oracle, clock, signer, &asset, amount)?;
            }
            LendingInstruction::Borrow { asset, amount } => {
                msg!("Instruction: Borrow");
                engine.borrow(tokens, oracle, clock, signer, &asset, amount)?;
            }
            LendingInstruction::Repay { asset, amount } => {
                msg!("Instruction: Repay");
                let outcome = engine.repay(tokens, clock, signer, &asset, amount)?;
                msg!("Remaining debt: {}", outcome.remaining_debt);
            }
            LendingInstruction::SetCollateral { asset, enabled } => {
                msg!("Instruction: SetCollateral");
                engine.set_collateral(oracle, clock, signer, &asset, enabled)?;
            }
            LendingInstruction::Liquidate {
                borrower,
                debt_asset,
                collateral_asset,
                amount,
            } => {
                msg!("Instruction: Liquidate");
                engine.liquidate(
                    tokens,
                    oracle,
                    clock,
                    signer,
                    &borrower,
                    &debt_asset,
                    &collateral_asset,
                    amount,
                )?;
            }
        }

        Ok(())
    }
}
