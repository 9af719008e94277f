//! Flash borrows
//!
//! Liquidity leaves the vault, the borrower's callback runs, and the vault
//! must hold the borrowed amount plus the fee when it returns. Every token
//! movement in between goes through a journal so a failed borrow can be
//! unwound completely.

use solana_program::{clock::Clock, msg, pubkey::Pubkey};

use crate::{
    changeset::Changeset,
    engine::{require_amount, LendingEngine},
    error::LendingError,
    math::Wad,
    token::{JournaledLedger, TokenLedger},
};

/// Terms of an open flash borrow, handed to the callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashBorrowRecord {
    pub borrower: Pubkey,
    pub asset: Pubkey,
    pub amount: Wad,
    /// Owed on top of `amount`, rounded up
    pub fee: Wad,
}

impl FlashBorrowRecord {
    pub fn amount_due(&self) -> Result<Wad, LendingError> {
        self.amount.checked_add(self.fee)
    }
}

impl LendingEngine {
    /// Lend `amount` for the duration of `callback`.
    ///
    /// The callback gets read-only access to the engine and the ledger it
    /// must use to return funds to the vault. Any surplus over the fee is
    /// kept as reserves.
    pub fn flash_borrow<F>(
        &mut self,
        tokens: &mut dyn TokenLedger,
        clock: &Clock,
        borrower: &Pubkey,
        asset: &Pubkey,
        amount: Wad,
        callback: F,
    ) -> Result<FlashBorrowRecord, LendingError>
    where
        F: FnOnce(&LendingEngine, &mut dyn TokenLedger, &FlashBorrowRecord) -> Result<(), LendingError>,
    {
        self.guarded(|engine| {
            require_amount(amount)?;
            let mut changes = Changeset::new(clock.unix_timestamp);

            let market = changes.market_mut(engine, asset)?;
            if !market.is_active {
                return Err(LendingError::MarketInactive);
            }
            if market.available_liquidity() < amount {
                return Err(LendingError::InsufficientLiquidity);
            }

            let record = FlashBorrowRecord {
                borrower: *borrower,
                asset: *asset,
                amount,
                fee: amount.try_mul_ceil(engine.config.flash_fee_rate)?,
            };
            let vault = engine.config.vault;

            let mut journal = JournaledLedger::new(tokens);
            let settled = run_borrow(&*engine, &mut journal, &vault, &record, callback).and_then(
                |surplus| {
                    let market = changes.market_mut(engine, asset)?;
                    market.total_reserves = market.total_reserves.checked_add(surplus)?;
                    changes.finish(engine)
                },
            );

            match settled {
                Ok(commit) => {
                    commit.apply(engine);
                    msg!(
                        "Flash borrow of {} {} by {} repaid, fee {}",
                        amount,
                        asset,
                        borrower,
                        record.fee
                    );
                    Ok(record)
                }
                Err(err) => {
                    msg!("Flash borrow by {} failed: {}, unwinding {} transfers", borrower, err, journal.len());
                    journal.rollback()?;
                    Err(err)
                }
            }
        })
    }
}

/// Lend, call back, and check repayment. Returns the vault's gain.
fn run_borrow<F>(
    engine: &LendingEngine,
    ledger: &mut JournaledLedger<'_>,
    vault: &Pubkey,
    record: &FlashBorrowRecord,
    callback: F,
) -> Result<Wad, LendingError>
where
    F: FnOnce(&LendingEngine, &mut dyn TokenLedger, &FlashBorrowRecord) -> Result<(), LendingError>,
{
    let balance_before = ledger.balance_of(vault, &record.asset);
    ledger.transfer(vault, &record.borrower, &record.asset, record.amount)?;

    callback(engine, ledger, record)?;

    let balance_after = ledger.balance_of(vault, &record.asset);
    let required = balance_before.checked_add(record.fee)?;
    if balance_after < required {
        return Err(LendingError::FlashBorrowNotRepaid);
    }
    balance_after.checked_sub(balance_before)
}
