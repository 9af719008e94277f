use num_derive::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Every failure aborts the whole operation. Discriminants are stable because
/// they travel inside `ProgramError::Custom`.
#[derive(Error, Debug, Copy, Clone, FromPrimitive, PartialEq, Eq)]
pub enum LendingError {
    #[error("Market not found")]
    MarketNotFound = 0,

    #[error("Market inactive")]
    MarketInactive = 1,

    #[error("Market already exists")]
    MarketAlreadyExists = 2,

    #[error("Insufficient liquidity")]
    InsufficientLiquidity = 3,

    #[error("Insufficient collateral")]
    InsufficientCollateral = 4,

    #[error("Insufficient balance")]
    InsufficientBalance = 5,

    #[error("Position is healthy")]
    PositionHealthy = 6,

    #[error("Liquidation does not improve position health")]
    LiquidationWorsensHealth = 7,

    #[error("Flash borrow not repaid")]
    FlashBorrowNotRepaid = 8,

    #[error("Reentrant call")]
    ReentrantCall = 9,

    #[error("Price data stale")]
    StalePrice = 10,

    #[error("No price feed")]
    NoPriceFeed = 11,

    #[error("Invalid parameter")]
    InvalidParameter = 12,

    #[error("Unauthorized")]
    Unauthorized = 13,

    #[error("Arithmetic overflow")]
    MathOverflow = 14,

    #[error("Division by zero")]
    DivisionByZero = 15,

    #[error("Invalid instruction")]
    InvalidInstruction = 16,

    #[error("Invalid state data")]
    InvalidStateData = 17,
}

impl PrintProgramError for LendingError {
    fn print<E>(&self) {
        msg!("LendingError: {}", self);
    }
}

impl From<LendingError> for ProgramError {
    fn from(e: LendingError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for LendingError {
    fn type_of() -> &'static str {
        "LendingError"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn test_custom_code_round_trip() {
        let err: ProgramError = LendingError::FlashBorrowNotRepaid.into();
        assert_eq!(err, ProgramError::Custom(8));

        match err {
            ProgramError::Custom(code) => {
                assert_eq!(
                    LendingError::from_u32(code),
                    Some(LendingError::FlashBorrowNotRepaid)
                );
            }
            _ => panic!("expected custom error"),
        }
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(LendingError::from_u32(999), None);
    }
}
