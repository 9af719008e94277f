//! Collateralized lending engine
//!
//! Markets accrue interest lazily through rebasing indices, accounts borrow
//! against risk-weighted collateral, unhealthy accounts can be liquidated
//! for a bonus, and flash borrows run atomically inside a callback. Token
//! custody and prices come from the `TokenLedger` and `PriceOracle`
//! collaborators passed into each call.

pub mod admin;
pub mod changeset;
pub mod engine;
pub mod error;
pub mod flash;
pub mod health;
pub mod instruction;
pub mod interest;
pub mod liquidation;
pub mod math;
pub mod oracle;
pub mod processor;
pub mod state;
pub mod token;

pub use engine::{LendingEngine, PositionView, RepayOutcome};
pub use error::LendingError;
pub use flash::FlashBorrowRecord;
pub use health::AccountHealth;
pub use liquidation::LiquidationOutcome;
pub use math::Wad;
