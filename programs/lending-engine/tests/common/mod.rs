#![allow(dead_code)]

use lending_engine::{
    interest::InterestRateModel,
    oracle::PriceBook,
    state::{LendingConfig, RiskParameters},
    token::{InMemoryTokenLedger, TokenLedger},
    AccountHealth, LendingEngine, LendingError, LiquidationOutcome, PositionView, RepayOutcome,
    Wad,
};
use solana_program::{clock::Clock, pubkey::Pubkey};

pub const YEAR: i64 = 31_536_000;

pub fn units(n: u64) -> Wad {
    Wad::from_num(n)
}

/// Engine with a collateral market and a debt market, both priced at 1.0
pub struct Fixture {
    pub engine: LendingEngine,
    pub tokens: InMemoryTokenLedger,
    pub prices: PriceBook,
    pub authority: Pubkey,
    pub vault: Pubkey,
    pub collateral: Pubkey,
    pub debt: Pubkey,
    pub now: i64,
}

impl Fixture {
    pub fn new() -> Self {
        let authority = Pubkey::new_unique();
        let vault = Pubkey::new_unique();
        let collateral = Pubkey::new_unique();
        let debt = Pubkey::new_unique();

        let mut engine = LendingEngine::new(LendingConfig::new(authority, vault)).unwrap();
        let clock = Clock::default();
        for mint in [&collateral, &debt] {
            engine
                .add_market(
                    &authority,
                    &clock,
                    mint,
                    RiskParameters::default(),
                    InterestRateModel::default(),
                )
                .unwrap();
        }

        let mut prices = PriceBook::new(i64::MAX);
        prices.set_price(&collateral, Wad::ONE, 0);
        prices.set_price(&debt, Wad::ONE, 0);

        Self {
            engine,
            tokens: InMemoryTokenLedger::new(),
            prices,
            authority,
            vault,
            collateral,
            debt,
            now: 0,
        }
    }

    pub fn clock(&self) -> Clock {
        Clock {
            unix_timestamp: self.now,
            ..Clock::default()
        }
    }

    pub fn advance(&mut self, seconds: i64) {
        self.now += seconds;
    }

    pub fn set_price(&mut self, asset: &Pubkey, price: Wad) {
        let now = self.now;
        self.prices.set_price(asset, price, now);
    }

    pub fn fund(&mut self, owner: &Pubkey, asset: &Pubkey, amount: Wad) {
        self.tokens.mint(owner, asset, amount).unwrap();
    }

    pub fn balance(&self, owner: &Pubkey, asset: &Pubkey) -> Wad {
        self.tokens.balance_of(owner, asset)
    }

    /// Fund `account` and supply everything
    pub fn deposit(&mut self, account: &Pubkey, asset: &Pubkey, amount: Wad) {
        self.fund(account, asset, amount);
        self.supply(account, asset, amount).unwrap();
    }

    pub fn supply(&mut self, account: &Pubkey, asset: &Pubkey, amount: Wad) -> Result<(), LendingError> {
        let clock = self.clock();
        self.engine.supply(&mut self.tokens, &clock, account, asset, amount)
    }

    pub fn withdraw(&mut self, account: &Pubkey, asset: &Pubkey, amount: Wad) -> Result<(), LendingError> {
        let clock = self.clock();
        self.engine
            .withdraw(&mut self.tokens, &self.prices, &clock, account, asset, amount)
    }

    pub fn borrow(&mut self, account: &Pubkey, asset: &Pubkey, amount: Wad) -> Result<(), LendingError> {
        let clock = self.clock();
        self.engine
            .borrow(&mut self.tokens, &self.prices, &clock, account, asset, amount)
    }

    pub fn repay(
        &mut self,
        account: &Pubkey,
        asset: &Pubkey,
        amount: Wad,
    ) -> Result<RepayOutcome, LendingError> {
        let clock = self.clock();
        self.engine.repay(&mut self.tokens, &clock, account, asset, amount)
    }

    pub fn set_collateral(&mut self, account: &Pubkey, asset: &Pubkey, enabled: bool) -> Result<(), LendingError> {
        let clock = self.clock();
        self.engine
            .set_collateral(&self.prices, &clock, account, asset, enabled)
    }

    pub fn liquidate(
        &mut self,
        liquidator: &Pubkey,
        borrower: &Pubkey,
        amount: Wad,
    ) -> Result<LiquidationOutcome, LendingError> {
        let clock = self.clock();
        let (debt, collateral) = (self.debt, self.collateral);
        self.engine.liquidate(
            &mut self.tokens,
            &self.prices,
            &clock,
            liquidator,
            borrower,
            &debt,
            &collateral,
            amount,
        )
    }

    pub fn health(&self, account: &Pubkey) -> AccountHealth {
        self.engine
            .account_health(account, &self.prices, &self.clock())
            .unwrap()
    }

    pub fn position(&self, account: &Pubkey, asset: &Pubkey) -> PositionView {
        self.engine.position(account, asset, &self.clock()).unwrap()
    }

    /// Serialized engine state and token balances
    pub fn snapshot(&self) -> (Vec<u8>, InMemoryTokenLedger) {
        (self.engine.save().unwrap(), self.tokens.clone())
    }
}
