//! Price collaborator
//!
//! Oracle failures always propagate. The engine never substitutes a default
//! price.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;
use std::collections::BTreeMap;

use crate::error::LendingError;
use crate::math::Wad;

pub trait PriceOracle {
    /// Unit price of `asset` at `now`, or `StalePrice` / `NoPriceFeed`
    fn price(&self, asset: &Pubkey, now: i64) -> Result<Wad, LendingError>;
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceFeed {
    pub price: Wad,
    pub published_at: i64,
}

/// In-memory feed table with a maximum price age
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceBook {
    feeds: BTreeMap<Pubkey, PriceFeed>,
    /// Seconds a published price stays usable
    pub max_age: i64,
}

impl PriceBook {
    pub fn new(max_age: i64) -> Self {
        Self {
            feeds: BTreeMap::new(),
            max_age,
        }
    }

    pub fn set_price(&mut self, asset: &Pubkey, price: Wad, published_at: i64) {
        self.feeds.insert(
            *asset,
            PriceFeed {
                price,
                published_at,
            },
        );
    }

    pub fn remove(&mut self, asset: &Pubkey) -> Option<PriceFeed> {
        self.feeds.remove(asset)
    }
}

impl PriceOracle for PriceBook {
    fn price(&self, asset: &Pubkey, now: i64) -> Result<Wad, LendingError> {
        let feed = self.feeds.get(asset).ok_or(LendingError::NoPriceFeed)?;

        if feed.price.is_zero() {
            return Err(LendingError::NoPriceFeed);
        }

        if now.saturating_sub(feed.published_at) > self.max_age {
            return Err(LendingError::StalePrice);
        }

        Ok(feed.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_lookup() {
        let asset = Pubkey::new_unique();
        let mut book = PriceBook::new(60);

        assert_eq!(book.price(&asset, 0), Err(LendingError::NoPriceFeed));

        book.set_price(&asset, Wad::ONE, 100);
        assert_eq!(book.price(&asset, 160), Ok(Wad::ONE));
        assert_eq!(book.price(&asset, 161), Err(LendingError::StalePrice));
    }

    #[test]
    fn test_zero_price_is_missing() {
        let asset = Pubkey::new_unique();
        let mut book = PriceBook::new(60);
        book.set_price(&asset, Wad::ZERO, 0);
        assert_eq!(book.price(&asset, 0), Err(LendingError::NoPriceFeed));
    }
}
