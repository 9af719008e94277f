//! 18-decimal fixed-point arithmetic
//!
//! Every amount, price, rate and index in the engine is a `Wad`. Operations
//! that can lose precision come in a floor and a ceil flavour so callers pick
//! the rounding direction explicitly.

use borsh::{BorshDeserialize, BorshSerialize};
use std::fmt;

use crate::error::LendingError;
use crate::math::wide::{mul_div_ceil, mul_div_floor};

/// Scale of one whole unit
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// One basis point in wad units
const BPS: u128 = 100_000_000_000_000;

#[derive(
    BorshSerialize, BorshDeserialize, Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Wad {
    pub raw: u128,
}

impl Wad {
    pub const ZERO: Wad = Wad { raw: 0 };
    pub const ONE: Wad = Wad { raw: WAD };
    /// Also used as the "no debt" health factor sentinel
    pub const MAX: Wad = Wad { raw: u128::MAX };

    pub const fn from_raw(raw: u128) -> Self {
        Self { raw }
    }

    /// Whole units
    pub const fn from_num(num: u64) -> Self {
        Self {
            raw: num as u128 * WAD,
        }
    }

    /// Basis points (10_000 = 1.0)
    pub const fn from_bps(bps: u16) -> Self {
        Self {
            raw: bps as u128 * BPS,
        }
    }

    pub fn from_fraction(numerator: u64, denominator: u64) -> Result<Self, LendingError> {
        mul_div_floor(numerator as u128, WAD, denominator as u128).map(Self::from_raw)
    }

    pub fn is_zero(&self) -> bool {
        self.raw == 0
    }

    /// Integer part, truncated
    pub fn to_num(&self) -> u128 {
        self.raw / WAD
    }

    pub fn checked_add(self, other: Wad) -> Result<Wad, LendingError> {
        self.raw
            .checked_add(other.raw)
            .map(Wad::from_raw)
            .ok_or(LendingError::MathOverflow)
    }

    pub fn checked_sub(self, other: Wad) -> Result<Wad, LendingError> {
        self.raw
            .checked_sub(other.raw)
            .map(Wad::from_raw)
            .ok_or(LendingError::MathOverflow)
    }

    pub fn saturating_sub(self, other: Wad) -> Wad {
        Wad::from_raw(self.raw.saturating_sub(other.raw))
    }

    /// `self * other`, rounded down
    pub fn try_mul(self, other: Wad) -> Result<Wad, LendingError> {
        mul_div_floor(self.raw, other.raw, WAD).map(Wad::from_raw)
    }

    /// `self * other`, rounded up
    pub fn try_mul_ceil(self, other: Wad) -> Result<Wad, LendingError> {
        mul_div_ceil(self.raw, other.raw, WAD).map(Wad::from_raw)
    }

    /// `self / other`, rounded down
    pub fn try_div(self, other: Wad) -> Result<Wad, LendingError> {
        mul_div_floor(self.raw, WAD, other.raw).map(Wad::from_raw)
    }

    /// `self * mul / div` with a single rounding step, down
    pub fn mul_div_floor(self, mul: Wad, div: Wad) -> Result<Wad, LendingError> {
        mul_div_floor(self.raw, mul.raw, div.raw).map(Wad::from_raw)
    }

    /// `self * mul / div` with a single rounding step, up
    pub fn mul_div_ceil(self, mul: Wad, div: Wad) -> Result<Wad, LendingError> {
        mul_div_ceil(self.raw, mul.raw, div.raw).map(Wad::from_raw)
    }
}

impl fmt::Display for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Wad::MAX {
            return write!(f, "inf");
        }
        write!(f, "{}.{:018}", self.to_num(), self.raw % WAD)
    }
}
