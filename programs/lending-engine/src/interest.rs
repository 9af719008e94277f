//! Utilization-based interest rate model
//!
//! Borrow rate is piecewise linear with a single kink:
//!
//! ```text
//! u <= kink: base + slope_low * u
//! u >  kink: base + slope_low * kink + slope_high * (u - kink)
//! ```
//!
//! Both segments meet at the kink, so the curve is continuous and
//! non-decreasing for any non-negative slopes.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::LendingError;
use crate::math::Wad;

/// Seconds in a 365-day year
pub const SECONDS_PER_YEAR: u128 = 31_536_000;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterestRateModel {
    /// Annual borrow rate at zero utilization
    pub base_rate: Wad,
    /// Rate added per unit of utilization below the kink
    pub slope_low: Wad,
    /// Rate added per unit of utilization above the kink
    pub slope_high: Wad,
    /// Target utilization where the slope changes
    pub optimal_utilization: Wad,
}

impl Default for InterestRateModel {
    fn default() -> Self {
        Self {
            base_rate: Wad::from_bps(200),            // 2%
            slope_low: Wad::from_bps(1_500),          // +15% at full utilization
            slope_high: Wad::from_bps(30_000),        // 300%
            optimal_utilization: Wad::from_bps(8_000), // 80%
        }
    }
}

impl InterestRateModel {
    pub fn validate(&self) -> Result<(), LendingError> {
        if self.optimal_utilization.is_zero() || self.optimal_utilization >= Wad::ONE {
            return Err(LendingError::InvalidParameter);
        }
        Ok(())
    }

    /// Annual borrow rate at utilization `u`
    pub fn borrow_rate(&self, utilization: Wad) -> Result<Wad, LendingError> {
        let u = utilization.min(Wad::ONE);

        if u <= self.optimal_utilization {
            return self.base_rate.checked_add(self.slope_low.try_mul(u)?);
        }

        let at_kink = self
            .base_rate
            .checked_add(self.slope_low.try_mul(self.optimal_utilization)?)?;
        let excess = u.checked_sub(self.optimal_utilization)?;
        at_kink.checked_add(self.slope_high.try_mul(excess)?)
    }

    /// Annual supply rate: borrow rate scaled by utilization, net of reserves
    pub fn supply_rate(&self, utilization: Wad, reserve_factor: Wad) -> Result<Wad, LendingError> {
        let u = utilization.min(Wad::ONE);
        let kept = Wad::ONE.checked_sub(reserve_factor)?;
        self.borrow_rate(u)?.try_mul(u)?.try_mul(kept)
    }
}

/// Borrowed share of supplied liquidity, 0 for an empty market, capped at 1.0
pub fn utilization(total_supplied: Wad, total_borrowed: Wad) -> Result<Wad, LendingError> {
    if total_supplied.is_zero() {
        return Ok(Wad::ZERO);
    }
    Ok(total_borrowed.try_div(total_supplied)?.min(Wad::ONE))
}
