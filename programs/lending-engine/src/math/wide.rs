//! 256-bit intermediates for multiply-then-divide.
//!
//! Two `u128` operands always fit a `U256` product, so the only failure modes
//! are a zero divisor and a quotient that does not fit back into `u128`.

use uint::construct_uint;

use crate::error::LendingError;

construct_uint! {
    /// 256-bit unsigned integer
    pub struct U256(4);
}

fn narrow(value: U256) -> Result<u128, LendingError> {
    if value > U256::from(u128::MAX) {
        return Err(LendingError::MathOverflow);
    }
    Ok(value.low_u128())
}

/// `a * b / d`, rounded toward zero
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> Result<u128, LendingError> {
    if d == 0 {
        return Err(LendingError::DivisionByZero);
    }
    narrow(U256::from(a) * U256::from(b) / U256::from(d))
}

/// `a * b / d`, rounded away from zero
pub fn mul_div_ceil(a: u128, b: u128, d: u128) -> Result<u128, LendingError> {
    if d == 0 {
        return Err(LendingError::DivisionByZero);
    }
    let (quotient, remainder) = (U256::from(a) * U256::from(b)).div_mod(U256::from(d));
    let rounded = if remainder.is_zero() {
        quotient
    } else {
        quotient + U256::one()
    };
    narrow(rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_wider_than_u128() {
        // 1e21 * 1e18 overflows u128 but the quotient fits
        let a = 1_000u128 * 10u128.pow(18);
        let b = 10u128.pow(18);
        assert_eq!(mul_div_floor(a, b, b).unwrap(), a);
    }

    #[test]
    fn test_rounding_direction() {
        assert_eq!(mul_div_floor(10, 1, 3).unwrap(), 3);
        assert_eq!(mul_div_ceil(10, 1, 3).unwrap(), 4);
        assert_eq!(mul_div_ceil(9, 1, 3).unwrap(), 3);
    }

    #[test]
    fn test_errors() {
        assert_eq!(mul_div_floor(1, 1, 0), Err(LendingError::DivisionByZero));
        assert_eq!(
            mul_div_floor(u128::MAX, 2, 1),
            Err(LendingError::MathOverflow)
        );
    }
}
