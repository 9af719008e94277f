pub mod fixed_point;
pub mod wide;

pub use fixed_point::*;
pub use wide::{mul_div_ceil, mul_div_floor, U256};
