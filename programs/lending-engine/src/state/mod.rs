pub mod asset;
pub mod config;
pub mod market;
pub mod position;

pub use asset::*;
pub use config::*;
pub use market::*;
pub use position::*;
