//! Fixed point math for Balancer weighted, stable and composable stable pools:
//! invariants, protocol fee accrual and price impact of joins and exits.
//!
//! All arithmetic is checked and mirrors the rounding of the pool contracts,
//! so results match on-chain values to the wei.

pub mod config;
pub mod error;
pub mod fixed_point;
pub mod math;
pub mod pools;
pub mod price_impact;
pub mod protocol_fees;
pub mod stable_math;
pub mod weighted_math;

pub use self::{
    config::ProtocolFeeConfig,
    error::Error,
    fixed_point::{Bfp, Rounding},
    pools::{PoolSnapshot, ProtocolFee},
    price_impact::{PriceImpact, ZeroPriceImpact},
};
