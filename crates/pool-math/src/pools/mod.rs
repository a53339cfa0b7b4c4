//! Pool snapshots: the state of a pool at a point in time, together with the
//! operations that can be evaluated against it.

pub mod composable_stable;
pub mod stable;
pub mod weighted;

pub use self::{
    composable_stable::{ComposableStablePool, ComposableStableTokenState},
    stable::{AmplificationParameter, StablePool, StableTokenState},
    weighted::{WeightedPool, WeightedPoolVersion, WeightedTokenState},
};
use {
    crate::{
        config::ProtocolFeeConfig,
        error::Error,
        fixed_point::Bfp,
        price_impact::ZeroPriceImpact,
    },
    serde::Deserialize,
};

/// State shared by all pool types.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommonPoolState {
    /// Pool share supply. For composable stable pools this is the virtual
    /// supply.
    pub total_shares: Bfp,
    /// Invariant recorded when protocol fees were last settled. Required, as
    /// fees are charged on growth past it.
    pub last_invariant: Bfp,
    /// All time high of the weighted pool rate product.
    #[serde(default)]
    pub ath_rate_product: Bfp,
}

/// Protocol fees due since the last settlement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProtocolFee {
    /// Fees paid out in pool tokens, indexed like the pool tokens.
    TokenAmounts(Vec<Bfp>),
    /// Fees paid by minting pool shares to the protocol.
    Bpt {
        ownership_percentage: Bfp,
        amount: Bfp,
    },
}

impl ProtocolFee {
    pub fn is_zero(&self) -> bool {
        match self {
            Self::TokenAmounts(amounts) => amounts.iter().all(Bfp::is_zero),
            Self::Bpt { amount, .. } => amount.is_zero(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "poolType")]
pub enum PoolSnapshot {
    Weighted(WeightedPool),
    Stable(StablePool),
    MetaStable(StablePool),
    ComposableStable(ComposableStablePool),
}

impl PoolSnapshot {
    pub fn common(&self) -> &CommonPoolState {
        match self {
            Self::Weighted(pool) => &pool.common,
            Self::Stable(pool) | Self::MetaStable(pool) => &pool.common,
            Self::ComposableStable(pool) => &pool.common,
        }
    }

    pub fn protocol_fee(&self, config: &ProtocolFeeConfig) -> Result<ProtocolFee, Error> {
        match self {
            Self::Weighted(pool) => pool.protocol_fee(config),
            Self::Stable(pool) | Self::MetaStable(pool) => pool.protocol_fee(config),
            Self::ComposableStable(pool) => pool.protocol_fee(config),
        }
    }
}

impl ZeroPriceImpact for PoolSnapshot {
    fn bpt_zero_price_impact(&self, amounts: &[Bfp]) -> Result<Bfp, Error> {
        match self {
            Self::Weighted(pool) => pool.bpt_zero_price_impact(amounts),
            Self::Stable(pool) | Self::MetaStable(pool) => pool.bpt_zero_price_impact(amounts),
            Self::ComposableStable(pool) => pool.bpt_zero_price_impact(amounts),
        }
    }
}
