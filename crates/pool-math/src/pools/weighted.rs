use {
    super::{CommonPoolState, ProtocolFee},
    crate::{
        config::ProtocolFeeConfig,
        error::Error,
        fixed_point::Bfp,
        price_impact::{ZeroPriceImpact, weighted_bpt_zero_price_impact},
        protocol_fees,
        weighted_math,
    },
    serde::Deserialize,
};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedPool {
    #[serde(flatten)]
    pub common: CommonPoolState,
    pub tokens: Vec<WeightedTokenState>,
    #[serde(default)]
    pub version: WeightedPoolVersion,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightedTokenState {
    pub balance: Bfp,
    pub weight: Bfp,
    #[serde(default = "Bfp::one")]
    pub price_rate: Bfp,
    #[serde(default)]
    pub exempt_from_yield_fee: bool,
}

/// Generation of the weighted pool contracts, which determines how protocol
/// fees are paid.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum WeightedPoolVersion {
    /// Swap fees are paid in the token with the largest weight.
    #[default]
    V1,
    /// Swap and yield fees are paid by minting pool shares.
    V2,
}

impl WeightedPool {
    pub fn weights(&self) -> Vec<Bfp> {
        self.tokens.iter().map(|token| token.weight).collect()
    }

    pub fn balances(&self) -> Vec<Bfp> {
        self.tokens.iter().map(|token| token.balance).collect()
    }

    pub fn invariant(&self) -> Result<Bfp, Error> {
        weighted_math::calculate_invariant(&self.weights(), &self.balances())
    }

    pub fn rate_product(&self) -> Result<Bfp, Error> {
        let rates = self
            .tokens
            .iter()
            .map(|token| token.price_rate)
            .collect::<Vec<_>>();
        let exempt = self
            .tokens
            .iter()
            .map(|token| token.exempt_from_yield_fee)
            .collect::<Vec<_>>();
        weighted_math::calculate_rate_product(&self.weights(), &rates, &exempt)
    }

    pub fn protocol_fee(&self, config: &ProtocolFeeConfig) -> Result<ProtocolFee, Error> {
        let current_invariant = self.invariant()?;
        match self.version {
            WeightedPoolVersion::V1 => {
                let amounts = protocol_fees::weighted::calculate_due_protocol_fee_amounts(
                    &self.weights(),
                    &self.balances(),
                    self.common.last_invariant,
                    current_invariant,
                    config.swap_fee_percentage,
                    config.min_pow_base_free_exponent,
                )?;
                tracing::debug!(?amounts, "weighted pool protocol fees");
                Ok(ProtocolFee::TokenAmounts(amounts))
            }
            WeightedPoolVersion::V2 => {
                let ownership = weighted_math::calculate_swap_yield_ownership_pct(
                    self.common.last_invariant,
                    current_invariant,
                    config.swap_fee_percentage,
                    self.common.ath_rate_product,
                    self.rate_product()?,
                    config.yield_fee_percentage,
                )?;
                let ownership_percentage = ownership.total()?;
                let amount = protocol_fees::weighted::calculate_due_bpt_protocol_fee_amount(
                    self.common.total_shares,
                    ownership_percentage,
                )?;
                tracing::debug!(?ownership, ?amount, "weighted pool protocol fees");
                Ok(ProtocolFee::Bpt {
                    ownership_percentage,
                    amount,
                })
            }
        }
    }
}

impl ZeroPriceImpact for WeightedPool {
    fn bpt_zero_price_impact(&self, amounts: &[Bfp]) -> Result<Bfp, Error> {
        weighted_bpt_zero_price_impact(
            &self.weights(),
            &self.balances(),
            self.common.total_shares,
            amounts,
        )
    }
}
