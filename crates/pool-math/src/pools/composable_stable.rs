//! Composable stable pools hold their own pool share token among the pool
//! tokens. It is excluded from all invariant math and the supply used for
//! pricing is the virtual supply, i.e. shares not held by the pool itself.

use {
    super::{CommonPoolState, ProtocolFee, stable::AmplificationParameter},
    crate::{
        config::ProtocolFeeConfig,
        error::Error,
        fixed_point::Bfp,
        price_impact::{ZeroPriceImpact, stable_bpt_zero_price_impact},
        protocol_fees::composable_stable::{
            SwapYieldFeeInputs,
            calculate_due_bpt_protocol_fee_amount,
            calculate_swap_yield_fee_pct,
        },
        stable_math::AMP_PRECISION,
    },
    serde::Deserialize,
};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposableStablePool {
    #[serde(flatten)]
    pub common: CommonPoolState,
    /// All pool tokens, including the pool share token at `bpt_index`.
    pub tokens: Vec<ComposableStableTokenState>,
    pub amplification_parameter: AmplificationParameter,
    pub bpt_index: usize,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComposableStableTokenState {
    pub balance: Bfp,
    #[serde(default = "Bfp::one")]
    pub price_rate: Bfp,
    /// Rate cached at the last fee settlement, the current rate if unset.
    #[serde(default)]
    pub old_price_rate: Option<Bfp>,
    #[serde(default)]
    pub exempt_from_yield_fee: bool,
}

impl ComposableStablePool {
    /// The pool tokens without the pool share token.
    fn pool_tokens(&self) -> Result<Vec<ComposableStableTokenState>, Error> {
        if self.bpt_index >= self.tokens.len() {
            return Err(Error::OutOfBounds);
        }
        Ok(self
            .tokens
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != self.bpt_index)
            .map(|(_, token)| *token)
            .collect())
    }

    pub fn amplification(&self) -> Result<primitive_types::U256, Error> {
        self.amplification_parameter.with_base(AMP_PRECISION)
    }

    /// Pool shares minted to the protocol for swap and yield fees accrued
    /// since the last settlement.
    pub fn protocol_fee(&self, config: &ProtocolFeeConfig) -> Result<ProtocolFee, Error> {
        let tokens = self.pool_tokens()?;
        let balances = tokens
            .iter()
            .map(|token| token.balance.mul_down(token.price_rate))
            .collect::<Result<Vec<_>, _>>()?;
        let current_price_rates = tokens.iter().map(|token| token.price_rate).collect::<Vec<_>>();
        let old_price_rates = tokens
            .iter()
            .map(|token| token.old_price_rate.unwrap_or(token.price_rate))
            .collect::<Vec<_>>();
        let exempt_from_yield_fee = tokens
            .iter()
            .map(|token| token.exempt_from_yield_fee)
            .collect::<Vec<_>>();

        let ownership_percentage = calculate_swap_yield_fee_pct(&SwapYieldFeeInputs {
            amplification_parameter: self.amplification()?,
            balances: &balances,
            last_invariant: self.common.last_invariant,
            current_price_rates: &current_price_rates,
            old_price_rates: &old_price_rates,
            exempt_from_yield_fee: &exempt_from_yield_fee,
            protocol_swap_fee_percentage: config.swap_fee_percentage,
            protocol_yield_fee_percentage: config.yield_fee_percentage,
        })?;
        let amount =
            calculate_due_bpt_protocol_fee_amount(self.common.total_shares, ownership_percentage)?;
        tracing::debug!(?ownership_percentage, ?amount, "composable stable pool protocol fees");
        Ok(ProtocolFee::Bpt {
            ownership_percentage,
            amount,
        })
    }
}

impl ZeroPriceImpact for ComposableStablePool {
    fn bpt_zero_price_impact(&self, amounts: &[Bfp]) -> Result<Bfp, Error> {
        let tokens = self.pool_tokens()?;
        if amounts.len() != tokens.len() {
            return Err(Error::ArrayLengthMismatch);
        }
        let balances = tokens.iter().map(|token| token.balance).collect::<Vec<_>>();
        let price_rates = tokens.iter().map(|token| token.price_rate).collect::<Vec<_>>();
        stable_bpt_zero_price_impact(
            self.amplification()?,
            &balances,
            &price_rates,
            self.common.total_shares,
            amounts,
        )
    }
}
