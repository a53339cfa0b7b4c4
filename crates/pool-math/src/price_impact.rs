//! Price impact of joins and exits, measured against the pool shares the same
//! token amounts would be worth at the pool's current spot prices.

use {
    crate::{
        error::Error,
        fixed_point::{Bfp, logexpmath::to_big_int},
        math::BalU256,
        stable_math::bpt_spot_price,
    },
    num::{BigInt, Signed, Zero},
    primitive_types::U256,
    std::{
        fmt::{self, Debug, Display, Formatter},
        sync::LazyLock,
    },
};

static ONE_18: LazyLock<U256> = LazyLock::new(|| U256::exp10(18));
static SIGNED_ONE_18: LazyLock<BigInt> = LazyLock::new(|| BigInt::from(10).pow(18));

/// Pools that can value token amounts at their current spot prices.
pub trait ZeroPriceImpact {
    /// Pool shares `amounts` are worth without any slippage. Amounts follow
    /// the pool token order, excluding the pool's own share token.
    fn bpt_zero_price_impact(&self, amounts: &[Bfp]) -> Result<Bfp, Error>;

    /// Price impact of joining with (or exiting to) `amounts` for
    /// `bpt_amount` pool shares.
    fn price_impact(
        &self,
        amounts: &[Bfp],
        bpt_amount: Bfp,
        is_join: bool,
    ) -> Result<PriceImpact, Error> {
        let bpt_zero_price_impact = self.bpt_zero_price_impact(amounts)?;
        let price_impact = calc_price_impact(bpt_amount, bpt_zero_price_impact, is_join)?;
        tracing::debug!(
            ?bpt_amount,
            ?bpt_zero_price_impact,
            is_join,
            %price_impact,
            "computed price impact"
        );
        Ok(price_impact)
    }
}

/// Signed fraction with 18 decimals. Positive values are a cost to the user,
/// zero means the operation executes exactly at spot prices.
#[derive(Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PriceImpact(BigInt);

impl PriceImpact {
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    /// Raw value scaled by 1e18.
    pub fn as_big_int(&self) -> &BigInt {
        &self.0
    }

    pub fn is_cost(&self) -> bool {
        self.0.is_positive()
    }
}

impl Display for PriceImpact {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        let sign = if self.0.is_negative() { "-" } else { "" };
        let abs = self.0.abs();
        write!(
            formatter,
            "{sign}{}.{:0>18}",
            &abs / &*SIGNED_ONE_18,
            (&abs % &*SIGNED_ONE_18).to_string(),
        )
    }
}

impl Debug for PriceImpact {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        Display::fmt(self, formatter)
    }
}

/// `1 - actual / zero_impact` for joins and `1 - zero_impact / actual` for
/// exits. The result is not clamped: an operation priced better than spot
/// yields a negative price impact.
pub fn calc_price_impact(
    actual_bpt_amount: Bfp,
    zero_impact_bpt_amount: Bfp,
    is_join: bool,
) -> Result<PriceImpact, Error> {
    let ratio = if is_join {
        actual_bpt_amount.div_down(zero_impact_bpt_amount)?
    } else {
        zero_impact_bpt_amount.div_down(actual_bpt_amount)?
    };
    Ok(PriceImpact(
        &*SIGNED_ONE_18 - to_big_int(ratio.as_uint256()),
    ))
}

/// Zero price impact of a weighted pool, where the share price of token `i`
/// is `weight_i * supply / balance_i`.
pub fn weighted_bpt_zero_price_impact(
    normalized_weights: &[Bfp],
    balances: &[Bfp],
    total_shares: Bfp,
    amounts: &[Bfp],
) -> Result<Bfp, Error> {
    if normalized_weights.len() != balances.len() {
        return Err(Error::InputLengthMismatch);
    }
    if amounts.len() != balances.len() {
        return Err(Error::ArrayLengthMismatch);
    }

    let mut bpt_zero_price_impact = U256::zero();
    for ((weight, balance), amount) in normalized_weights.iter().zip(balances).zip(amounts) {
        if amount.is_zero() {
            continue;
        }
        let price = weight
            .as_uint256()
            .bmul(total_shares.as_uint256())?
            .bdiv_down(balance.as_uint256())?;
        let term = price.bmul(amount.as_uint256())?.bdiv_down(*ONE_18)?;
        bpt_zero_price_impact = bpt_zero_price_impact.badd(term)?;
    }
    Ok(Bfp::from_wei(bpt_zero_price_impact))
}

/// Zero price impact of a stable pool with per token price rates. Balances
/// are raw; they are scaled by their rates before pricing.
pub fn stable_bpt_zero_price_impact(
    amplification_parameter: U256,
    balances: &[Bfp],
    price_rates: &[Bfp],
    total_shares: Bfp,
    amounts: &[Bfp],
) -> Result<Bfp, Error> {
    if price_rates.len() != balances.len() {
        return Err(Error::InputLengthMismatch);
    }
    if amounts.len() != balances.len() {
        return Err(Error::ArrayLengthMismatch);
    }

    let scaled_balances = balances
        .iter()
        .zip(price_rates)
        .map(|(balance, rate)| balance.mul_down(*rate))
        .collect::<Result<Vec<_>, _>>()?;

    let mut bpt_zero_price_impact = U256::zero();
    for (index, (rate, amount)) in price_rates.iter().zip(amounts).enumerate() {
        if amount.is_zero() {
            continue;
        }
        let spot_price = bpt_spot_price(
            amplification_parameter,
            &scaled_balances,
            total_shares,
            index,
        )?;
        let price = spot_price
            .as_uint256()
            .bmul(rate.as_uint256())?
            .bdiv_down(*ONE_18)?;
        let term = price.bmul(amount.as_uint256())?.bdiv_down(*ONE_18)?;
        bpt_zero_price_impact = bpt_zero_price_impact.badd(term)?;
    }
    Ok(Bfp::from_wei(bpt_zero_price_impact))
}
