//! Weighted pool invariant and protocol fee ownership math. The contract
//! implementation this mirrors can be found at:
//! https://github.com/balancer-labs/balancer-v2-monorepo/blob/master/pkg/pool-weighted/contracts/WeightedMath.sol

use super::{error::Error, fixed_point::Bfp};

/// `∏ balance_i ^ weight_i`, rounding down.
pub fn calculate_invariant(weights: &[Bfp], balances: &[Bfp]) -> Result<Bfp, Error> {
    if weights.len() != balances.len() {
        return Err(Error::InputLengthMismatch);
    }

    let mut invariant = Bfp::one();
    for (weight, balance) in weights.iter().zip(balances) {
        invariant = invariant.mul_down(balance.pow_down(*weight)?)?;
    }
    Ok(invariant)
}

/// Amount of a single token owed to the protocol from swap fees accrued since
/// the invariant was last `last_invariant`.
pub fn calc_due_token_protocol_swap_fee_amount(
    balance: Bfp,
    normalized_weight: Bfp,
    last_invariant: Bfp,
    current_invariant: Bfp,
    protocol_swap_fee_percentage: Bfp,
    min_pow_base: Bfp,
) -> Result<Bfp, Error> {
    // Fees only accrue from invariant growth.
    if current_invariant < last_invariant {
        return Ok(Bfp::zero());
    }

    // The balance that reproduces the last invariant is
    // `balance * (last / current) ^ (1 / weight)`. Very small bases are
    // clamped as the power would otherwise blow up the error.
    let base = last_invariant.div_up(current_invariant)?.max(min_pow_base);
    let exponent = Bfp::one().div_down(normalized_weight)?;
    let power = base.pow_up(exponent)?;

    let token_accrued_fees = balance.mul_down(power.complement())?;
    token_accrued_fees.mul_down(protocol_swap_fee_percentage)
}

/// Weighted geometric mean of the token price rates, `∏ rate_i ^ weight_i`.
/// Tokens exempt from yield fees do not contribute.
pub fn calculate_rate_product(
    weights: &[Bfp],
    rates: &[Bfp],
    exempt_from_yield_fee: &[bool],
) -> Result<Bfp, Error> {
    if weights.len() != rates.len() || weights.len() != exempt_from_yield_fee.len() {
        return Err(Error::InputLengthMismatch);
    }

    let mut product = Bfp::one();
    for ((weight, rate), exempt) in weights.iter().zip(rates).zip(exempt_from_yield_fee) {
        if !exempt {
            product = product.mul_down(rate.pow_down(*weight)?)?;
        }
    }
    Ok(product)
}

/// Share of the pool the protocol is entitled to for fees accrued since the
/// last settlement, split into what came from swaps and what came from yield.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SwapYieldOwnership {
    pub swap: Bfp,
    pub yield_: Bfp,
}

impl SwapYieldOwnership {
    pub fn total(&self) -> Result<Bfp, Error> {
        self.swap.add(self.yield_)
    }
}

pub fn calculate_swap_yield_ownership_pct(
    last_invariant: Bfp,
    current_invariant: Bfp,
    protocol_swap_fee_percentage: Bfp,
    ath_rate_product: Bfp,
    current_rate_product: Bfp,
    protocol_yield_fee_percentage: Bfp,
) -> Result<SwapYieldOwnership, Error> {
    let swap = if protocol_swap_fee_percentage.is_zero() || current_invariant <= last_invariant {
        Bfp::zero()
    } else {
        growth_ownership_pct(current_invariant, last_invariant, protocol_swap_fee_percentage)?
    };

    // Without a recorded all time high there is no baseline to measure yield
    // against.
    let yield_ = if protocol_yield_fee_percentage.is_zero()
        || ath_rate_product.is_zero()
        || current_rate_product <= ath_rate_product
    {
        Bfp::zero()
    } else {
        growth_ownership_pct(
            current_rate_product,
            ath_rate_product,
            protocol_yield_fee_percentage,
        )?
    };

    Ok(SwapYieldOwnership { swap, yield_ })
}

/// `(1 - previous / current) * percentage`, computed through the growth ratio
/// the way the contracts do.
fn growth_ownership_pct(current: Bfp, previous: Bfp, percentage: Bfp) -> Result<Bfp, Error> {
    let ratio = current.div_down(previous)?;
    Bfp::one()
        .sub(Bfp::one().div_down(ratio)?)?
        .mul_down(percentage)
}
