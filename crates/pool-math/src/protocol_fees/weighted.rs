//! Protocol fees of weighted pools.
//!
//! The first generation pays swap fees in the token with the largest weight,
//! the second mints pool shares worth the protocol's ownership percentage.

use {
    super::index_of_max,
    crate::{
        error::Error,
        fixed_point::Bfp,
        weighted_math::calc_due_token_protocol_swap_fee_amount,
    },
};

pub fn calculate_due_protocol_fee_amounts(
    normalized_weights: &[Bfp],
    balances: &[Bfp],
    last_invariant: Bfp,
    current_invariant: Bfp,
    protocol_swap_fee_percentage: Bfp,
    min_pow_base: Bfp,
) -> Result<Vec<Bfp>, Error> {
    if normalized_weights.len() != balances.len() {
        return Err(Error::InputLengthMismatch);
    }

    let mut due_protocol_fee_amounts = vec![Bfp::zero(); balances.len()];
    if protocol_swap_fee_percentage.is_zero() {
        return Ok(due_protocol_fee_amounts);
    }
    let Some(max_weight_token_index) = index_of_max(normalized_weights) else {
        return Ok(due_protocol_fee_amounts);
    };

    due_protocol_fee_amounts[max_weight_token_index] = calc_due_token_protocol_swap_fee_amount(
        balances[max_weight_token_index],
        normalized_weights[max_weight_token_index],
        last_invariant,
        current_invariant,
        protocol_swap_fee_percentage,
        min_pow_base,
    )?;
    Ok(due_protocol_fee_amounts)
}

/// Pool shares to mint so the protocol ends up owning `ownership_percentage`
/// of the diluted supply.
pub fn calculate_due_bpt_protocol_fee_amount(
    total_supply: Bfp,
    ownership_percentage: Bfp,
) -> Result<Bfp, Error> {
    total_supply
        .mul_up(ownership_percentage)?
        .div_down(ownership_percentage.complement())
}
