//! Protocol swap fees of stable and meta-stable pools, paid in the token with
//! the highest balance.

use {
    super::index_of_max,
    crate::{
        error::Error,
        fixed_point::Bfp,
        stable_math::{
            calculate_balance_given_invariant_and_all_other_balances,
            calculate_invariant,
        },
    },
    primitive_types::U256,
};

/// Per token amounts owed to the protocol. Only the token with the highest
/// balance owes anything: the difference between its balance and the balance
/// that would reproduce `last_invariant`, scaled by the fee percentage.
pub fn calculate_due_protocol_fee_amounts(
    amplification_parameter: U256,
    balances: &[Bfp],
    last_invariant: Bfp,
    protocol_swap_fee_percentage: Bfp,
) -> Result<Vec<Bfp>, Error> {
    let mut due_protocol_fee_amounts = vec![Bfp::zero(); balances.len()];
    if protocol_swap_fee_percentage.is_zero() {
        return Ok(due_protocol_fee_amounts);
    }
    let Some(chosen_token_index) = index_of_max(balances) else {
        return Ok(due_protocol_fee_amounts);
    };

    let current_invariant = calculate_invariant(amplification_parameter, balances)?;
    if current_invariant <= last_invariant {
        return Ok(due_protocol_fee_amounts);
    }

    let final_balance_fee_token = calculate_balance_given_invariant_and_all_other_balances(
        amplification_parameter,
        balances,
        last_invariant,
        chosen_token_index,
    )?;
    let balance = balances[chosen_token_index];
    if balance < final_balance_fee_token {
        tracing::warn!(
            ?balance,
            ?final_balance_fee_token,
            "solved fee token balance above current balance"
        );
        return Ok(due_protocol_fee_amounts);
    }

    due_protocol_fee_amounts[chosen_token_index] = balance
        .sub(final_balance_fee_token)?
        .mul_down(protocol_swap_fee_percentage)?;
    Ok(due_protocol_fee_amounts)
}
