//! Protocol fees of composable stable pools, which split invariant growth into
//! a swap fee part and a yield part by recomputing the invariant with the
//! price rates cached at the last settlement.

use {
    crate::{error::Error, fixed_point::Bfp, stable_math::calculate_invariant},
    primitive_types::U256,
};

/// State of a composable stable pool relevant for protocol fees. Balances and
/// rates exclude the pool's own share token.
#[derive(Clone, Copy, Debug)]
pub struct SwapYieldFeeInputs<'a> {
    /// Amplification parameter, pre-multiplied by the amp precision.
    pub amplification_parameter: U256,
    /// Rate adjusted balances.
    pub balances: &'a [Bfp],
    pub last_invariant: Bfp,
    pub current_price_rates: &'a [Bfp],
    /// Price rates cached when fees were last settled.
    pub old_price_rates: &'a [Bfp],
    pub exempt_from_yield_fee: &'a [bool],
    pub protocol_swap_fee_percentage: Bfp,
    pub protocol_yield_fee_percentage: Bfp,
}

/// Ownership percentage of the pool owed to the protocol.
pub fn calculate_swap_yield_fee_pct(inputs: &SwapYieldFeeInputs) -> Result<Bfp, Error> {
    let len = inputs.balances.len();
    if inputs.current_price_rates.len() != len
        || inputs.old_price_rates.len() != len
        || inputs.exempt_from_yield_fee.len() != len
    {
        return Err(Error::InputLengthMismatch);
    }

    // Rolling every rate back isolates growth from trading fees.
    let swap_fee_growth_invariant = calculate_invariant(
        inputs.amplification_parameter,
        &balances_with_old_rates(inputs, |_| true)?,
    )?;
    let total_growth_invariant =
        calculate_invariant(inputs.amplification_parameter, inputs.balances)?;

    let non_exempt_yield_growth_invariant = if inputs.exempt_from_yield_fee.iter().all(|e| *e) {
        swap_fee_growth_invariant
    } else if !inputs.exempt_from_yield_fee.iter().any(|e| *e) {
        total_growth_invariant
    } else {
        calculate_invariant(
            inputs.amplification_parameter,
            &balances_with_old_rates(inputs, |index| inputs.exempt_from_yield_fee[index])?,
        )?
    };

    let swap_fee_growth_invariant_delta =
        swap_fee_growth_invariant.saturating_sub(inputs.last_invariant);
    let non_exempt_yield_growth_invariant_delta =
        non_exempt_yield_growth_invariant.saturating_sub(swap_fee_growth_invariant);

    tracing::debug!(
        ?swap_fee_growth_invariant,
        ?non_exempt_yield_growth_invariant,
        ?total_growth_invariant,
        last_invariant = ?inputs.last_invariant,
        "composable stable invariant growth"
    );

    let protocol_swap_fee_pct = swap_fee_growth_invariant_delta
        .div_down(total_growth_invariant)?
        .mul_down(inputs.protocol_swap_fee_percentage)?;
    let protocol_yield_fee_pct = non_exempt_yield_growth_invariant_delta
        .div_down(total_growth_invariant)?
        .mul_down(inputs.protocol_yield_fee_percentage)?;
    protocol_swap_fee_pct.add(protocol_yield_fee_pct)
}

/// Pool shares to mint for the protocol to own `fee_percentage` of the
/// virtual supply after minting.
pub fn calculate_due_bpt_protocol_fee_amount(
    virtual_supply: Bfp,
    fee_percentage: Bfp,
) -> Result<Bfp, Error> {
    virtual_supply
        .mul_down(fee_percentage)?
        .div_down(fee_percentage.complement())
}

fn balances_with_old_rates(
    inputs: &SwapYieldFeeInputs,
    use_old_rate: impl Fn(usize) -> bool,
) -> Result<Vec<Bfp>, Error> {
    inputs
        .balances
        .iter()
        .enumerate()
        .map(|(index, balance)| {
            if use_old_rate(index) {
                balance
                    .mul_down(inputs.old_price_rates[index])?
                    .div_down(inputs.current_price_rates[index])
            } else {
                Ok(*balance)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use {super::*, crate::bfp};

    fn wei(value: &str) -> Bfp {
        Bfp::from_wei(U256::from_dec_str(value).unwrap())
    }

    struct Pool {
        balances: Vec<Bfp>,
        current_price_rates: Vec<Bfp>,
        old_price_rates: Vec<Bfp>,
    }

    /// Three token pool where only the second token's rate grew since the
    /// last settlement.
    fn pool() -> Pool {
        Pool {
            balances: vec![
                wei("10114027899187223149028"),
                wei("8044099761409589443827"),
                wei("6760384866742710404312"),
            ],
            current_price_rates: vec![
                wei("1118868797946620780"),
                wei("1033965969078691411"),
                wei("1066035430901015801"),
            ],
            old_price_rates: vec![
                wei("1118868797946620780"),
                wei("1033960875886006099"),
                wei("1066035430901015801"),
            ],
        }
    }

    fn fee_pct(pool: &Pool, exempt: &[bool]) -> Result<Bfp, Error> {
        calculate_swap_yield_fee_pct(&SwapYieldFeeInputs {
            amplification_parameter: 137829.into(),
            balances: &pool.balances,
            last_invariant: wei("24916006192749840322600"),
            current_price_rates: &pool.current_price_rates,
            old_price_rates: &pool.old_price_rates,
            exempt_from_yield_fee: exempt,
            protocol_swap_fee_percentage: bfp!("0.5"),
            protocol_yield_fee_percentage: bfp!("0.5"),
        })
    }

    #[test]
    fn yield_growth_is_charged() {
        let pool = pool();
        let fee = fee_pct(&pool, &[false, false, false]).unwrap();
        assert_eq!(fee, wei("795271292821"));
        assert_eq!(
            calculate_due_bpt_protocol_fee_amount(bfp!("10000"), fee).unwrap(),
            wei("7952719252779321")
        );
    }

    #[test]
    fn exempt_tokens_do_not_pay_yield_fees() {
        let pool = pool();
        assert_eq!(fee_pct(&pool, &[true, true, true]).unwrap(), Bfp::zero());
        // The only token whose rate grew is exempt.
        assert_eq!(fee_pct(&pool, &[false, true, false]).unwrap(), Bfp::zero());
    }

    #[test]
    fn no_growth_owes_nothing() {
        let pool = Pool {
            old_price_rates: pool().current_price_rates,
            ..pool()
        };
        assert_eq!(fee_pct(&pool, &[false, false, false]).unwrap(), Bfp::zero());
    }

    #[test]
    fn swap_growth_is_charged() {
        let pool = pool();
        let fee = calculate_swap_yield_fee_pct(&SwapYieldFeeInputs {
            amplification_parameter: 137829.into(),
            balances: &pool.balances,
            last_invariant: bfp!("24900"),
            current_price_rates: &pool.current_price_rates,
            old_price_rates: &pool.current_price_rates,
            exempt_from_yield_fee: &[false, false, false],
            protocol_swap_fee_percentage: bfp!("0.5"),
            protocol_yield_fee_percentage: Bfp::zero(),
        })
        .unwrap();
        // (D - last) / D * 0.5 for an invariant just above 24916.
        assert_eq!(fee, wei("321201957920518"));
    }

    #[test]
    fn mismatched_inputs() {
        let pool = pool();
        assert_eq!(fee_pct(&pool, &[false]), Err(Error::InputLengthMismatch));
    }

    #[test]
    fn bpt_dilution() {
        assert_eq!(
            calculate_due_bpt_protocol_fee_amount(bfp!("1000"), bfp!("0.5")).unwrap(),
            bfp!("1000")
        );
        assert_eq!(
            calculate_due_bpt_protocol_fee_amount(bfp!("1000"), Bfp::zero()).unwrap(),
            Bfp::zero()
        );
    }
}
