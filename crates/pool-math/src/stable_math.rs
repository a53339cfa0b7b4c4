//! Invariant math of the amplified constant-sum/constant-product curve used
//! by Balancer stable pools. The contract implementation this mirrors can be
//! found at:
//! https://github.com/balancer-labs/balancer-v2-monorepo/blob/stable-deployment/pkg/pool-stable/contracts/StableMath.sol
//!
//! Amplification parameters are expected to be pre-multiplied by
//! [`AMP_PRECISION`].

use {
    super::{
        error::Error,
        fixed_point::{
            Bfp,
            Rounding,
            logexpmath::{to_big_int, to_u256},
        },
        math::{BalU256, bdiv, has_converged},
    },
    num::{BigInt, Zero},
    primitive_types::U256,
};

pub const AMP_PRECISION: U256 = U256([1000, 0, 0, 0]);

const MAX_ITERATIONS: usize = 255;

/// Computes the invariant rounding down, as the current pool contracts do.
///
/// The invariant is the fixed point of
/// `A n^n S + D = A D n^n + D^(n+1) / (n^n P)`, found with Newton's method
/// starting from the sum of balances.
pub fn calculate_invariant(amplification_parameter: U256, balances: &[Bfp]) -> Result<Bfp, Error> {
    let mut sum = U256::zero();
    for balance in balances {
        sum = sum.badd(balance.as_uint256())?;
    }
    if sum.is_zero() {
        return Ok(Bfp::zero());
    }

    let num_tokens = U256::from(balances.len());
    let amp_times_total = amplification_parameter.bmul(num_tokens)?;

    let mut invariant = sum;
    for _ in 0..MAX_ITERATIONS {
        let mut d_p = invariant;
        for balance in balances {
            d_p = d_p
                .bmul(invariant)?
                .bdiv_down(balance.as_uint256().bmul(num_tokens)?)?;
        }

        let previous_invariant = invariant;
        let numerator = amp_times_total
            .bmul(sum)?
            .bdiv_down(AMP_PRECISION)?
            .badd(d_p.bmul(num_tokens)?)?
            .bmul(invariant)?;
        let denominator = amp_times_total
            .bsub(AMP_PRECISION)?
            .bmul(invariant)?
            .bdiv_down(AMP_PRECISION)?
            .badd(num_tokens.badd(1.into())?.bmul(d_p)?)?;
        invariant = numerator.bdiv_down(denominator)?;

        if has_converged(invariant, previous_invariant) {
            return Ok(Bfp::from_wei(invariant));
        }
    }

    tracing::warn!(?balances, %amplification_parameter, "stable invariant did not converge");
    Err(Error::StableInvariantDidNotConverge)
}

/// Computes the invariant with the first generation of the stable math, where
/// every division rounds in the requested direction. Spot prices are derived
/// from this form rounded up.
pub fn calculate_invariant_with_rounding(
    amplification_parameter: U256,
    balances: &[Bfp],
    rounding: Rounding,
) -> Result<Bfp, Error> {
    let mut sum = U256::zero();
    for balance in balances {
        sum = sum.badd(balance.as_uint256())?;
    }
    if sum.is_zero() {
        return Ok(Bfp::zero());
    }

    let round_up = rounding == Rounding::RoundUp;
    let num_tokens = U256::from(balances.len());
    let amp_times_total = amplification_parameter.bmul(num_tokens)?;

    let mut invariant = sum;
    for _ in 0..MAX_ITERATIONS {
        let mut p_d = balances[0].as_uint256().bmul(num_tokens)?;
        for balance in &balances[1..] {
            p_d = bdiv(
                p_d.bmul(balance.as_uint256())?.bmul(num_tokens)?,
                invariant,
                round_up,
            )?;
        }

        let previous_invariant = invariant;
        let numerator = num_tokens
            .bmul(invariant)?
            .bmul(invariant)?
            .badd(bdiv(
                amp_times_total.bmul(sum)?.bmul(p_d)?,
                AMP_PRECISION,
                round_up,
            )?)?;
        let denominator = num_tokens
            .badd(1.into())?
            .bmul(invariant)?
            .badd(bdiv(
                amp_times_total.bsub(AMP_PRECISION)?.bmul(p_d)?,
                AMP_PRECISION,
                !round_up,
            )?)?;
        invariant = bdiv(numerator, denominator, round_up)?;

        if has_converged(invariant, previous_invariant) {
            return Ok(Bfp::from_wei(invariant));
        }
    }

    tracing::warn!(?balances, %amplification_parameter, "stable invariant did not converge");
    Err(Error::StableInvariantDidNotConverge)
}

/// Solves for the balance of `token_index` that, with every other balance held
/// fixed, yields `invariant`. Rounds up.
pub fn calculate_balance_given_invariant_and_all_other_balances(
    amplification_parameter: U256,
    balances: &[Bfp],
    invariant: Bfp,
    token_index: usize,
) -> Result<Bfp, Error> {
    if token_index >= balances.len() {
        return Err(Error::OutOfBounds);
    }

    let num_tokens = U256::from(balances.len());
    let amp_times_total = amplification_parameter.bmul(num_tokens)?;
    let invariant = invariant.as_uint256();

    let mut sum = balances[0].as_uint256();
    let mut p_d = balances[0].as_uint256().bmul(num_tokens)?;
    for balance in &balances[1..] {
        p_d = p_d
            .bmul(balance.as_uint256())?
            .bmul(num_tokens)?
            .bdiv_down(invariant)?;
        sum = sum.badd(balance.as_uint256())?;
    }
    let current_balance = balances[token_index].as_uint256();
    sum = sum.bsub(current_balance)?;

    let invariant_squared = invariant.bmul(invariant)?;
    let c = invariant_squared
        .bdiv_up(amp_times_total.bmul(p_d)?)?
        .bmul(AMP_PRECISION)?
        .bmul(current_balance)?;
    let b = sum.badd(
        invariant
            .bdiv_down(amp_times_total)?
            .bmul(AMP_PRECISION)?,
    )?;

    let mut token_balance = invariant_squared
        .badd(c)?
        .bdiv_up(invariant.badd(b)?)?;
    for _ in 0..MAX_ITERATIONS {
        let previous_token_balance = token_balance;
        token_balance = token_balance
            .bmul(token_balance)?
            .badd(c)?
            .bdiv_up(token_balance.bmul(2.into())?.badd(b)?.bsub(invariant)?)?;

        if has_converged(token_balance, previous_token_balance) {
            return Ok(Bfp::from_wei(token_balance));
        }
    }

    tracing::warn!(?balances, token_index, "stable balance did not converge");
    Err(Error::StableGetBalanceDidNotConverge)
}

/// Price of the token at `token_index_in` expressed in pool shares, i.e. the
/// amount of BPT an infinitesimal deposit of that token is worth.
///
/// Derived analytically from the partial derivatives of the invariant with
/// respect to the token balance and to the invariant itself.
pub fn bpt_spot_price(
    amplification_parameter: U256,
    balances: &[Bfp],
    bpt_supply: Bfp,
    token_index_in: usize,
) -> Result<Bfp, Error> {
    if token_index_in >= balances.len() {
        return Err(Error::OutOfBounds);
    }

    let num_tokens = U256::from(balances.len());
    let invariant =
        calculate_invariant_with_rounding(amplification_parameter, balances, Rounding::RoundUp)?;
    let d = invariant.as_uint256();

    let mut sum = U256::zero();
    let mut d_p = d.bdiv_down(num_tokens)?;
    for (i, balance) in balances.iter().enumerate() {
        if i != token_index_in {
            sum = sum.badd(balance.as_uint256())?;
            d_p = d_p
                .bmul(d)?
                .bdiv_down(num_tokens.bmul(balance.as_uint256())?)?;
        }
    }

    // gamma is negative for any amplification above the precision, so the
    // derivatives are evaluated with signed integers.
    let x = to_big_int(balances[token_index_in].as_uint256());
    let n = to_big_int(num_tokens);
    let precision = to_big_int(AMP_PRECISION);
    let alpha = to_big_int(amplification_parameter) * &n;
    let beta = &alpha * to_big_int(sum);
    let gamma = &precision - &alpha;

    let partial_x = BigInt::from(2) * &alpha * &x + beta + &gamma * to_big_int(d);
    let minus_partial_d = to_big_int(d_p) * (n + BigInt::from(1)) * precision - gamma * x;
    if minus_partial_d.is_zero() {
        return Err(Error::ZeroDivision);
    }

    let price = to_u256(&(partial_x * to_big_int(bpt_supply.as_uint256()) / minus_partial_d))?;
    Bfp::from_wei(price).div_up(invariant)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::bfp,
        rand::{Rng, SeedableRng, rngs::StdRng},
    };

    fn wei(value: &str) -> Bfp {
        Bfp::from_wei(U256::from_dec_str(value).unwrap())
    }

    fn amp(value: u64) -> U256 {
        U256::from(value) * AMP_PRECISION
    }

    /// wstETH/WETH meta-stable pool with balances already scaled by the
    /// wstETH price rate.
    fn scaled_meta_stable_balances() -> Vec<Bfp> {
        vec![
            wei("87111089246466834949370"),
            wei("85441003002680837366990"),
        ]
    }

    #[test]
    fn balanced_pool_invariant_is_sum() {
        assert_eq!(
            calculate_invariant(amp(50), &[bfp!("100"), bfp!("100")]).unwrap(),
            bfp!("200")
        );
        assert_eq!(
            calculate_invariant_with_rounding(
                amp(50),
                &[bfp!("100"), bfp!("100")],
                Rounding::RoundUp
            )
            .unwrap(),
            bfp!("200")
        );
    }

    #[test]
    fn invariant_matches_contract() {
        assert_eq!(
            calculate_invariant(amp(50), &scaled_meta_stable_balances()).unwrap(),
            wei("172551933760960800310477")
        );
        assert_eq!(
            calculate_invariant(
                amp(50),
                &[
                    wei("81391348751687990895314"),
                    wei("85441003002680837366990"),
                ]
            )
            .unwrap(),
            wei("166831387472589818217389")
        );
    }

    #[test]
    fn rounded_invariants_bracket() {
        let balances = scaled_meta_stable_balances();
        assert_eq!(
            calculate_invariant_with_rounding(amp(50), &balances, Rounding::RoundUp).unwrap(),
            wei("172551933760960800310478")
        );
        assert_eq!(
            calculate_invariant_with_rounding(amp(50), &balances, Rounding::RoundDown).unwrap(),
            wei("172551933760960800310477")
        );
    }

    #[test]
    fn zero_balances_skip_iteration() {
        assert_eq!(
            calculate_invariant(amp(50), &[Bfp::zero(), Bfp::zero()]).unwrap(),
            Bfp::zero()
        );
        assert_eq!(calculate_invariant(amp(50), &[]).unwrap(), Bfp::zero());
        assert_eq!(
            calculate_invariant_with_rounding(amp(50), &[Bfp::zero()], Rounding::RoundUp)
                .unwrap(),
            Bfp::zero()
        );
    }

    #[test]
    fn zero_balance_among_others_fails() {
        assert_eq!(
            calculate_invariant(amp(50), &[bfp!("100"), Bfp::zero()]),
            Err(Error::ZeroDivision)
        );
    }

    #[test]
    fn invariant_is_monotonic_in_each_balance() {
        let base = [bfp!("100"), bfp!("100")];
        let bumped = [bfp!("100"), bfp!("101")];
        assert_eq!(
            calculate_invariant(amp(50), &bumped)
                .unwrap()
                .sub(calculate_invariant(amp(50), &base).unwrap())
                .unwrap(),
            wei("999951223098644936")
        );

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let balances: Vec<Bfp> = (0..3)
                .map(|_| Bfp::from_wei(U256::from(rng.gen_range(1_u128..1_000_000)) * U256::exp10(18)))
                .collect();
            let index = rng.gen_range(0..balances.len());
            let mut increased = balances.clone();
            increased[index] = increased[index].add(bfp!("1")).unwrap();
            assert!(
                calculate_invariant(amp(200), &increased).unwrap()
                    > calculate_invariant(amp(200), &balances).unwrap()
            );
        }
    }

    #[test]
    fn balance_round_trip_on_balanced_pools() {
        for (balance, amplification) in [("100", 50), ("100", 200), ("1000", 50), ("1000", 200)] {
            let balance = balance.parse::<Bfp>().unwrap();
            let balances = [balance, balance];
            let invariant = calculate_invariant(amp(amplification), &balances).unwrap();
            for token_index in 0..balances.len() {
                let solved = calculate_balance_given_invariant_and_all_other_balances(
                    amp(amplification),
                    &balances,
                    invariant,
                    token_index,
                )
                .unwrap();
                // The solver rounds up, so it lands at most one unit above.
                assert_eq!(
                    solved,
                    balance.add(Bfp::from_wei(U256::one())).unwrap()
                );
            }
        }
    }

    /// The solver's constant term is `divUp(D^2, A n P) * AMP_PRECISION *
    /// balance`, so the rounding of the inner division is magnified by the
    /// amp precision and the balance. Imbalanced pools miss by about a
    /// thousand wei instead of one.
    #[test]
    fn balance_round_trip_on_imbalanced_pools() {
        let pools = [
            (
                amp(50),
                vec![
                    wei("81391348751687990895314"),
                    wei("85441003002680837366990"),
                ],
            ),
            (amp(100), vec![bfp!("100"), bfp!("200"), bfp!("300")]),
        ];
        for (amplification, balances) in pools {
            let invariant = calculate_invariant(amplification, &balances).unwrap();
            for (token_index, balance) in balances.iter().enumerate() {
                let solved = calculate_balance_given_invariant_and_all_other_balances(
                    amplification,
                    &balances,
                    invariant,
                    token_index,
                )
                .unwrap();
                let difference = if solved > *balance {
                    solved.sub(*balance).unwrap()
                } else {
                    balance.sub(solved).unwrap()
                };
                assert!(
                    difference.as_uint256() <= balance.as_uint256() / U256::exp10(15),
                    "{solved:?} vs {balance:?}"
                );
            }
        }
    }

    #[test]
    fn balance_for_lower_invariant() {
        assert_eq!(
            calculate_balance_given_invariant_and_all_other_balances(
                amp(50),
                &[
                    wei("81391348751687990895314"),
                    wei("85441003002680837366990"),
                ],
                bfp!("100000"),
                1,
            )
            .unwrap(),
            wei("19207783938806209602346")
        );
    }

    #[test]
    fn balance_index_out_of_range() {
        assert_eq!(
            calculate_balance_given_invariant_and_all_other_balances(
                amp(50),
                &[bfp!("100")],
                bfp!("100"),
                1,
            ),
            Err(Error::OutOfBounds)
        );
    }

    #[test]
    fn spot_price_of_balanced_pool_is_one() {
        assert_eq!(
            bpt_spot_price(amp(50), &[bfp!("100"), bfp!("100")], bfp!("200"), 0).unwrap(),
            Bfp::one()
        );
    }

    #[test]
    fn spot_price_matches_reference() {
        let supply = wei("169687103280656830002475");
        let balances = scaled_meta_stable_balances();
        assert_eq!(
            bpt_spot_price(amp(50), &balances, supply, 0).unwrap(),
            wei("983211526729669092")
        );
        assert_eq!(
            bpt_spot_price(amp(50), &balances, supply, 1).unwrap(),
            wei("983584851232573695")
        );
        assert_eq!(
            bpt_spot_price(
                amp(100),
                &[bfp!("100"), bfp!("200"), bfp!("300")],
                bfp!("600"),
                2
            )
            .unwrap(),
            wei("995632968370706685")
        );
    }

    #[test]
    fn spot_price_index_out_of_range() {
        assert_eq!(
            bpt_spot_price(amp(50), &[bfp!("100"), bfp!("100")], bfp!("200"), 2),
            Err(Error::OutOfBounds)
        );
    }
}
