//! Stable and meta-stable pool snapshots. Meta-stable pools differ only in
//! carrying price rates for their tokens, plain stable pools use a rate of one.

use {
    super::{CommonPoolState, ProtocolFee},
    crate::{
        config::ProtocolFeeConfig,
        error::Error,
        fixed_point::Bfp,
        price_impact::{ZeroPriceImpact, stable_bpt_zero_price_impact},
        protocol_fees,
        stable_math::{self, AMP_PRECISION},
    },
    anyhow::{Result, ensure},
    primitive_types::U256,
    serde::Deserialize,
};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StablePool {
    #[serde(flatten)]
    pub common: CommonPoolState,
    pub tokens: Vec<StableTokenState>,
    pub amplification_parameter: AmplificationParameter,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StableTokenState {
    pub balance: Bfp,
    #[serde(default = "Bfp::one")]
    pub price_rate: Bfp,
}

/// Amplification parameter as reported by the pool, a factor together with
/// the precision it is expressed in.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(try_from = "RawAmplificationParameter")]
pub struct AmplificationParameter {
    factor: U256,
    precision: U256,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAmplificationParameter {
    factor: u64,
    precision: u64,
}

impl TryFrom<RawAmplificationParameter> for AmplificationParameter {
    type Error = anyhow::Error;

    fn try_from(raw: RawAmplificationParameter) -> Result<Self> {
        Self::try_new(raw.factor.into(), raw.precision.into())
    }
}

impl AmplificationParameter {
    pub fn try_new(factor: U256, precision: U256) -> Result<Self> {
        ensure!(!precision.is_zero(), "Zero precision not allowed");
        Ok(Self { factor, precision })
    }

    /// The factor rescaled to `base`, which is the form the invariant math
    /// expects when `base` is the amp precision.
    pub fn with_base(&self, base: U256) -> Result<U256, Error> {
        Ok(self.factor.checked_mul(base).ok_or(Error::MulOverflow)? / self.precision)
    }

    pub fn factor(&self) -> U256 {
        self.factor
    }

    pub fn precision(&self) -> U256 {
        self.precision
    }
}

impl StablePool {
    pub fn amplification(&self) -> Result<U256, Error> {
        self.amplification_parameter.with_base(AMP_PRECISION)
    }

    pub fn balances(&self) -> Vec<Bfp> {
        self.tokens.iter().map(|token| token.balance).collect()
    }

    pub fn price_rates(&self) -> Vec<Bfp> {
        self.tokens.iter().map(|token| token.price_rate).collect()
    }

    /// Balances multiplied by their price rates, which is what the invariant
    /// is defined over.
    pub fn scaled_balances(&self) -> Result<Vec<Bfp>, Error> {
        self.tokens
            .iter()
            .map(|token| token.balance.mul_down(token.price_rate))
            .collect()
    }

    pub fn invariant(&self) -> Result<Bfp, Error> {
        stable_math::calculate_invariant(self.amplification()?, &self.scaled_balances()?)
    }

    /// Swap fees owed to the protocol since the invariant was last recorded,
    /// in rate scaled units of the token with the highest balance.
    pub fn protocol_fee(&self, config: &ProtocolFeeConfig) -> Result<ProtocolFee, Error> {
        let amounts = protocol_fees::stable::calculate_due_protocol_fee_amounts(
            self.amplification()?,
            &self.scaled_balances()?,
            self.common.last_invariant,
            config.swap_fee_percentage,
        )?;
        tracing::debug!(?amounts, "stable pool protocol fees");
        Ok(ProtocolFee::TokenAmounts(amounts))
    }
}

impl ZeroPriceImpact for StablePool {
    fn bpt_zero_price_impact(&self, amounts: &[Bfp]) -> Result<Bfp, Error> {
        stable_bpt_zero_price_impact(
            self.amplification()?,
            &self.balances(),
            &self.price_rates(),
            self.common.total_shares,
            amounts,
        )
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::bfp};

    fn wei(value: &str) -> Bfp {
        Bfp::from_wei(U256::from_dec_str(value).unwrap())
    }

    fn meta_stable_pool() -> StablePool {
        StablePool {
            common: CommonPoolState {
                total_shares: wei("169687103280656830002475"),
                ..Default::default()
            },
            tokens: vec![
                StableTokenState {
                    balance: wei("81391348751687990895314"),
                    price_rate: wei("1070274551073343913"),
                },
                StableTokenState {
                    balance: wei("85441003002680837366990"),
                    price_rate: Bfp::one(),
                },
            ],
            amplification_parameter: AmplificationParameter::try_new(50.into(), 1.into())
                .unwrap(),
        }
    }

    #[test]
    fn amplification_parameter() {
        assert_eq!(
            AmplificationParameter::try_new(2.into(), 3.into())
                .unwrap()
                .with_base(1000.into())
                .unwrap(),
            U256::from(666)
        );
        assert_eq!(
            AmplificationParameter::try_new(7.into(), 8.into())
                .unwrap()
                .with_base(1000.into())
                .unwrap(),
            U256::from(875)
        );
        assert_eq!(
            AmplificationParameter::try_new(1.into(), 2.into())
                .unwrap()
                .with_base(1000.into())
                .unwrap(),
            U256::from(500)
        );
        assert_eq!(
            AmplificationParameter::try_new(U256::MAX, 1.into())
                .unwrap()
                .with_base(1000.into()),
            Err(Error::MulOverflow)
        );
    }

    #[test]
    fn amplification_parameter_error() {
        assert_eq!(
            AmplificationParameter::try_new(1.into(), 0.into())
                .unwrap_err()
                .to_string(),
            "Zero precision not allowed"
        );
    }

    #[test]
    fn amplification_parameter_deserialization() {
        let amp: AmplificationParameter =
            serde_json::from_value(serde_json::json!({ "factor": 50000, "precision": 1000 }))
                .unwrap();
        assert_eq!(amp.with_base(AMP_PRECISION).unwrap(), U256::from(50000));
        assert!(
            serde_json::from_value::<AmplificationParameter>(
                serde_json::json!({ "factor": 50000, "precision": 0 })
            )
            .is_err()
        );
    }

    #[test]
    fn invariant_uses_rate_scaled_balances() {
        assert_eq!(
            meta_stable_pool().invariant().unwrap(),
            wei("172551933760960800310477")
        );
    }

    #[test]
    fn zero_price_impact() {
        assert_eq!(
            meta_stable_pool()
                .bpt_zero_price_impact(&[
                    wei("629870162919981039400158"),
                    wei("615159929697"),
                ])
                .unwrap(),
            wei("662816325116386208862285")
        );
    }

    #[test]
    fn join_price_impact() {
        let price_impact = meta_stable_pool()
            .price_impact(
                &[wei("629870162919981039400158"), wei("615159929697")],
                wei("660816325116386208862285"),
                true,
            )
            .unwrap();
        assert_eq!(price_impact.to_string(), "0.003017427187914862");
    }

    #[test]
    fn protocol_fee_from_invariant_growth() {
        let pool = StablePool {
            tokens: meta_stable_pool()
                .tokens
                .into_iter()
                .map(|token| StableTokenState {
                    price_rate: Bfp::one(),
                    ..token
                })
                .collect(),
            common: CommonPoolState {
                last_invariant: bfp!("100000"),
                ..Default::default()
            },
            ..meta_stable_pool()
        };
        let config = ProtocolFeeConfig {
            swap_fee_percentage: bfp!("0.5"),
            ..Default::default()
        };
        assert_eq!(
            pool.protocol_fee(&config).unwrap(),
            ProtocolFee::TokenAmounts(vec![Bfp::zero(), wei("33116609531937313882322")])
        );
    }
}
