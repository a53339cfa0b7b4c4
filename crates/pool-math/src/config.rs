//! Protocol fee settings, as published by governance.
//!
//! ```toml
//! swap-fee-percentage = "0.5"
//! yield-fee-percentage = "0.5"
//! ```

use {
    crate::fixed_point::{Bfp, MIN_POW_BASE_FREE_EXPONENT},
    anyhow::{Context, Result, ensure},
    serde::Deserialize,
    std::{fs, path::Path},
};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProtocolFeeConfig {
    /// Share of swap fees owed to the protocol.
    pub swap_fee_percentage: Bfp,

    /// Share of yield owed to the protocol, for pools holding rate bearing
    /// tokens.
    #[serde(default)]
    pub yield_fee_percentage: Bfp,

    /// Lower bound for the power base in the weighted pool fee calculation.
    #[serde(default = "default_min_pow_base_free_exponent")]
    pub min_pow_base_free_exponent: Bfp,
}

fn default_min_pow_base_free_exponent() -> Bfp {
    *MIN_POW_BASE_FREE_EXPONENT
}

impl Default for ProtocolFeeConfig {
    fn default() -> Self {
        Self {
            swap_fee_percentage: Bfp::zero(),
            yield_fee_percentage: Bfp::zero(),
            min_pow_base_free_exponent: default_min_pow_base_free_exponent(),
        }
    }
}

impl ProtocolFeeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("I/O error while reading {path:?}"))?;
        Self::from_toml(&data).with_context(|| format!("invalid configuration in {path:?}"))
    }

    pub fn from_toml(data: &str) -> Result<Self> {
        let config: Self = toml::from_str(data).context("TOML syntax error")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.swap_fee_percentage <= Bfp::one(),
            "swap fee percentage {:?} exceeds 100%",
            self.swap_fee_percentage
        );
        ensure!(
            self.yield_fee_percentage <= Bfp::one(),
            "yield fee percentage {:?} exceeds 100%",
            self.yield_fee_percentage
        );
        ensure!(
            !self.min_pow_base_free_exponent.is_zero()
                && self.min_pow_base_free_exponent <= Bfp::one(),
            "minimum power base {:?} must be in (0, 1]",
            self.min_pow_base_free_exponent
        );
        Ok(())
    }
}
