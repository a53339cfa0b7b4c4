//! Module emulating the operations on fixed points with exactly 18 decimals as
//! used in the Balancer smart contracts. The contract implementation can be
//! found at:
//! https://github.com/balancer-labs/balancer-v2-monorepo/blob/6c9e24e22d0c46cca6dd15861d3d33da61a60b98/pkg/solidity-utils/contracts/math/FixedPoint.sol

use {
    super::error::Error,
    anyhow::{Context, Result, anyhow, ensure},
    primitive_types::U256,
    serde_with::{DeserializeFromStr, SerializeDisplay},
    std::{
        fmt::{self, Debug, Display, Formatter},
        str::FromStr,
        sync::LazyLock,
    },
};

pub mod logexpmath;

/// Fixed point number with 18 decimals, stored as the raw 256-bit integer the
/// contracts operate on.
#[derive(
    Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd, DeserializeFromStr, SerializeDisplay,
)]
pub struct Bfp(U256);

static ONE_18: LazyLock<U256> = LazyLock::new(|| U256::exp10(18));
static ONE: LazyLock<Bfp> = LazyLock::new(|| Bfp(*ONE_18));
static TWO: LazyLock<Bfp> = LazyLock::new(|| Bfp(*ONE_18 * 2));
static FOUR: LazyLock<Bfp> = LazyLock::new(|| Bfp(*ONE_18 * 4));
static MAX_POW_RELATIVE_ERROR: LazyLock<Bfp> = LazyLock::new(|| Bfp(10000.into()));

/// Base below which the weighted fee calculation clamps the power base.
pub static MIN_POW_BASE_FREE_EXPONENT: LazyLock<Bfp> =
    LazyLock::new(|| Bfp(U256::exp10(17) * 7));

/// Direction in which a fixed point operation rounds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rounding {
    RoundDown,
    RoundUp,
}

impl From<Bfp> for U256 {
    fn from(value: Bfp) -> Self {
        value.0
    }
}

impl FromStr for Bfp {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (units, decimals) = s.split_once('.').unwrap_or((s, "0"));
        ensure!(
            !units.is_empty() && !decimals.is_empty() && decimals.len() <= 18,
            "invalid decimal representation {s:?}"
        );
        let units = U256::from_dec_str(units).context("invalid integer part")?;
        let decimals =
            U256::from_dec_str(&format!("{decimals:0<18}")).context("invalid fractional part")?;
        units
            .checked_mul(*ONE_18)
            .and_then(|units| units.checked_add(decimals))
            .map(Bfp)
            .ok_or_else(|| anyhow!("fixed point number {s:?} too large"))
    }
}

impl Display for Bfp {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(
            formatter,
            "{}.{:0>18}",
            self.0 / *ONE_18,
            (self.0 % *ONE_18).low_u64(),
        )
    }
}

impl Debug for Bfp {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        Display::fmt(self, formatter)
    }
}

impl Bfp {
    pub fn as_uint256(self) -> U256 {
        self.0
    }

    pub fn zero() -> Self {
        Self(U256::zero())
    }

    pub fn one() -> Self {
        *ONE
    }

    pub fn from_wei(num: U256) -> Self {
        Self(num)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(self, other: Self) -> Result<Self, Error> {
        Ok(Self(self.0.checked_add(other.0).ok_or(Error::AddOverflow)?))
    }

    pub fn sub(self, other: Self) -> Result<Self, Error> {
        Ok(Self(self.0.checked_sub(other.0).ok_or(Error::SubOverflow)?))
    }

    /// Subtraction clamped at zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn mul_down(self, other: Self) -> Result<Self, Error> {
        Ok(Self(
            self.0.checked_mul(other.0).ok_or(Error::MulOverflow)? / *ONE_18,
        ))
    }

    pub fn mul_up(self, other: Self) -> Result<Self, Error> {
        let product = self.0.checked_mul(other.0).ok_or(Error::MulOverflow)?;

        Ok(if product.is_zero() {
            Self::zero()
        } else {
            Self(((product - 1) / *ONE_18) + 1)
        })
    }

    pub fn div_down(self, other: Self) -> Result<Self, Error> {
        if other.is_zero() {
            return Err(Error::ZeroDivision);
        }
        if self.is_zero() {
            return Ok(Self::zero());
        }
        let a_inflated = self.0.checked_mul(*ONE_18).ok_or(Error::DivInternal)?;
        Ok(Self(a_inflated / other.0))
    }

    pub fn div_up(self, other: Self) -> Result<Self, Error> {
        if other.is_zero() {
            return Err(Error::ZeroDivision);
        }
        if self.is_zero() {
            return Ok(Self::zero());
        }
        let a_inflated = self.0.checked_mul(*ONE_18).ok_or(Error::DivInternal)?;
        Ok(Self(((a_inflated - 1) / other.0) + 1))
    }

    pub fn complement(self) -> Self {
        if self.0 < *ONE_18 {
            Self(*ONE_18 - self.0)
        } else {
            Self::zero()
        }
    }

    pub fn pow(self, exp: Self, rounding: Rounding) -> Result<Self, Error> {
        match rounding {
            Rounding::RoundDown => self.pow_down(exp),
            Rounding::RoundUp => self.pow_up(exp),
        }
    }

    pub fn pow_down(self, exp: Self) -> Result<Self, Error> {
        if exp == Self::one() {
            return Ok(self);
        }
        if exp == *TWO {
            return self.mul_down(self);
        }
        if exp == *FOUR {
            let square = self.mul_down(self)?;
            return square.mul_down(square);
        }

        let raw = Self(logexpmath::pow(self.0, exp.0)?);
        let max_error = raw.mul_up(*MAX_POW_RELATIVE_ERROR)?.add(Self(1.into()))?;

        if raw < max_error {
            Ok(Self::zero())
        } else {
            raw.sub(max_error)
        }
    }

    pub fn pow_up(self, exp: Self) -> Result<Self, Error> {
        if exp == Self::one() {
            return Ok(self);
        }
        if exp == *TWO {
            return self.mul_up(self);
        }
        if exp == *FOUR {
            let square = self.mul_up(self)?;
            return square.mul_up(square);
        }

        let raw = Self(logexpmath::pow(self.0, exp.0)?);
        let max_error = raw.mul_up(*MAX_POW_RELATIVE_ERROR)?.add(Self(1.into()))?;

        raw.add(max_error)
    }
}

/// Parses a decimal literal into a [`Bfp`], panicking on malformed input.
#[cfg(test)]
#[macro_export]
macro_rules! bfp {
    ($val:literal) => {
        $val.parse::<$crate::fixed_point::Bfp>().unwrap()
    };
}
