//! Errors raised by the pool math, mirroring the `BAL#` revert codes of the
//! Balancer contracts so failures can be matched against on-chain reverts.

use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum Error {
    #[error("BAL#000: addition overflow")]
    AddOverflow,
    #[error("BAL#001: subtraction overflow")]
    SubOverflow,
    #[error("BAL#003: multiplication overflow")]
    MulOverflow,
    #[error("BAL#004: division by zero")]
    ZeroDivision,
    #[error("BAL#005: division internal overflow")]
    DivInternal,
    #[error("BAL#006: exponential base out of bounds")]
    XOutOfBounds,
    #[error("BAL#007: exponent out of bounds")]
    YOutOfBounds,
    #[error("BAL#008: exponential product out of bounds")]
    ProductOutOfBounds,
    #[error("BAL#009: invalid exponent")]
    InvalidExponent,
    #[error("BAL#100: index out of bounds")]
    OutOfBounds,
    #[error("BAL#103: input length mismatch")]
    InputLengthMismatch,
    #[error("BAL#321: stable invariant did not converge")]
    StableInvariantDidNotConverge,
    #[error("BAL#322: stable get balance did not converge")]
    StableGetBalanceDidNotConverge,
    #[error("array length mismatch")]
    ArrayLengthMismatch,
}

impl Error {
    /// The Balancer revert code for this error, if the contracts define one.
    pub fn code(&self) -> Option<u16> {
        Some(match self {
            Self::AddOverflow => 0,
            Self::SubOverflow => 1,
            Self::MulOverflow => 3,
            Self::ZeroDivision => 4,
            Self::DivInternal => 5,
            Self::XOutOfBounds => 6,
            Self::YOutOfBounds => 7,
            Self::ProductOutOfBounds => 8,
            Self::InvalidExponent => 9,
            Self::OutOfBounds => 100,
            Self::InputLengthMismatch => 103,
            Self::StableInvariantDidNotConverge => 321,
            Self::StableGetBalanceDidNotConverge => 322,
            Self::ArrayLengthMismatch => return None,
        })
    }

    /// Arithmetic that left the 256-bit domain, including the bounds checks
    /// of the exponential and logarithm.
    pub fn is_overflow(&self) -> bool {
        matches!(
            self,
            Self::AddOverflow
                | Self::SubOverflow
                | Self::MulOverflow
                | Self::DivInternal
                | Self::XOutOfBounds
                | Self::YOutOfBounds
                | Self::ProductOutOfBounds
                | Self::InvalidExponent
        )
    }

    pub fn is_convergence_failure(&self) -> bool {
        matches!(
            self,
            Self::StableInvariantDidNotConverge | Self::StableGetBalanceDidNotConverge
        )
    }
}
