//! Exponentiation and logarithm with 18 decimal fixed point arguments, as
//! implemented by the `LogExpMath` library of the Balancer V2 contracts.
//!
//! Intermediates are signed, so the computation runs on [`BigInt`] with the
//! truncating division semantics of Solidity (`num` rounds towards zero as
//! well). Every constant and every step matches the contract so results agree
//! to the unit.

use {
    crate::error::Error,
    num::{BigInt, Signed, Zero, bigint::Sign},
    primitive_types::U256,
    std::sync::LazyLock,
};

static ONE_18: LazyLock<BigInt> = LazyLock::new(|| BigInt::from(10).pow(18));
static ONE_20: LazyLock<BigInt> = LazyLock::new(|| BigInt::from(10).pow(20));
static ONE_36: LazyLock<BigInt> = LazyLock::new(|| BigInt::from(10).pow(36));

static MAX_NATURAL_EXPONENT: LazyLock<BigInt> = LazyLock::new(|| BigInt::from(130) * &*ONE_18);
static MIN_NATURAL_EXPONENT: LazyLock<BigInt> = LazyLock::new(|| BigInt::from(-41) * &*ONE_18);

// Bounds of the range where the 36 decimal logarithm is used.
static LN_36_LOWER_BOUND: LazyLock<BigInt> =
    LazyLock::new(|| &*ONE_18 - BigInt::from(10).pow(17));
static LN_36_UPPER_BOUND: LazyLock<BigInt> =
    LazyLock::new(|| &*ONE_18 + BigInt::from(10).pow(17));

static MILD_EXPONENT_BOUND: LazyLock<U256> =
    LazyLock::new(|| (U256::one() << 254) / U256::exp10(20));

// e^(x0) with 18 decimals, x0 = 2^7.
const X0: i128 = 128_000_000_000_000_000_000;
static A0: LazyLock<BigInt> =
    LazyLock::new(|| BigInt::from(38_877_084_059_945_950_922_200_i128) * BigInt::from(10).pow(33));
// e^(x1) with 18 decimals, x1 = 2^6.
const X1: i128 = 64_000_000_000_000_000_000;
const A1: i128 = 6_235_149_080_811_616_882_910_000_000;

// The remaining pairs (x_n, e^(x_n)) use 20 decimals, x_n = 2^(5-n).
const TERMS: [(i128, i128); 10] = [
    (3_200_000_000_000_000_000_000, 7_896_296_018_268_069_516_100_000_000_000_000),
    (1_600_000_000_000_000_000_000, 888_611_052_050_787_263_676_000_000),
    (800_000_000_000_000_000_000, 298_095_798_704_172_827_474_000),
    (400_000_000_000_000_000_000, 5_459_815_003_314_423_907_810),
    (200_000_000_000_000_000_000, 738_905_609_893_065_022_723),
    (100_000_000_000_000_000_000, 271_828_182_845_904_523_536),
    (50_000_000_000_000_000_000, 164_872_127_070_012_814_685),
    (25_000_000_000_000_000_000, 128_402_541_668_774_148_407),
    (12_500_000_000_000_000_000, 113_314_845_306_682_631_683),
    (6_250_000_000_000_000_000, 106_449_445_891_785_942_956),
];

/// `x^y` for 18 decimal fixed point `x` and `y`.
pub fn pow(x: U256, y: U256) -> Result<U256, Error> {
    if y.is_zero() {
        return Ok(U256::exp10(18));
    }
    if x.is_zero() {
        return Ok(U256::zero());
    }
    if x.bit(255) {
        return Err(Error::XOutOfBounds);
    }
    if y >= *MILD_EXPONENT_BOUND {
        return Err(Error::YOutOfBounds);
    }

    let x = to_big_int(x);
    let y = to_big_int(y);

    let logx_times_y = if *LN_36_LOWER_BOUND < x && x < *LN_36_UPPER_BOUND {
        let ln_36_x = ln_36(&x);
        // Split the multiplication to keep the 36 decimals without overflowing.
        (&ln_36_x / &*ONE_18) * &y + (&ln_36_x % &*ONE_18) * &y / &*ONE_18
    } else {
        ln(&x) * &y
    };
    let logx_times_y = logx_times_y / &*ONE_18;

    if logx_times_y < *MIN_NATURAL_EXPONENT || logx_times_y > *MAX_NATURAL_EXPONENT {
        return Err(Error::ProductOutOfBounds);
    }

    to_u256(&exp(logx_times_y)?)
}

/// Natural exponentiation of an 18 decimal fixed point number.
pub fn exp(mut x: BigInt) -> Result<BigInt, Error> {
    if x < *MIN_NATURAL_EXPONENT || x > *MAX_NATURAL_EXPONENT {
        return Err(Error::InvalidExponent);
    }
    if x.is_negative() {
        // e^(-x) = 1 / e^x
        return Ok(&*ONE_18 * &*ONE_18 / exp(-x)?);
    }

    let first_an = if x >= BigInt::from(X0) {
        x -= X0;
        A0.clone()
    } else if x >= BigInt::from(X1) {
        x -= X1;
        BigInt::from(A1)
    } else {
        BigInt::from(1)
    };

    // Switch to 20 decimals for the remaining terms.
    x *= 100;

    let mut product = ONE_20.clone();
    for (x_n, a_n) in &TERMS[..8] {
        if x >= BigInt::from(*x_n) {
            x -= *x_n;
            product = product * *a_n / &*ONE_20;
        }
    }

    // Taylor series for the remainder, which is now below x9.
    let mut series_sum = ONE_20.clone();
    let mut term = x.clone();
    series_sum += &term;
    for k in 2..=12 {
        term = &term * &x / &*ONE_20 / k;
        series_sum += &term;
    }

    Ok(product * series_sum / &*ONE_20 * first_an / 100)
}

/// Natural logarithm with 18 decimals, `a` must be strictly positive.
fn ln(a: &BigInt) -> BigInt {
    if *a < *ONE_18 {
        // ln(a) = -ln(1 / a)
        return -ln(&(&*ONE_18 * &*ONE_18 / a));
    }

    let mut a = a.clone();
    let mut sum = BigInt::zero();
    if a >= &*A0 * &*ONE_18 {
        a /= &*A0;
        sum += X0;
    }
    if a >= BigInt::from(A1) * &*ONE_18 {
        a /= A1;
        sum += X1;
    }

    sum *= 100;
    a *= 100;

    for (x_n, a_n) in &TERMS {
        if a >= BigInt::from(*a_n) {
            a = a * &*ONE_20 / *a_n;
            sum += *x_n;
        }
    }

    // ln(a) = 2 * atanh(z) with z = (a - 1) / (a + 1).
    let z = (&a - &*ONE_20) * &*ONE_20 / (&a + &*ONE_20);
    let z_squared = &z * &z / &*ONE_20;

    let mut numerator = z.clone();
    let mut series_sum = numerator.clone();
    for k in [3, 5, 7, 9, 11] {
        numerator = numerator * &z_squared / &*ONE_20;
        series_sum += &numerator / k;
    }
    series_sum *= 2;

    (sum + series_sum) / 100
}

/// Natural logarithm with 36 decimals for arguments close to one.
fn ln_36(x: &BigInt) -> BigInt {
    let x = x * &*ONE_18;

    let z = (&x - &*ONE_36) * &*ONE_36 / (&x + &*ONE_36);
    let z_squared = &z * &z / &*ONE_36;

    let mut numerator = z.clone();
    let mut series_sum = numerator.clone();
    for k in [3, 5, 7, 9, 11, 13, 15] {
        numerator = numerator * &z_squared / &*ONE_36;
        series_sum += &numerator / k;
    }

    series_sum * 2
}

pub(crate) fn to_big_int(value: U256) -> BigInt {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    BigInt::from_bytes_be(Sign::Plus, &bytes)
}

pub(crate) fn to_u256(value: &BigInt) -> Result<U256, Error> {
    if value.is_negative() {
        return Err(Error::SubOverflow);
    }
    let (_, bytes) = value.to_bytes_be();
    if bytes.len() > 32 {
        return Err(Error::MulOverflow);
    }
    Ok(U256::from_big_endian(&bytes))
}
