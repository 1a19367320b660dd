//! Exact numeric types for probabilities.
//!
//! All probability mass is carried as an arbitrary-precision rational so
//! that long convolution chains (e.g. 20d6) keep the sum-to-one invariant
//! exactly. Floating point only appears at the reporting boundary, through
//! [`to_f64`].

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

/// Exact probability value.
///
/// # Examples
///
/// ```rust
/// use pfdice::numeric::{ratio, Probability};
///
/// let p: Probability = ratio(1, 6) + ratio(1, 3);
/// assert_eq!(p, ratio(1, 2));
/// ```
pub type Probability = BigRational;

/// Build the exact fraction `numer / denom`.
///
/// The fraction is reduced. `denom` must be non-zero.
pub fn ratio(numer: i64, denom: i64) -> Probability {
    BigRational::new(BigInt::from(numer), BigInt::from(denom))
}

/// Exact integer as a probability-typed value.
pub fn integer(value: i64) -> Probability {
    BigRational::from_integer(BigInt::from(value))
}

/// The binomial coefficient `C(n, k)`, zero when `k > n`.
///
/// # Examples
///
/// ```rust
/// use pfdice::numeric::binomial;
/// use num_bigint::BigInt;
///
/// assert_eq!(binomial(5, 2), BigInt::from(10));
/// assert_eq!(binomial(3, 4), BigInt::from(0));
/// ```
pub fn binomial(n: u64, k: u64) -> BigInt {
    if k > n {
        return BigInt::zero();
    }
    let k = k.min(n - k);
    let mut acc = BigInt::one();
    for i in 0..k {
        acc = acc * BigInt::from(n - i) / BigInt::from(i + 1);
    }
    acc
}

/// `base^exp` for exact probabilities.
pub fn power(base: &Probability, exp: u64) -> Probability {
    let mut acc = Probability::one();
    for _ in 0..exp {
        acc *= base;
    }
    acc
}

/// Float approximation of an exact probability.
///
/// Returns `NaN` only if the value cannot be represented at all.
pub fn to_f64(value: &Probability) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Exact rational equal to a finite float, `None` for NaN or infinities.
pub fn from_f64(value: f64) -> Option<Probability> {
    BigRational::from_float(value)
}
