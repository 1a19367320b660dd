//! Discrete probability distributions over integer outcomes.
//!
//! A [`Distribution`] is an immutable probability mass function. Every
//! operation returns a new value; nothing is mutated after construction.
//! Probabilities are exact rationals and the mapping only ever holds
//! outcomes with strictly positive mass.

use crate::error::{DiceError, Result};
use crate::numeric::{self, integer, Probability};
use num_bigint::BigInt;
use num_traits::{One, Zero};
use std::collections::BTreeMap;
use std::fmt;

/// Immutable probability mass function over `i64` outcomes.
///
/// Two distributions are equal iff they assign the same probability to
/// every outcome.
///
/// # Examples
///
/// ```rust
/// use pfdice::Distribution;
/// use pfdice::numeric::ratio;
///
/// let d6 = Distribution::uniform(1, 6).unwrap();
/// let two_d6 = d6.convolve(&d6);
///
/// assert_eq!(two_d6.probability(7), ratio(6, 36));
/// assert_eq!(two_d6.min(), 2);
/// assert_eq!(two_d6.max(), 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    outcomes: BTreeMap<i64, Probability>,
}

impl Distribution {
    /// Build a distribution from an outcome → probability mapping.
    ///
    /// Zero entries are pruned. This is the consistency check applied at
    /// the boundary of every combinator.
    ///
    /// # Errors
    ///
    /// [`DiceError::MalformedDistribution`] if a probability is negative,
    /// the mapping is empty, or the probabilities do not sum to exactly 1.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pfdice::Distribution;
    /// use pfdice::numeric::ratio;
    /// use std::collections::BTreeMap;
    ///
    /// let mut coin = BTreeMap::new();
    /// coin.insert(0, ratio(1, 2));
    /// coin.insert(1, ratio(1, 2));
    /// assert!(Distribution::new(coin).is_ok());
    ///
    /// let mut broken = BTreeMap::new();
    /// broken.insert(0, ratio(1, 3));
    /// assert!(Distribution::new(broken).is_err());
    /// ```
    pub fn new(outcomes: BTreeMap<i64, Probability>) -> Result<Self> {
        let mut total = Probability::zero();
        let mut pruned = BTreeMap::new();
        for (outcome, p) in outcomes {
            if p < Probability::zero() {
                return Err(DiceError::MalformedDistribution(format!(
                    "negative probability {} at outcome {}",
                    p, outcome
                )));
            }
            if p.is_zero() {
                continue;
            }
            total += &p;
            pruned.insert(outcome, p);
        }
        if pruned.is_empty() {
            return Err(DiceError::MalformedDistribution(
                "distribution has no outcomes".to_string(),
            ));
        }
        if !total.is_one() {
            return Err(DiceError::MalformedDistribution(format!(
                "probabilities sum to {} instead of 1",
                total
            )));
        }
        Ok(Self { outcomes: pruned })
    }

    /// Build a distribution from `(outcome, probability)` pairs.
    ///
    /// Repeated outcomes have their mass merged.
    ///
    /// # Errors
    ///
    /// Same as [`Distribution::new`].
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (i64, Probability)>,
    {
        Self::new(accumulate(pairs))
    }

    /// Build a distribution from integer weights, normalised exactly.
    ///
    /// # Errors
    ///
    /// [`DiceError::MalformedDistribution`] if all weights are zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pfdice::Distribution;
    /// use pfdice::numeric::ratio;
    ///
    /// let loaded = Distribution::from_weights([(1, 1), (2, 3)]).unwrap();
    /// assert_eq!(loaded.probability(2), ratio(3, 4));
    /// ```
    pub fn from_weights<I>(weights: I) -> Result<Self>
    where
        I: IntoIterator<Item = (i64, u64)>,
    {
        let weights: Vec<(i64, BigInt)> = weights
            .into_iter()
            .map(|(outcome, w)| (outcome, BigInt::from(w)))
            .collect();
        let total: BigInt = weights.iter().map(|(_, w)| w).sum();
        if total.is_zero() {
            return Err(DiceError::MalformedDistribution(
                "weights sum to zero".to_string(),
            ));
        }
        Self::from_pairs(
            weights
                .into_iter()
                .map(|(outcome, w)| (outcome, Probability::new(w, total.clone()))),
        )
    }

    /// Distribution with probability 1 at `value`.
    pub fn point_mass(value: i64) -> Self {
        let mut outcomes = BTreeMap::new();
        outcomes.insert(value, Probability::one());
        Self { outcomes }
    }

    /// Equal probability over every integer in `min..=max`.
    ///
    /// # Errors
    ///
    /// [`DiceError::InvalidOperatorArguments`] if `min > max`.
    pub fn uniform(min: i64, max: i64) -> Result<Self> {
        if min > max {
            return Err(DiceError::invalid(format!(
                "uniform range {}..={} is empty",
                min, max
            )));
        }
        let p = Probability::one() / integer(max - min + 1);
        Self::new((min..=max).map(|v| (v, p.clone())).collect())
    }

    /// Distribution of the sum of two independent variables.
    ///
    /// Runs in `O(|support(self)| * |support(other)|)`.
    pub fn convolve(&self, other: &Distribution) -> Distribution {
        tracing::trace!(
            left = self.len(),
            right = other.len(),
            "convolving distributions"
        );
        let mut outcomes = BTreeMap::new();
        for (x, px) in &self.outcomes {
            for (y, py) in &other.outcomes {
                *outcomes.entry(x + y).or_insert_with(Probability::zero) += px * py;
            }
        }
        Self::trusted(outcomes)
    }

    /// Map every outcome `x` to `k * x`.
    ///
    /// `k = 0` collapses to a point mass at 0.
    pub fn scale(&self, k: i64) -> Distribution {
        if k == 0 {
            return Self::point_mass(0);
        }
        self.map(|x| x * k)
    }

    /// Apply `f` to every outcome, merging mass of outcomes that collide.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pfdice::Distribution;
    /// use pfdice::numeric::ratio;
    ///
    /// let penalty = Distribution::uniform(-2, 3).unwrap();
    /// let floored = penalty.map(|x| x.max(0));
    /// assert_eq!(floored.probability(0), ratio(1, 2));
    /// ```
    pub fn map<F>(&self, f: F) -> Distribution
    where
        F: Fn(i64) -> i64,
    {
        let mut outcomes = BTreeMap::new();
        for (x, p) in &self.outcomes {
            *outcomes.entry(f(*x)).or_insert_with(Probability::zero) += p;
        }
        Self::trusted(outcomes)
    }

    /// Distribution of `-X`.
    pub fn negate(&self) -> Distribution {
        self.scale(-1)
    }

    /// Weighted union of distributions.
    ///
    /// With probability `w` the outcome is drawn from the paired
    /// distribution. Zero-weight parts are ignored.
    ///
    /// # Errors
    ///
    /// [`DiceError::MalformedDistribution`] if a weight is negative or the
    /// weights do not sum to exactly 1.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pfdice::Distribution;
    /// use pfdice::numeric::ratio;
    ///
    /// let miss = Distribution::point_mass(0);
    /// let hit = Distribution::uniform(1, 8).unwrap();
    /// let attack = Distribution::mixture(&[(miss, ratio(1, 2)), (hit, ratio(1, 2))]).unwrap();
    /// assert_eq!(attack.probability(0), ratio(1, 2));
    /// assert_eq!(attack.probability(8), ratio(1, 16));
    /// ```
    pub fn mixture(parts: &[(Distribution, Probability)]) -> Result<Self> {
        let mut outcomes = BTreeMap::new();
        for (dist, weight) in parts {
            if *weight < Probability::zero() {
                return Err(DiceError::MalformedDistribution(format!(
                    "negative mixture weight {}",
                    weight
                )));
            }
            if weight.is_zero() {
                continue;
            }
            for (x, p) in &dist.outcomes {
                *outcomes.entry(*x).or_insert_with(Probability::zero) += p * weight;
            }
        }
        Self::new(outcomes)
    }

    /// Restrict to outcomes satisfying `predicate` and renormalise.
    ///
    /// # Errors
    ///
    /// [`DiceError::InvalidOperatorArguments`] if no outcome with positive
    /// probability satisfies the predicate.
    pub fn condition<F>(&self, predicate: F) -> Result<Self>
    where
        F: Fn(i64) -> bool,
    {
        let retained: Vec<(i64, &Probability)> = self
            .outcomes
            .iter()
            .filter(|(x, _)| predicate(**x))
            .map(|(x, p)| (*x, p))
            .collect();
        let mass: Probability = retained.iter().map(|(_, p)| *p).sum();
        if mass.is_zero() {
            return Err(DiceError::invalid(
                "conditioning on an event with zero probability",
            ));
        }
        Self::from_pairs(retained.into_iter().map(|(x, p)| (x, p / &mass)))
    }

    /// Probability of exactly `value`.
    pub fn probability(&self, value: i64) -> Probability {
        self.outcomes
            .get(&value)
            .cloned()
            .unwrap_or_else(Probability::zero)
    }

    /// Probability that the outcome lies within the optional inclusive bounds.
    ///
    /// `None` leaves that side unbounded.
    pub fn probability_between(&self, min: Option<i64>, max: Option<i64>) -> Probability {
        self.outcomes
            .iter()
            .filter(|(x, _)| min.map_or(true, |m| **x >= m) && max.map_or(true, |m| **x <= m))
            .map(|(_, p)| p)
            .sum()
    }

    /// Cumulative distribution function `P(X <= x)`.
    pub fn cdf(&self, x: i64) -> Probability {
        self.outcomes.range(..=x).map(|(_, p)| p).sum()
    }

    /// Exact expected value.
    pub fn expectation(&self) -> Probability {
        self.outcomes
            .iter()
            .map(|(x, p)| integer(*x) * p)
            .sum()
    }

    /// Exact variance, `E[X^2] - E[X]^2`.
    pub fn variance(&self) -> Probability {
        let mean = self.expectation();
        let second_moment: Probability = self
            .outcomes
            .iter()
            .map(|(x, p)| integer(*x) * integer(*x) * p)
            .sum();
        second_moment - &mean * &mean
    }

    /// Smallest outcome `x` with `P(X <= x) >= p`.
    ///
    /// # Errors
    ///
    /// [`DiceError::InvalidOperatorArguments`] unless `0 <= p <= 1`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pfdice::Distribution;
    ///
    /// let d20 = Distribution::uniform(1, 20).unwrap();
    /// assert_eq!(d20.percentile(0.5).unwrap(), 10);
    /// assert_eq!(d20.percentile(1.0).unwrap(), 20);
    /// ```
    pub fn percentile(&self, p: f64) -> Result<i64> {
        if !(0.0..=1.0).contains(&p) {
            return Err(DiceError::invalid(format!(
                "percentile {} outside [0, 1]",
                p
            )));
        }
        let exact = numeric::from_f64(p)
            .ok_or_else(|| DiceError::invalid(format!("percentile {} is not finite", p)))?;
        Ok(self.percentile_exact(&exact))
    }

    pub(crate) fn percentile_exact(&self, p: &Probability) -> i64 {
        let mut cumulative = Probability::zero();
        for (x, px) in &self.outcomes {
            cumulative += px;
            if cumulative >= *p {
                return *x;
            }
        }
        self.max()
    }

    /// Float approximation of [`Distribution::expectation`].
    pub fn mean_f64(&self) -> f64 {
        numeric::to_f64(&self.expectation())
    }

    /// Float approximation of [`Distribution::variance`].
    pub fn variance_f64(&self) -> f64 {
        numeric::to_f64(&self.variance())
    }

    /// Float approximation of the standard deviation.
    pub fn std_dev_f64(&self) -> f64 {
        self.variance_f64().sqrt()
    }

    /// Smallest outcome in the support.
    pub fn min(&self) -> i64 {
        self.outcomes.keys().next().copied().unwrap_or(0)
    }

    /// Largest outcome in the support.
    pub fn max(&self) -> i64 {
        self.outcomes.keys().next_back().copied().unwrap_or(0)
    }

    /// Number of outcomes in the support.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Always `false`; a distribution has at least one outcome.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Whether all mass sits on a single outcome.
    pub fn is_point_mass(&self) -> bool {
        self.outcomes.len() == 1
    }

    /// Sum of all probabilities. Exactly one for every valid distribution.
    pub fn total_probability(&self) -> Probability {
        self.outcomes.values().sum()
    }

    /// `(outcome, probability)` pairs in ascending outcome order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &Probability)> + '_ {
        self.outcomes.iter().map(|(x, p)| (*x, p))
    }

    /// Owned `(outcome, probability)` pairs in ascending outcome order.
    pub fn to_pairs(&self) -> Vec<(i64, Probability)> {
        self.outcomes
            .iter()
            .map(|(x, p)| (*x, p.clone()))
            .collect()
    }

    /// Mass strictly above / at-or-below `threshold`, as unnormalised maps.
    pub(crate) fn split_at(
        &self,
        threshold: i64,
    ) -> (BTreeMap<i64, Probability>, BTreeMap<i64, Probability>) {
        let low = self.outcomes.range(..=threshold).map(|(x, p)| (*x, p.clone())).collect();
        let high = self
            .outcomes
            .range(threshold.saturating_add(1)..)
            .map(|(x, p)| (*x, p.clone()))
            .collect();
        (low, high)
    }

    /// Wrap a mapping produced by a mass-preserving operation.
    pub(crate) fn trusted(outcomes: BTreeMap<i64, Probability>) -> Self {
        let outcomes: BTreeMap<i64, Probability> =
            outcomes.into_iter().filter(|(_, p)| !p.is_zero()).collect();
        debug_assert!(outcomes.values().sum::<Probability>().is_one());
        Self { outcomes }
    }
}

/// Merge `(outcome, probability)` pairs into a mapping.
pub(crate) fn accumulate<I>(pairs: I) -> BTreeMap<i64, Probability>
where
    I: IntoIterator<Item = (i64, Probability)>,
{
    let mut outcomes = BTreeMap::new();
    for (x, p) in pairs {
        *outcomes.entry(x).or_insert_with(Probability::zero) += p;
    }
    outcomes
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (x, p)) in self.outcomes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}/{}", x, p.numer(), p.denom())?;
        }
        write!(f, "]")
    }
}
