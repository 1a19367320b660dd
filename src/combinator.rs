//! Combinators over dice pools.
//!
//! Every combinator is a pure function from one or more distributions to
//! a new [`Distribution`]. None of them simulate a roll; they compute the
//! exact outcome probabilities. Results pass through
//! [`Distribution::new`] so the sum-to-one invariant is re-checked on the
//! way out.
//!
//! Keep/drop operators work on a pool of `count` independent copies of a
//! single-die distribution. They never enumerate the `sides^count` face
//! assignments; see [`keep_highest`] for the counting scheme.

use crate::distribution::{accumulate, Distribution};
use crate::error::{DiceError, Result};
use crate::numeric::{binomial, power, Probability};
use crate::policy::DepthPolicy;
use num_rational::BigRational;
use num_traits::{One, Zero};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Which end of the sorted pool a keep operator retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Highest,
    Lowest,
}

/// Sum of `count` independent rolls of `die`.
///
/// Computed by `count - 1` convolutions of the single-die distribution
/// with the running total.
///
/// # Errors
///
/// [`DiceError::InvalidOperatorArguments`] if `count` is zero.
///
/// # Examples
///
/// ```rust
/// use pfdice::{combinator, PrimitiveDie};
/// use pfdice::numeric::ratio;
///
/// let d6 = PrimitiveDie::new(6).unwrap().distribution();
/// let three = combinator::sum_pool(&d6, 3).unwrap();
/// assert_eq!(three.probability(3), ratio(1, 216));
/// ```
pub fn sum_pool(die: &Distribution, count: u32) -> Result<Distribution> {
    check_count(count)?;
    let mut total = die.clone();
    for _ in 1..count {
        total = total.convolve(die);
    }
    Distribution::new(total.to_pairs().into_iter().collect())
}

/// Sum of the `keep` highest of `count` rolls of `die`.
///
/// Faces are visited from highest to lowest. The state after a face is
/// `(dice placed so far, sum of the kept dice)`; placing `c` of the
/// remaining `r` dice on face `v` multiplies the weight by
/// `C(r, c) * p(v)^c` and adds `v` once for every one of those dice that
/// still fits among the top `keep`. Dice that share a face value are
/// counted as a multiset, so ties at the cut-off need no ordering.
///
/// The cost is polynomial, `O(faces * count^2 * sums)`.
///
/// # Errors
///
/// [`DiceError::InvalidOperatorArguments`] unless `1 <= keep <= count`.
///
/// # Examples
///
/// ```rust
/// use pfdice::{combinator, PrimitiveDie};
/// use pfdice::numeric::ratio;
///
/// let d20 = PrimitiveDie::new(20).unwrap().distribution();
/// let advantage = combinator::keep_highest(&d20, 2, 1).unwrap();
/// assert_eq!(advantage.probability(20), ratio(39, 400));
/// ```
pub fn keep_highest(die: &Distribution, count: u32, keep: u32) -> Result<Distribution> {
    check_keep("keep highest", count, keep)?;
    keep_extreme(die, count, keep, Extreme::Highest)
}

/// Sum of the `keep` lowest of `count` rolls of `die`.
///
/// # Errors
///
/// [`DiceError::InvalidOperatorArguments`] unless `1 <= keep <= count`.
pub fn keep_lowest(die: &Distribution, count: u32, keep: u32) -> Result<Distribution> {
    check_keep("keep lowest", count, keep)?;
    keep_extreme(die, count, keep, Extreme::Lowest)
}

/// Sum of `count` rolls of `die` after discarding the `drop` highest.
///
/// # Errors
///
/// [`DiceError::InvalidOperatorArguments`] unless `drop < count`.
pub fn drop_highest(die: &Distribution, count: u32, drop: u32) -> Result<Distribution> {
    check_drop("drop highest", count, drop)?;
    keep_extreme(die, count, count - drop, Extreme::Lowest)
}

/// Sum of `count` rolls of `die` after discarding the `drop` lowest.
///
/// # Errors
///
/// [`DiceError::InvalidOperatorArguments`] unless `drop < count`.
pub fn drop_lowest(die: &Distribution, count: u32, drop: u32) -> Result<Distribution> {
    check_drop("drop lowest", count, drop)?;
    keep_extreme(die, count, count - drop, Extreme::Highest)
}

fn keep_extreme(
    die: &Distribution,
    count: u32,
    keep: u32,
    extreme: Extreme,
) -> Result<Distribution> {
    let mut faces = die.to_pairs();
    if extreme == Extreme::Highest {
        faces.reverse();
    }

    let mut states: BTreeMap<(u32, i64), Probability> = BTreeMap::new();
    states.insert((0, 0), Probability::one());

    for (face, p) in &faces {
        let powers: Vec<Probability> = (0..=count).map(|c| power(p, u64::from(c))).collect();
        let mut next: BTreeMap<(u32, i64), Probability> = BTreeMap::new();
        for ((placed, sum), weight) in &states {
            let remaining = count - placed;
            let kept_before = (*placed).min(keep);
            for c in 0..=remaining {
                let newly_kept = (placed + c).min(keep) - kept_before;
                let ways = BigRational::from_integer(binomial(u64::from(remaining), u64::from(c)));
                let mass = weight * ways * &powers[c as usize];
                if mass.is_zero() {
                    continue;
                }
                let key = (placed + c, sum + face * i64::from(newly_kept));
                *next.entry(key).or_insert_with(Probability::zero) += mass;
            }
        }
        states = next;
    }

    trace!(count, keep, faces = faces.len(), "keep/drop states resolved");
    let outcomes = accumulate(
        states
            .into_iter()
            .filter(|((placed, _), _)| *placed == count)
            .map(|((_, sum), p)| (sum, p)),
    );
    Distribution::new(outcomes)
}

/// Reroll results at or below `threshold`.
///
/// With [`DepthPolicy::TruncatedAtDepth`]`(n)`, a low result is rerolled up
/// to `n` times and the last roll is kept whatever it shows. With
/// [`DepthPolicy::Exact`] low results are rerolled until one exceeds the
/// threshold; the geometric series collapses to the die conditioned on
/// `x > threshold`.
///
/// # Errors
///
/// [`DiceError::InvalidOperatorArguments`] for an exact reroll where no
/// face exceeds the threshold, since it would never terminate.
///
/// # Examples
///
/// ```rust
/// use pfdice::{combinator, DepthPolicy, PrimitiveDie};
/// use pfdice::numeric::ratio;
///
/// let d6 = PrimitiveDie::new(6).unwrap().distribution();
/// let once = combinator::reroll(&d6, 1, DepthPolicy::TruncatedAtDepth(1)).unwrap();
/// assert_eq!(once.probability(1), ratio(1, 36));
///
/// let forever = combinator::reroll(&d6, 1, DepthPolicy::Exact).unwrap();
/// assert_eq!(forever.probability(1), ratio(0, 1));
/// assert_eq!(forever.probability(6), ratio(1, 5));
/// ```
pub fn reroll(die: &Distribution, threshold: i64, limit: DepthPolicy) -> Result<Distribution> {
    let (low, high) = die.split_at(threshold);
    if low.is_empty() {
        return Ok(die.clone());
    }

    match limit {
        DepthPolicy::Exact => {
            if high.is_empty() {
                return Err(DiceError::invalid(format!(
                    "every face is at or below {}, an unlimited reroll never ends",
                    threshold
                )));
            }
            die.condition(|x| x > threshold)
        }
        DepthPolicy::TruncatedAtDepth(times) => {
            let p_low: Probability = low.values().sum();
            let mut current = die.clone();
            for _ in 0..times {
                let mut outcomes = high.clone();
                for (x, p) in current.iter() {
                    *outcomes.entry(x).or_insert_with(Probability::zero) += p * &p_low;
                }
                current = Distribution::new(outcomes)?;
            }
            Ok(current)
        }
    }
}

/// Exploding die: a maximum roll adds another roll of the same die.
///
/// Shorthand for [`explode_at`] with the die's highest outcome.
///
/// # Errors
///
/// Same as [`explode_at`].
pub fn explode(die: &Distribution, max_depth: u32) -> Result<Distribution> {
    explode_at(die, die.max(), max_depth)
}

/// Exploding die that re-rolls on any result `>= at_least`.
///
/// The true distribution has infinite support. It is truncated after
/// `max_depth` extra rolls: the last roll is kept as shown even when it
/// would explode again, so the residual mass of still-exploding chains,
/// `P(x >= at_least)^(max_depth + 1)`, is folded into the deepest
/// outcome instead of being dropped. The total stays exactly 1. The folded
/// mass is [`explode_residual`].
///
/// Only the truncated form exists: an unbounded chain has infinite
/// support, so there is no closed form to fall back on the way
/// [`reroll`] has with [`DepthPolicy::Exact`]. The evaluator caps
/// `max_depth` with the policy's explode bound.
///
/// # Errors
///
/// [`DiceError::MalformedDistribution`] if the consistency check fails.
///
/// # Examples
///
/// ```rust
/// use pfdice::{combinator, PrimitiveDie};
/// use pfdice::numeric::ratio;
///
/// let d6 = PrimitiveDie::new(6).unwrap().distribution();
/// let exploded = combinator::explode(&d6, 1).unwrap();
/// assert_eq!(exploded.probability(6), ratio(0, 1));
/// assert_eq!(exploded.probability(7), ratio(1, 36));
/// assert_eq!(exploded.probability(12), ratio(1, 36));
/// ```
pub fn explode_at(die: &Distribution, at_least: i64, max_depth: u32) -> Result<Distribution> {
    let (low, high) = die.split_at(at_least.saturating_sub(1));
    if high.is_empty() {
        return Ok(die.clone());
    }

    let mut current = die.clone();
    for _ in 0..max_depth {
        let mut outcomes = low.clone();
        for (face, p_face) in &high {
            for (x, p) in current.iter() {
                *outcomes.entry(face + x).or_insert_with(Probability::zero) += p_face * p;
            }
        }
        current = Distribution::new(outcomes)?;
    }

    let residual = explode_residual(die, at_least, max_depth);
    debug!(
        at_least,
        max_depth,
        residual = %residual,
        "explosion truncated"
    );
    Ok(current)
}

/// Probability that an explosion chain is still going when `max_depth`
/// extra rolls run out, `P(x >= at_least)^(max_depth + 1)`.
///
/// This is the mass [`explode_at`] folds into the deepest outcomes. For a
/// fair die exploding on its maximum it is `(1/sides)^(max_depth + 1)`,
/// shrinking geometrically with the depth.
///
/// # Examples
///
/// ```rust
/// use pfdice::{combinator, PrimitiveDie};
/// use pfdice::numeric::ratio;
///
/// let d6 = PrimitiveDie::new(6).unwrap().distribution();
/// assert_eq!(combinator::explode_residual(&d6, 6, 2), ratio(1, 216));
/// ```
pub fn explode_residual(die: &Distribution, at_least: i64, max_depth: u32) -> Probability {
    let p_high = die.probability_between(Some(at_least), None);
    power(&p_high, u64::from(max_depth) + 1)
}

/// Clamp every outcome into the optional inclusive bounds.
///
/// # Errors
///
/// [`DiceError::InvalidOperatorArguments`] if `min > max`.
///
/// # Examples
///
/// ```rust
/// use pfdice::{combinator, Distribution};
///
/// let penalised = Distribution::uniform(-3, 4).unwrap();
/// let floored = combinator::clamp(&penalised, Some(1), None).unwrap();
/// assert_eq!(floored.min(), 1);
/// ```
pub fn clamp(d: &Distribution, min: Option<i64>, max: Option<i64>) -> Result<Distribution> {
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(DiceError::invalid(format!(
                "clamp bounds {}..={} are empty",
                lo, hi
            )));
        }
    }
    let clamped = d.map(|x| {
        let x = min.map_or(x, |lo| x.max(lo));
        max.map_or(x, |hi| x.min(hi))
    });
    Distribution::new(clamped.to_pairs().into_iter().collect())
}

fn check_count(count: u32) -> Result<()> {
    if count == 0 {
        return Err(DiceError::invalid("a dice pool needs at least one die"));
    }
    Ok(())
}

fn check_keep(operator: &str, count: u32, keep: u32) -> Result<()> {
    check_count(count)?;
    if keep == 0 || keep > count {
        return Err(DiceError::invalid(format!(
            "{}: cannot keep {} of {} dice",
            operator, keep, count
        )));
    }
    Ok(())
}

fn check_drop(operator: &str, count: u32, drop: u32) -> Result<()> {
    check_count(count)?;
    if drop >= count {
        return Err(DiceError::invalid(format!(
            "{}: cannot drop {} of {} dice",
            operator, drop, count
        )));
    }
    Ok(())
}
