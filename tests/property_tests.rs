//! Property-based tests for the distribution algebra and pool operators.

use num_traits::One;
use pfdice::numeric::ratio;
use pfdice::*;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy: a small pool, `(count, sides)`, cheap enough to enumerate.
fn small_pool() -> impl Strategy<Value = (u32, u32)> {
    (1..=4u32, 1..=6u32)
}

/// Strategy: a uniform distribution over a short integer range.
fn uniform_strategy() -> impl Strategy<Value = Distribution> {
    (-5..=5i64, 0..=5i64).prop_map(|(min, width)| Distribution::uniform(min, min + width).unwrap())
}

/// Enumerate every face assignment of the pool and total the selected dice.
fn brute_force(count: u32, sides: u32, select: impl Fn(&mut Vec<i64>) -> i64) -> Distribution {
    let total = (sides as u64).pow(count);
    let mut weights: BTreeMap<i64, u64> = BTreeMap::new();
    for index in 0..total {
        let mut rest = index;
        let mut faces = Vec::with_capacity(count as usize);
        for _ in 0..count {
            faces.push((rest % sides as u64) as i64 + 1);
            rest /= sides as u64;
        }
        *weights.entry(select(&mut faces)).or_insert(0) += 1;
    }
    Distribution::from_weights(weights).unwrap()
}

fn sorted_sum(faces: &mut Vec<i64>, skip: usize, take: usize) -> i64 {
    faces.sort_unstable();
    faces.iter().skip(skip).take(take).sum()
}

proptest! {
    // 1. Convolving with a point mass at 0 changes nothing
    #[test]
    fn convolve_identity(dist in uniform_strategy()) {
        prop_assert_eq!(dist.convolve(&Distribution::point_mass(0)), dist);
    }

    // 2. Convolution is commutative
    #[test]
    fn convolve_commutative(a in uniform_strategy(), b in uniform_strategy()) {
        prop_assert_eq!(a.convolve(&b), b.convolve(&a));
    }

    // 3. Convolution is associative
    #[test]
    fn convolve_associative(
        a in uniform_strategy(),
        b in uniform_strategy(),
        c in uniform_strategy(),
    ) {
        prop_assert_eq!(a.convolve(&b).convolve(&c), a.convolve(&b.convolve(&c)));
    }

    // 4. Expectation is additive under convolution
    #[test]
    fn expectation_additive(a in uniform_strategy(), b in uniform_strategy()) {
        prop_assert_eq!(a.convolve(&b).expectation(), a.expectation() + b.expectation());
    }

    // 5. Keep highest matches full enumeration
    #[test]
    fn keep_highest_matches_enumeration((count, sides) in small_pool(), keep in 1..=4u32) {
        prop_assume!(keep <= count);
        let expr = ExpressionNode::dice(count, sides).keep_highest(keep);
        let dist = evaluate(&expr, &EvalPolicy::default()).unwrap();
        let skip = (count - keep) as usize;
        let expected = brute_force(count, sides, |faces| sorted_sum(faces, skip, keep as usize));
        prop_assert_eq!(dist, expected);
    }

    // 6. Keep lowest matches full enumeration
    #[test]
    fn keep_lowest_matches_enumeration((count, sides) in small_pool(), keep in 1..=4u32) {
        prop_assume!(keep <= count);
        let expr = ExpressionNode::dice(count, sides).keep_lowest(keep);
        let dist = evaluate(&expr, &EvalPolicy::default()).unwrap();
        let expected = brute_force(count, sides, |faces| sorted_sum(faces, 0, keep as usize));
        prop_assert_eq!(dist, expected);
    }

    // 7. Dropping n is keeping the rest
    #[test]
    fn drop_is_complementary_keep((count, sides) in small_pool(), drop in 0..=3u32) {
        prop_assume!(drop < count);
        let policy = EvalPolicy::default();
        let pool = ExpressionNode::dice(count, sides);
        prop_assert_eq!(
            evaluate(&pool.clone().drop_lowest(drop), &policy).unwrap(),
            evaluate(&pool.clone().keep_highest(count - drop), &policy).unwrap()
        );
        prop_assert_eq!(
            evaluate(&pool.clone().drop_highest(drop), &policy).unwrap(),
            evaluate(&pool.keep_lowest(count - drop), &policy).unwrap()
        );
    }

    // 8. Every operator yields a distribution summing to one
    #[test]
    fn operators_sum_to_one(
        (count, sides) in small_pool(),
        threshold in 1..=3i64,
        depth in 0..=4u32,
    ) {
        let policy = EvalPolicy::default();
        let pool = ExpressionNode::dice(count, sides);
        let exprs = [
            pool.clone(),
            pool.clone().keep_highest(1),
            pool.clone().reroll(threshold, Some(DepthPolicy::TruncatedAtDepth(depth))),
            pool.clone().explode(Some(depth)),
            pool.clone().explode(Some(depth)).keep_lowest(1),
        ];
        for expr in exprs {
            let dist = evaluate(&expr, &policy).unwrap();
            prop_assert!(dist.total_probability().is_one(), "{}", expr);
        }
    }

    // 9. Formatting and reparsing preserves the expression
    #[test]
    fn display_reparses(
        (count, sides) in small_pool(),
        keep in 1..=4u32,
        modifier in -20..=20i64,
    ) {
        prop_assume!(keep <= count);
        let expr = ExpressionNode::sum(vec![
            ExpressionNode::dice(count, sides).keep_highest(keep),
            ExpressionNode::constant(modifier),
        ]);
        prop_assert_eq!(parse(&expr.to_string()).unwrap(), expr);
    }

    // 10. A miss chance never exceeds what the d20 allows
    #[test]
    fn attack_miss_chance(hit_on in -5..=30i64) {
        let attack = Attack::new(hit_on, DamageSpec::parse("1d6").unwrap());
        let dist = attack.distribution(&EvalPolicy::default()).unwrap();
        let miss = dist.probability(0);
        prop_assert!(miss >= ratio(1, 20));
        prop_assert!(miss <= ratio(19, 20));
        prop_assert!(dist.total_probability().is_one());
    }
}

#[test]
fn test_exact_reroll_is_conditioning() {
    for threshold in 1..6 {
        let expr = ExpressionNode::dice(1, 6).reroll(threshold, Some(DepthPolicy::Exact));
        let dist = evaluate(&expr, &EvalPolicy::default()).unwrap();
        assert_eq!(dist, Distribution::uniform(threshold + 1, 6).unwrap());
        assert!(dist.total_probability().is_one());
    }
}
