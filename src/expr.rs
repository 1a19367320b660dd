//! Parsed dice expressions.
//!
//! An [`ExpressionNode`] tree is built once by the parser and consumed by
//! the evaluator. Keep, drop, reroll and explode nodes wrap a *dice pool*
//! (a `Dice` node, possibly already rerolled or exploded) rather than a
//! summed distribution, because they need to reason about individual die
//! results.

use crate::error::DiceError;
use crate::policy::DepthPolicy;
use std::fmt;
use std::str::FromStr;

/// A node of a parsed dice expression.
///
/// # Examples
///
/// ```rust
/// use pfdice::ExpressionNode;
///
/// let expr: ExpressionNode = "4d6kh3+2".parse().unwrap();
/// let expected = ExpressionNode::sum(vec![
///     ExpressionNode::dice(4, 6).keep_highest(3),
///     ExpressionNode::constant(2),
/// ]);
/// assert_eq!(expr, expected);
/// assert_eq!(expr.to_string(), "4d6kh3+2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExpressionNode {
    /// `count` identical dice with `sides` faces.
    Dice { count: u32, sides: u32 },

    /// A flat modifier.
    Constant(i64),

    /// Sum of independent sub-expressions.
    Sum(Vec<ExpressionNode>),

    /// Every outcome of the child multiplied by a factor.
    Scale(Box<ExpressionNode>, i64),

    /// Keep the highest `n` dice of the pool.
    KeepHighest(Box<ExpressionNode>, u32),

    /// Keep the lowest `n` dice of the pool.
    KeepLowest(Box<ExpressionNode>, u32),

    /// Discard the highest `n` dice of the pool.
    DropHighest(Box<ExpressionNode>, u32),

    /// Discard the lowest `n` dice of the pool.
    DropLowest(Box<ExpressionNode>, u32),

    /// Reroll each die showing `threshold` or less.
    ///
    /// `times` of `None` defers to the evaluation policy.
    Reroll {
        pool: Box<ExpressionNode>,
        threshold: i64,
        times: Option<DepthPolicy>,
    },

    /// Each die showing its maximum adds another roll.
    ///
    /// `max_depth` of `None` defers to the evaluation policy, and an
    /// explicit depth may not exceed the policy's bound. Unlike `Reroll`
    /// this is a bare depth rather than a [`DepthPolicy`]: an unbounded
    /// explosion has infinite support, so there is no exact form.
    Explode {
        pool: Box<ExpressionNode>,
        max_depth: Option<u32>,
    },
}

impl ExpressionNode {
    /// A pool of `count` dice with `sides` faces.
    pub fn dice(count: u32, sides: u32) -> Self {
        ExpressionNode::Dice { count, sides }
    }

    /// A flat value.
    pub fn constant(value: i64) -> Self {
        ExpressionNode::Constant(value)
    }

    /// Sum of the given terms.
    pub fn sum(terms: Vec<ExpressionNode>) -> Self {
        ExpressionNode::Sum(terms)
    }

    /// This expression multiplied by `factor`.
    pub fn scale(self, factor: i64) -> Self {
        ExpressionNode::Scale(Box::new(self), factor)
    }

    /// Keep the highest `n` dice of this pool.
    pub fn keep_highest(self, n: u32) -> Self {
        ExpressionNode::KeepHighest(Box::new(self), n)
    }

    /// Keep the lowest `n` dice of this pool.
    pub fn keep_lowest(self, n: u32) -> Self {
        ExpressionNode::KeepLowest(Box::new(self), n)
    }

    /// Drop the highest `n` dice of this pool.
    pub fn drop_highest(self, n: u32) -> Self {
        ExpressionNode::DropHighest(Box::new(self), n)
    }

    /// Drop the lowest `n` dice of this pool.
    pub fn drop_lowest(self, n: u32) -> Self {
        ExpressionNode::DropLowest(Box::new(self), n)
    }

    /// Reroll dice at or below `threshold`.
    pub fn reroll(self, threshold: i64, times: Option<DepthPolicy>) -> Self {
        ExpressionNode::Reroll {
            pool: Box::new(self),
            threshold,
            times,
        }
    }

    /// Explode dice that roll their maximum.
    pub fn explode(self, max_depth: Option<u32>) -> Self {
        ExpressionNode::Explode {
            pool: Box::new(self),
            max_depth,
        }
    }

    /// Whether this node is still a pool of individual dice.
    ///
    /// Only pools may be wrapped by keep, drop, reroll or explode.
    pub fn is_pool(&self) -> bool {
        matches!(
            self,
            ExpressionNode::Dice { .. }
                | ExpressionNode::Reroll { .. }
                | ExpressionNode::Explode { .. }
        )
    }

    /// Whether the expression involves no dice at all.
    pub fn is_flat(&self) -> bool {
        match self {
            ExpressionNode::Constant(_) => true,
            ExpressionNode::Scale(child, _) => child.is_flat(),
            ExpressionNode::Sum(terms) => terms.iter().all(ExpressionNode::is_flat),
            _ => false,
        }
    }
}

impl FromStr for ExpressionNode {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse(s)
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionNode::Dice { count, sides } => write!(f, "{}d{}", count, sides),
            ExpressionNode::Constant(value) => write!(f, "{}", value),
            ExpressionNode::Sum(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    match term {
                        ExpressionNode::Constant(v) if *v < 0 => write!(f, "{}", v)?,
                        ExpressionNode::Scale(child, -1) => write!(f, "-{}", child)?,
                        other if i == 0 => write!(f, "{}", other)?,
                        other => write!(f, "+{}", other)?,
                    }
                }
                Ok(())
            }
            ExpressionNode::Scale(child, -1) => write!(f, "-{}", child),
            ExpressionNode::Scale(child, factor) => write!(f, "{}*({})", factor, child),
            ExpressionNode::KeepHighest(pool, n) => write!(f, "{}kh{}", pool, n),
            ExpressionNode::KeepLowest(pool, n) => write!(f, "{}kl{}", pool, n),
            ExpressionNode::DropHighest(pool, n) => write!(f, "{}dh{}", pool, n),
            ExpressionNode::DropLowest(pool, n) => write!(f, "{}dl{}", pool, n),
            ExpressionNode::Reroll {
                pool,
                threshold,
                times,
            } => match times {
                None => write!(f, "{}r{}", pool, threshold),
                Some(DepthPolicy::Exact) => write!(f, "{}rr{}", pool, threshold),
                Some(DepthPolicy::TruncatedAtDepth(n)) => {
                    write!(f, "{}r{}x{}", pool, threshold, n)
                }
            },
            ExpressionNode::Explode { pool, max_depth } => match max_depth {
                None => write!(f, "{}!", pool),
                Some(depth) => write!(f, "{}!{}", pool, depth),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pool_operators() {
        assert_eq!(ExpressionNode::dice(4, 6).keep_highest(3).to_string(), "4d6kh3");
        assert_eq!(ExpressionNode::dice(2, 20).keep_lowest(1).to_string(), "2d20kl1");
        assert_eq!(ExpressionNode::dice(5, 8).drop_highest(2).to_string(), "5d8dh2");
        assert_eq!(ExpressionNode::dice(4, 6).drop_lowest(1).to_string(), "4d6dl1");
        assert_eq!(ExpressionNode::dice(1, 6).reroll(1, None).to_string(), "1d6r1");
        assert_eq!(
            ExpressionNode::dice(1, 6)
                .reroll(2, Some(DepthPolicy::TruncatedAtDepth(3)))
                .to_string(),
            "1d6r2x3"
        );
        assert_eq!(
            ExpressionNode::dice(1, 6)
                .reroll(1, Some(DepthPolicy::Exact))
                .to_string(),
            "1d6rr1"
        );
        assert_eq!(ExpressionNode::dice(1, 8).explode(None).to_string(), "1d8!");
        assert_eq!(ExpressionNode::dice(1, 8).explode(Some(4)).to_string(), "1d8!4");
    }

    #[test]
    fn test_display_signed_sum() {
        let expr = ExpressionNode::sum(vec![
            ExpressionNode::dice(2, 6).scale(-1),
            ExpressionNode::dice(1, 4),
            ExpressionNode::constant(-3),
        ]);
        assert_eq!(expr.to_string(), "-2d6+1d4-3");
    }

    #[test]
    fn test_is_pool() {
        assert!(ExpressionNode::dice(1, 6).is_pool());
        assert!(ExpressionNode::dice(1, 6).explode(None).is_pool());
        assert!(!ExpressionNode::dice(4, 6).keep_highest(3).is_pool());
        assert!(!ExpressionNode::constant(3).is_pool());
    }

    #[test]
    fn test_is_flat() {
        assert!(ExpressionNode::constant(3).scale(-1).is_flat());
        assert!(!ExpressionNode::dice(1, 6).is_flat());
        assert!(!ExpressionNode::sum(vec![
            ExpressionNode::constant(1),
            ExpressionNode::dice(1, 6)
        ])
        .is_flat());
    }
}
