//! Expression evaluator.
//!
//! Provides the `Evaluator` type, which folds a parsed [`ExpressionNode`]
//! into a single [`Distribution`] by applying the combinators bottom-up.
//! Pool distributions are cached per evaluator, keyed by the pool node
//! itself (dice count, sides and operator parameters), so repeated pools
//! across many expressions are computed once. The cache belongs to the
//! caller; there is no global state.

use crate::combinator;
use crate::die::PrimitiveDie;
use crate::distribution::Distribution;
use crate::error::{DiceError, Result};
use crate::expr::ExpressionNode;
use crate::parser;
use crate::policy::EvalPolicy;
use std::collections::HashMap;
use tracing::debug;

/// A pool of `count` independent dice sharing one single-die distribution.
#[derive(Debug, Clone)]
struct Pool {
    die: Distribution,
    count: u32,
}

/// Evaluates expression trees under a fixed [`EvalPolicy`].
///
/// # Examples
///
/// ```rust
/// use pfdice::{parse, EvalPolicy, Evaluator};
/// use pfdice::numeric::ratio;
///
/// let mut evaluator = Evaluator::new(EvalPolicy::default());
/// let expr = parse("2d6").unwrap();
/// let dist = evaluator.evaluate(&expr).unwrap();
/// assert_eq!(dist.probability(7), ratio(1, 6));
///
/// // the pool is now cached
/// assert_eq!(evaluator.cached_pools(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    policy: EvalPolicy,

    /// Evaluated pool nodes.
    cache: HashMap<ExpressionNode, Distribution>,
}

impl Evaluator {
    /// Create an evaluator with an empty cache.
    pub fn new(policy: EvalPolicy) -> Self {
        Self {
            policy,
            cache: HashMap::new(),
        }
    }

    /// The policy this evaluator applies.
    pub fn policy(&self) -> &EvalPolicy {
        &self.policy
    }

    /// Number of pool distributions currently cached.
    pub fn cached_pools(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached pool distribution.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Evaluate an expression tree into its distribution.
    ///
    /// Children are evaluated before their parent is combined. Errors from
    /// any nested combinator are returned unchanged.
    ///
    /// # Errors
    ///
    /// - [`DiceError::InvalidOperatorArguments`] for bad operator arguments,
    ///   a pool operator applied to something that is not a pool, or an
    ///   explode depth, reroll count or die size above the policy bound
    /// - [`DiceError::PoolSizeExceeded`] for pools above the policy bound
    /// - [`DiceError::MalformedDistribution`] if a consistency check fails
    pub fn evaluate(&mut self, expr: &ExpressionNode) -> Result<Distribution> {
        debug!(expression = %expr, "evaluating");
        let dist = self.eval(expr)?;
        debug!(
            expression = %expr,
            outcomes = dist.len(),
            min = dist.min(),
            max = dist.max(),
            "evaluated"
        );
        Ok(dist)
    }

    /// Parse `notation` and evaluate it.
    ///
    /// # Errors
    ///
    /// Any parse error, then any error from [`Evaluator::evaluate`].
    pub fn evaluate_str(&mut self, notation: &str) -> Result<Distribution> {
        let expr = parser::parse(notation)?;
        self.evaluate(&expr)
    }

    fn eval(&mut self, expr: &ExpressionNode) -> Result<Distribution> {
        match expr {
            ExpressionNode::Constant(value) => Ok(Distribution::point_mass(*value)),
            ExpressionNode::Sum(terms) => {
                let parts = terms
                    .iter()
                    .map(|term| self.eval(term))
                    .collect::<Result<Vec<_>>>()?;
                Ok(parts
                    .iter()
                    .fold(Distribution::point_mass(0), |acc, part| acc.convolve(part)))
            }
            ExpressionNode::Scale(child, factor) => Ok(self.eval(child)?.scale(*factor)),
            pool => self.eval_cached(pool),
        }
    }

    fn eval_cached(&mut self, expr: &ExpressionNode) -> Result<Distribution> {
        if let Some(cached) = self.cache.get(expr) {
            debug!(pool = %expr, "pool cache hit");
            return Ok(cached.clone());
        }

        debug!(pool = %expr, "pool cache miss");
        let dist = self.eval_pool_total(expr)?;
        self.cache.insert(expr.clone(), dist.clone());
        Ok(dist)
    }

    fn eval_pool_total(&self, expr: &ExpressionNode) -> Result<Distribution> {
        match expr {
            ExpressionNode::KeepHighest(inner, n) => {
                let pool = self.pool(inner, "keep highest")?;
                combinator::keep_highest(&pool.die, pool.count, *n)
            }
            ExpressionNode::KeepLowest(inner, n) => {
                let pool = self.pool(inner, "keep lowest")?;
                combinator::keep_lowest(&pool.die, pool.count, *n)
            }
            ExpressionNode::DropHighest(inner, n) => {
                let pool = self.pool(inner, "drop highest")?;
                combinator::drop_highest(&pool.die, pool.count, *n)
            }
            ExpressionNode::DropLowest(inner, n) => {
                let pool = self.pool(inner, "drop lowest")?;
                combinator::drop_lowest(&pool.die, pool.count, *n)
            }
            other => {
                let pool = self.pool(other, "sum")?;
                combinator::sum_pool(&pool.die, pool.count)
            }
        }
    }

    /// Resolve a pool node to its single-die distribution and dice count.
    fn pool(&self, expr: &ExpressionNode, operator: &str) -> Result<Pool> {
        match expr {
            ExpressionNode::Dice { count, sides } => {
                if *count == 0 {
                    return Err(DiceError::invalid(format!(
                        "{}: a dice pool needs at least one die",
                        expr
                    )));
                }
                self.policy.check_pool_size(*count)?;
                self.policy.check_sides(*sides)?;
                let die = PrimitiveDie::new(*sides)?;
                Ok(Pool {
                    die: die.distribution(),
                    count: *count,
                })
            }
            ExpressionNode::Reroll {
                pool,
                threshold,
                times,
            } => {
                let inner = self.pool(pool, "reroll")?;
                let limit = self.policy.reroll_depth(*times)?;
                Ok(Pool {
                    die: combinator::reroll(&inner.die, *threshold, limit)?,
                    count: inner.count,
                })
            }
            ExpressionNode::Explode { pool, max_depth } => {
                let inner = self.pool(pool, "explode")?;
                let depth = self.policy.explode_depth(*max_depth)?;
                Ok(Pool {
                    die: combinator::explode(&inner.die, depth)?,
                    count: inner.count,
                })
            }
            other => Err(DiceError::invalid(format!(
                "{} needs a dice pool, got '{}'",
                operator, other
            ))),
        }
    }
}

/// Evaluate an expression tree under `policy`, without keeping a cache.
///
/// # Errors
///
/// Same as [`Evaluator::evaluate`].
pub fn evaluate(expr: &ExpressionNode, policy: &EvalPolicy) -> Result<Distribution> {
    Evaluator::new(policy.clone()).evaluate(expr)
}

/// Parse and evaluate dice notation in one step.
///
/// # Errors
///
/// Any parse error, then any evaluation error.
///
/// # Examples
///
/// ```rust
/// use pfdice::{roll_distribution, EvalPolicy};
///
/// let dist = roll_distribution("4d6kh3", &EvalPolicy::default()).unwrap();
/// assert_eq!(dist.min(), 3);
/// assert_eq!(dist.max(), 18);
/// ```
pub fn roll_distribution(notation: &str, policy: &EvalPolicy) -> Result<Distribution> {
    Evaluator::new(policy.clone()).evaluate_str(notation)
}
