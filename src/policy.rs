//! Evaluation policy.
//!
//! The `EvalPolicy` carries the defaults and safety bounds the evaluator
//! applies to a parsed expression: how deep explosions go, how often
//! rerolls repeat when the notation does not say, and how large a dice
//! pool may get. The same tree can be evaluated against different
//! policies without reparsing.

use crate::error::{DiceError, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// How far a repeating operator is followed.
///
/// # Examples
///
/// ```rust
/// use pfdice::DepthPolicy;
///
/// let once = DepthPolicy::TruncatedAtDepth(1);
/// let forever = DepthPolicy::Exact;
/// assert_ne!(once, forever);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthPolicy {
    /// Follow the operator without limit, resolved in closed form.
    Exact,

    /// Stop after `n` repetitions.
    TruncatedAtDepth(u32),
}

impl Default for DepthPolicy {
    fn default() -> Self {
        DepthPolicy::TruncatedAtDepth(1)
    }
}

/// Defaults and safety bounds for evaluating an expression.
///
/// Deserialises from partial JSON; missing fields take their defaults.
///
/// # Examples
///
/// ```rust
/// use pfdice::{DepthPolicy, EvalPolicy};
///
/// let policy = EvalPolicy::from_json(r#"{ "max_pool_size": 50 }"#).unwrap();
/// assert_eq!(policy.max_pool_size, 50);
/// assert_eq!(policy.max_explode_depth, 10);
/// assert_eq!(policy.max_reroll_depth, DepthPolicy::TruncatedAtDepth(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalPolicy {
    /// Explosion depth used when the notation gives none (`1d8!`), and the
    /// deepest explosion accepted at all (`1d8!n` with `n` above it fails).
    pub max_explode_depth: u32,

    /// Reroll limit used when the notation gives none (`1d6r1`).
    ///
    /// In JSON either a bare repeat count (`3`) or a tagged policy
    /// (`"exact"`, `{"truncated_at_depth": 3}`).
    #[serde(deserialize_with = "depth_or_count")]
    pub max_reroll_depth: DepthPolicy,

    /// Largest repeat count accepted for a truncated reroll (`r1x<n>`).
    pub max_reroll_count: u32,

    /// Largest dice count accepted in a single pool.
    pub max_pool_size: u32,

    /// Largest number of sides accepted for one die.
    pub max_sides: u32,
}

impl Default for EvalPolicy {
    fn default() -> Self {
        Self {
            max_explode_depth: Self::DEFAULT_EXPLODE_DEPTH,
            max_reroll_depth: DepthPolicy::default(),
            max_reroll_count: Self::DEFAULT_REROLL_COUNT,
            max_pool_size: Self::DEFAULT_POOL_SIZE,
            max_sides: Self::DEFAULT_SIDES,
        }
    }
}

impl EvalPolicy {
    /// Default depth for explosions without an explicit depth.
    pub const DEFAULT_EXPLODE_DEPTH: u32 = 10;

    /// Default upper bound on truncated reroll repeats.
    pub const DEFAULT_REROLL_COUNT: u32 = 100;

    /// Default upper bound on dice per pool.
    pub const DEFAULT_POOL_SIZE: u32 = 1000;

    /// Default upper bound on die sides.
    pub const DEFAULT_SIDES: u32 = 10_000;

    /// Create a policy with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a policy from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the document is not valid.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Set the default explosion depth.
    pub fn with_max_explode_depth(mut self, depth: u32) -> Self {
        self.max_explode_depth = depth;
        self
    }

    /// Set the default reroll limit.
    pub fn with_max_reroll_depth(mut self, depth: DepthPolicy) -> Self {
        self.max_reroll_depth = depth;
        self
    }

    /// Set the bound on truncated reroll repeats.
    pub fn with_max_reroll_count(mut self, count: u32) -> Self {
        self.max_reroll_count = count;
        self
    }

    /// Set the die sides bound.
    pub fn with_max_sides(mut self, sides: u32) -> Self {
        self.max_sides = sides;
        self
    }

    /// Set the pool size bound.
    pub fn with_max_pool_size(mut self, size: u32) -> Self {
        self.max_pool_size = size;
        self
    }

    /// Reject a pool of `count` dice if it exceeds the bound.
    ///
    /// # Errors
    ///
    /// [`DiceError::PoolSizeExceeded`] when `count > max_pool_size`.
    pub fn check_pool_size(&self, count: u32) -> Result<()> {
        if count > self.max_pool_size {
            return Err(DiceError::PoolSizeExceeded {
                requested: u64::from(count),
                limit: self.max_pool_size,
            });
        }
        Ok(())
    }

    /// Reject a die with more than `max_sides` faces.
    ///
    /// # Errors
    ///
    /// [`DiceError::InvalidOperatorArguments`] when `sides > max_sides`.
    pub fn check_sides(&self, sides: u32) -> Result<()> {
        if sides > self.max_sides {
            return Err(DiceError::invalid(format!(
                "a d{} exceeds the limit of {} sides",
                sides, self.max_sides
            )));
        }
        Ok(())
    }

    /// Explosion depth for a pool, `None` meaning the notation gave none.
    ///
    /// # Errors
    ///
    /// [`DiceError::InvalidOperatorArguments`] when the requested depth is
    /// above `max_explode_depth`.
    pub fn explode_depth(&self, requested: Option<u32>) -> Result<u32> {
        match requested {
            None => Ok(self.max_explode_depth),
            Some(depth) if depth <= self.max_explode_depth => Ok(depth),
            Some(depth) => Err(DiceError::invalid(format!(
                "explode depth {} exceeds the limit of {}",
                depth, self.max_explode_depth
            ))),
        }
    }

    /// Reroll limit for a pool, `None` meaning the notation gave none.
    ///
    /// [`DepthPolicy::Exact`] is always accepted since it is resolved in
    /// closed form.
    ///
    /// # Errors
    ///
    /// [`DiceError::InvalidOperatorArguments`] when a truncated reroll,
    /// requested or defaulted, repeats more than `max_reroll_count` times.
    pub fn reroll_depth(&self, requested: Option<DepthPolicy>) -> Result<DepthPolicy> {
        match requested.unwrap_or(self.max_reroll_depth) {
            DepthPolicy::TruncatedAtDepth(times) if times > self.max_reroll_count => {
                Err(DiceError::invalid(format!(
                    "reroll count {} exceeds the limit of {}",
                    times, self.max_reroll_count
                )))
            }
            depth => Ok(depth),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DepthRepr {
    Count(u32),
    Policy(DepthPolicy),
}

fn depth_or_count<'de, D>(deserializer: D) -> std::result::Result<DepthPolicy, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match DepthRepr::deserialize(deserializer)? {
        DepthRepr::Count(n) => DepthPolicy::TruncatedAtDepth(n),
        DepthRepr::Policy(policy) => policy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = EvalPolicy::new();
        assert_eq!(policy.max_explode_depth, 10);
        assert_eq!(policy.max_reroll_depth, DepthPolicy::TruncatedAtDepth(1));
        assert_eq!(policy.max_pool_size, 1000);
        assert_eq!(policy.max_reroll_count, 100);
        assert_eq!(policy.max_sides, 10_000);
    }

    #[test]
    fn test_builder() {
        let policy = EvalPolicy::new()
            .with_max_explode_depth(3)
            .with_max_reroll_depth(DepthPolicy::Exact)
            .with_max_pool_size(20);
        assert_eq!(policy.max_explode_depth, 3);
        assert_eq!(policy.max_reroll_depth, DepthPolicy::Exact);
        assert_eq!(policy.max_pool_size, 20);
    }

    #[test]
    fn test_json_round_trip() {
        let policy = EvalPolicy::new().with_max_reroll_depth(DepthPolicy::TruncatedAtDepth(4));
        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains("truncated_at_depth"));
        assert_eq!(EvalPolicy::from_json(&json).unwrap(), policy);
    }

    #[test]
    fn test_json_exact_reroll() {
        let policy = EvalPolicy::from_json(r#"{ "max_reroll_depth": "exact" }"#).unwrap();
        assert_eq!(policy.max_reroll_depth, DepthPolicy::Exact);
    }

    #[test]
    fn test_json_bare_reroll_count() {
        let policy = EvalPolicy::from_json(
            r#"{ "max_explode_depth": 4, "max_reroll_depth": 2, "max_pool_size": 100 }"#,
        )
        .unwrap();
        assert_eq!(policy.max_reroll_depth, DepthPolicy::TruncatedAtDepth(2));
        assert_eq!(policy.max_explode_depth, 4);
        assert_eq!(policy.max_pool_size, 100);
    }

    #[test]
    fn test_json_rejects_garbage() {
        assert!(EvalPolicy::from_json("{ max_pool_size: }").is_err());
    }

    #[test]
    fn test_explode_depth_bound() {
        let policy = EvalPolicy::new().with_max_explode_depth(3);
        assert_eq!(policy.explode_depth(None), Ok(3));
        assert_eq!(policy.explode_depth(Some(2)), Ok(2));
        assert_eq!(policy.explode_depth(Some(3)), Ok(3));
        assert!(matches!(
            policy.explode_depth(Some(4_000_000_000)),
            Err(DiceError::InvalidOperatorArguments(_))
        ));
    }

    #[test]
    fn test_reroll_depth_bound() {
        let policy = EvalPolicy::new().with_max_reroll_count(5);
        assert_eq!(policy.reroll_depth(None), Ok(DepthPolicy::TruncatedAtDepth(1)));
        assert_eq!(
            policy.reroll_depth(Some(DepthPolicy::TruncatedAtDepth(5))),
            Ok(DepthPolicy::TruncatedAtDepth(5))
        );
        assert_eq!(policy.reroll_depth(Some(DepthPolicy::Exact)), Ok(DepthPolicy::Exact));
        assert!(matches!(
            policy.reroll_depth(Some(DepthPolicy::TruncatedAtDepth(6))),
            Err(DiceError::InvalidOperatorArguments(_))
        ));

        // a defaulted limit is held to the same bound
        let policy = policy.with_max_reroll_depth(DepthPolicy::TruncatedAtDepth(9));
        assert!(policy.reroll_depth(None).is_err());
    }

    #[test]
    fn test_sides_bound() {
        let policy = EvalPolicy::new().with_max_sides(100);
        assert!(policy.check_sides(100).is_ok());
        assert!(matches!(
            policy.check_sides(101),
            Err(DiceError::InvalidOperatorArguments(_))
        ));
    }

    #[test]
    fn test_json_missing_bounds_default() {
        let policy = EvalPolicy::from_json(r#"{ "max_sides": 20 }"#).unwrap();
        assert_eq!(policy.max_sides, 20);
        assert_eq!(policy.max_reroll_count, EvalPolicy::DEFAULT_REROLL_COUNT);
    }

    #[test]
    fn test_pool_size_bound() {
        let policy = EvalPolicy::new().with_max_pool_size(10);
        assert!(policy.check_pool_size(10).is_ok());
        assert_eq!(
            policy.check_pool_size(11),
            Err(DiceError::PoolSizeExceeded {
                requested: 11,
                limit: 10
            })
        );
    }
}
