//! # pfdice - Exact Probability Distributions for Dice Notation
//!
//! A calculation engine for tabletop dice that provides:
//! - **Exact** results (every probability is a rational number)
//! - **Pool operators** (keep/drop highest or lowest, reroll, explode)
//! - **Bounded** evaluation (explosion depth and pool size come from a policy)
//! - **Pathfinder damage** (critical multipliers, hit/miss odds, full attacks)
//!
//! ## Core Concepts
//!
//! ### Evaluation Pipeline
//!
//! Notation flows through a simple pipeline:
//!
//! ```text
//! "4d6kh3+2" → [Parser] → [ExpressionNode] → [Evaluator] → [Distribution]
//! ```
//!
//! 1. **Parser** turns notation into an expression tree
//! 2. **Evaluator** folds the tree bottom-up using the combinators
//! 3. **Distribution** holds the exact outcome probabilities
//!
//! The damage model sits on top and composes distributions the same way.
//!
//! ## Example
//!
//! ```rust
//! use pfdice::*;
//! use pfdice::numeric::ratio;
//!
//! let policy = EvalPolicy::default();
//!
//! let stats = roll_distribution("4d6kh3", &policy).unwrap();
//! assert_eq!((stats.min(), stats.max()), (3, 18));
//! assert_eq!(stats.probability(18), ratio(21, 1296));
//!
//! let greatsword = DamageSpec::parse("2d6+6").unwrap().critical_multiplier(2);
//! let attack = Attack::new(12, greatsword).threat_range(19);
//! let damage = attack.distribution(&policy).unwrap();
//! assert_eq!(damage.probability(0), ratio(11, 20));
//! ```
//!
//! ## Modules
//!
//! - [`distribution`] - Exact finite distributions
//! - [`die`] - Single fair dice
//! - [`combinator`] - Pool operators (sum, keep/drop, reroll, explode)
//! - [`expr`] - Expression trees
//! - [`parser`] - Dice notation parser
//! - [`evaluator`] - Expression evaluation with a pool cache
//! - [`policy`] - Evaluation bounds
//! - [`damage`] - Pathfinder damage model
//! - [`report`] - Floating-point summaries
//! - [`numeric`] - Rational arithmetic helpers
//! - [`error`] - Error types

pub mod combinator;
pub mod damage;
pub mod die;
pub mod distribution;
pub mod error;
pub mod evaluator;
pub mod expr;
pub mod numeric;
pub mod parser;
pub mod policy;
pub mod report;

// Re-export main types for convenience
pub use distribution::Distribution;
pub use error::{DiceError, Result};
pub use evaluator::{evaluate, roll_distribution, Evaluator};
pub use expr::ExpressionNode;
pub use parser::{parse, Parser};
pub use policy::{DepthPolicy, EvalPolicy};

pub use die::PrimitiveDie;
pub use numeric::Probability;
pub use report::DistributionSummary;

// Re-export damage types
pub use damage::{full_attack, Attack, CriticalMode, DamageSpec};
