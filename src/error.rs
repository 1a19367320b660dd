//! Error types for parsing and evaluating dice expressions.
//!
//! Every failure the engine can report is a variant of [`DiceError`].
//! Nothing is retried or partially returned: evaluation is deterministic,
//! so the same input always produces the same error.

use thiserror::Error;

/// Errors that can occur while parsing or evaluating dice notation.
///
/// # Examples
///
/// ```rust
/// use pfdice::DiceError;
///
/// let err = DiceError::PoolSizeExceeded { requested: 100_000, limit: 1000 };
/// println!("{}", err); // "Dice pool of 100000 exceeds the limit of 1000"
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DiceError {
    /// The notation could not be parsed.
    ///
    /// `token` is the offending lexeme and `position` its 0-based
    /// character offset in the input.
    #[error("Parse error at position {position} near {token:?}: {reason}")]
    ParseError {
        token: String,
        position: usize,
        reason: String,
    },

    /// A combinator received arguments outside its domain.
    ///
    /// For example keeping more dice than were rolled, or a die with
    /// zero sides.
    #[error("Invalid operator arguments: {0}")]
    InvalidOperatorArguments(String),

    /// A dice pool is larger than the configured safety bound.
    #[error("Dice pool of {requested} exceeds the limit of {limit}")]
    PoolSizeExceeded { requested: u64, limit: u32 },

    /// A distribution failed its consistency check.
    ///
    /// This signals a programming error: probabilities that are negative
    /// or do not sum to exactly one.
    #[error("Malformed distribution: {0}")]
    MalformedDistribution(String),
}

impl DiceError {
    pub(crate) fn parse(token: impl Into<String>, position: usize, reason: impl Into<String>) -> Self {
        DiceError::ParseError {
            token: token.into(),
            position,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        DiceError::InvalidOperatorArguments(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DiceError>;
