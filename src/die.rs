//! Primitive dice.
//!
//! A primitive die is a single fair die with faces `1..=sides`. It is the
//! leaf every dice pool is built from.

use crate::distribution::Distribution;
use crate::error::{DiceError, Result};
use crate::numeric::{integer, Probability};
use num_traits::One;
use std::fmt;

/// A single fair die with `sides` faces numbered from 1.
///
/// # Examples
///
/// ```rust
/// use pfdice::PrimitiveDie;
/// use pfdice::numeric::ratio;
///
/// let d8 = PrimitiveDie::new(8).unwrap();
/// assert_eq!(d8.distribution().probability(3), ratio(1, 8));
/// assert_eq!(d8.to_string(), "d8");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveDie {
    sides: u32,
}

impl PrimitiveDie {
    /// Create a die with the given number of sides.
    ///
    /// # Errors
    ///
    /// [`DiceError::InvalidOperatorArguments`] if `sides` is zero.
    pub fn new(sides: u32) -> Result<Self> {
        if sides == 0 {
            return Err(DiceError::invalid("a die needs at least one side"));
        }
        Ok(Self { sides })
    }

    /// Number of faces.
    pub fn sides(&self) -> u32 {
        self.sides
    }

    /// Highest face value.
    pub fn max_face(&self) -> i64 {
        i64::from(self.sides)
    }

    /// Uniform distribution over the faces.
    pub fn distribution(&self) -> Distribution {
        let p = Probability::one() / integer(self.max_face());
        Distribution::trusted((1..=self.max_face()).map(|face| (face, p.clone())).collect())
    }
}

impl fmt::Display for PrimitiveDie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides)
    }
}
