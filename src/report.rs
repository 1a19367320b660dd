//! Reporting view of a distribution.
//!
//! Contains the `DistributionSummary` type, the float-valued snapshot that
//! downstream reporting (expected damage tables, percentile charts) works
//! with. Everything in here is an approximation of the exact values held
//! by [`Distribution`].

use crate::distribution::Distribution;
use crate::numeric::{self, ratio};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Percentiles reported by [`DistributionSummary`].
pub const REPORTED_PERCENTILES: [u8; 5] = [10, 25, 50, 75, 90];

/// Floating-point summary of a distribution.
///
/// Serialisable, so it can be handed to any reporting collaborator as-is.
///
/// # Examples
///
/// ```rust
/// use pfdice::{roll_distribution, EvalPolicy};
///
/// let dist = roll_distribution("2d6", &EvalPolicy::default()).unwrap();
/// let summary = dist.summarize("2d6");
///
/// assert_eq!(summary.min, 2);
/// assert_eq!(summary.max, 12);
/// assert!((summary.mean - 7.0).abs() < 1e-9);
/// assert_eq!(summary.table.len(), 11);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    /// What was evaluated, e.g. the dice notation.
    pub label: String,

    /// Smallest possible outcome.
    pub min: i64,

    /// Largest possible outcome.
    pub max: i64,

    /// Expected value (approximate).
    pub mean: f64,

    /// Variance (approximate).
    pub variance: f64,

    /// Standard deviation (approximate).
    pub std_dev: f64,

    /// `(percentile, outcome)` pairs for [`REPORTED_PERCENTILES`].
    pub percentiles: Vec<(u8, i64)>,

    /// `(outcome, probability)` pairs in ascending outcome order.
    pub table: Vec<(i64, f64)>,
}

impl DistributionSummary {
    /// Summarise `dist` under the given label.
    pub fn new(label: impl Into<String>, dist: &Distribution) -> Self {
        let percentiles = REPORTED_PERCENTILES
            .iter()
            .map(|&pct| (pct, dist.percentile_exact(&ratio(i64::from(pct), 100))))
            .collect();
        let table = dist.iter().map(|(x, p)| (x, numeric::to_f64(p))).collect();
        Self {
            label: label.into(),
            min: dist.min(),
            max: dist.max(),
            mean: dist.mean_f64(),
            variance: dist.variance_f64(),
            std_dev: dist.std_dev_f64(),
            percentiles,
            table,
        }
    }

    /// Outcome at the given reported percentile, if it was recorded.
    pub fn percentile(&self, pct: u8) -> Option<i64> {
        self.percentiles
            .iter()
            .find(|(p, _)| *p == pct)
            .map(|(_, outcome)| *outcome)
    }
}

impl Distribution {
    /// Float summary for reporting.
    pub fn summarize(&self, label: impl Into<String>) -> DistributionSummary {
        DistributionSummary::new(label, self)
    }
}

impl fmt::Display for DistributionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: mean {:.3}, std dev {:.3}, range {}..={}",
            self.label, self.mean, self.std_dev, self.min, self.max
        )?;
        for (pct, outcome) in &self.percentiles {
            writeln!(f, "  p{:<3} {}", pct, outcome)?;
        }
        for (outcome, p) in &self.table {
            writeln!(f, "  {:>5} {:>8.4}%", outcome, p * 100.0)?;
        }
        Ok(())
    }
}
