//! Pathfinder damage model.
//!
//! A thin layer over the evaluator that applies Pathfinder rules:
//! critical hits multiply the dice portion of the damage but not the flat
//! modifier, damage after penalties has a floor, and a d20 attack roll
//! decides between miss, hit and (confirmed) critical.
//!
//! Nothing here adds a new combinatorial algorithm; it only composes
//! distributions with `convolve`, `scale`, `clamp` and `mixture`.

use crate::combinator;
use crate::distribution::Distribution;
use crate::error::{DiceError, Result};
use crate::evaluator::Evaluator;
use crate::expr::ExpressionNode;
use crate::numeric::Probability;
use crate::parser;
use crate::policy::EvalPolicy;
use num_traits::One;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a critical multiplier applies to the dice portion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CriticalMode {
    /// Roll the dice portion once more per extra multiplier (×2 = roll twice).
    #[default]
    ExtraDice,

    /// Multiply a single roll of the dice portion.
    DoubleDice,
}

/// Damage of one hit: a dice portion, a flat portion and the rules applied
/// on top of them.
///
/// # Examples
///
/// ```rust
/// use pfdice::{DamageSpec, EvalPolicy};
///
/// let longsword = DamageSpec::parse("1d8+4").unwrap().critical_multiplier(2);
/// let policy = EvalPolicy::default();
///
/// let hit = longsword.hit(&policy).unwrap();
/// assert_eq!((hit.min(), hit.max()), (5, 12));
///
/// // dice rolled twice, +4 applied once
/// let crit = longsword.critical(&policy).unwrap();
/// assert_eq!((crit.min(), crit.max()), (6, 20));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageSpec {
    dice: ExpressionNode,
    flat: ExpressionNode,
    critical_multiplier: u32,
    critical_mode: CriticalMode,
    minimum: Option<i64>,
}

impl DamageSpec {
    /// Minimum damage of a successful hit unless overridden.
    pub const DEFAULT_MINIMUM: i64 = 1;

    /// Build from already-separated dice and flat portions.
    ///
    /// Defaults: critical multiplier 2, [`CriticalMode::ExtraDice`],
    /// minimum damage [`DamageSpec::DEFAULT_MINIMUM`].
    pub fn new(dice: ExpressionNode, flat: ExpressionNode) -> Self {
        Self {
            dice,
            flat,
            critical_multiplier: 2,
            critical_mode: CriticalMode::default(),
            minimum: Some(Self::DEFAULT_MINIMUM),
        }
    }

    /// Parse damage notation, splitting the top-level terms into the dice
    /// portion and the flat portion.
    ///
    /// # Errors
    ///
    /// [`DiceError::ParseError`] if the notation is malformed.
    pub fn parse(notation: &str) -> Result<Self> {
        Ok(Self::from_expression(parser::parse(notation)?))
    }

    /// Split an expression into dice and flat portions.
    pub fn from_expression(expr: ExpressionNode) -> Self {
        let terms = match expr {
            ExpressionNode::Sum(terms) => terms,
            other => vec![other],
        };
        let (flat, dice): (Vec<_>, Vec<_>) = terms.into_iter().partition(ExpressionNode::is_flat);
        Self::new(join(dice), join(flat))
    }

    /// Set the critical multiplier.
    pub fn critical_multiplier(mut self, multiplier: u32) -> Self {
        self.critical_multiplier = multiplier;
        self
    }

    /// Set how the multiplier applies to the dice portion.
    pub fn critical_mode(mut self, mode: CriticalMode) -> Self {
        self.critical_mode = mode;
        self
    }

    /// Set the damage floor; `None` allows zero or negative results.
    pub fn minimum(mut self, minimum: Option<i64>) -> Self {
        self.minimum = minimum;
        self
    }

    /// The dice portion.
    pub fn dice(&self) -> &ExpressionNode {
        &self.dice
    }

    /// The flat portion.
    pub fn flat(&self) -> &ExpressionNode {
        &self.flat
    }

    /// Damage distribution of a normal hit.
    ///
    /// # Errors
    ///
    /// Any evaluation error of the underlying expressions.
    pub fn hit(&self, policy: &EvalPolicy) -> Result<Distribution> {
        let mut evaluator = Evaluator::new(policy.clone());
        self.hit_with(&mut evaluator)
    }

    /// Damage distribution of a confirmed critical hit.
    ///
    /// # Errors
    ///
    /// [`DiceError::InvalidOperatorArguments`] for a zero multiplier, or
    /// any evaluation error of the underlying expressions.
    pub fn critical(&self, policy: &EvalPolicy) -> Result<Distribution> {
        let mut evaluator = Evaluator::new(policy.clone());
        self.critical_with(&mut evaluator)
    }

    fn hit_with(&self, evaluator: &mut Evaluator) -> Result<Distribution> {
        let dice = evaluator.evaluate(&self.dice)?;
        let flat = evaluator.evaluate(&self.flat)?;
        combinator::clamp(&dice.convolve(&flat), self.minimum, None)
    }

    fn critical_with(&self, evaluator: &mut Evaluator) -> Result<Distribution> {
        if self.critical_multiplier == 0 {
            return Err(DiceError::invalid("critical multiplier must be at least 1"));
        }
        let dice = evaluator.evaluate(&self.dice)?;
        let flat = evaluator.evaluate(&self.flat)?;
        let multiplied = match self.critical_mode {
            CriticalMode::ExtraDice => (1..self.critical_multiplier)
                .fold(dice.clone(), |acc, _| acc.convolve(&dice)),
            CriticalMode::DoubleDice => dice.scale(i64::from(self.critical_multiplier)),
        };
        combinator::clamp(&multiplied.convolve(&flat), self.minimum, None)
    }
}

/// One attack roll against a target.
///
/// A natural 1 always misses, so `hit_on` is clamped to `2..=20`. A roll
/// inside the threat range threatens a critical, which is confirmed by a
/// second roll that would hit; an unconfirmed threat deals normal damage.
///
/// # Examples
///
/// ```rust
/// use pfdice::{Attack, DamageSpec, EvalPolicy};
/// use pfdice::numeric::ratio;
///
/// let attack = Attack::new(11, DamageSpec::parse("1d8+4").unwrap()).threat_range(19);
/// let dist = attack.distribution(&EvalPolicy::default()).unwrap();
///
/// assert_eq!(dist.probability(0), ratio(1, 2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attack {
    hit_on: i64,
    threat_range: i64,
    damage: DamageSpec,
}

impl Attack {
    /// Attack that hits on a d20 roll of `hit_on` or more, threatening
    /// only on a natural 20.
    pub fn new(hit_on: i64, damage: DamageSpec) -> Self {
        Self {
            hit_on,
            threat_range: 20,
            damage,
        }
    }

    /// Lowest d20 roll that threatens a critical (19 for "19-20").
    pub fn threat_range(mut self, from: i64) -> Self {
        self.threat_range = from;
        self
    }

    /// The damage dealt on a hit.
    pub fn damage(&self) -> &DamageSpec {
        &self.damage
    }

    /// Damage distribution of this attack, misses included as 0.
    ///
    /// # Errors
    ///
    /// Any error from evaluating the damage.
    pub fn distribution(&self, policy: &EvalPolicy) -> Result<Distribution> {
        let mut evaluator = Evaluator::new(policy.clone());
        self.distribution_with(&mut evaluator)
    }

    fn distribution_with(&self, evaluator: &mut Evaluator) -> Result<Distribution> {
        let hit_on = self.hit_on.clamp(2, 20);
        let threat = self.threat_range.max(hit_on);
        let d20 = Distribution::uniform(1, 20)?;

        let p_miss = d20.probability_between(None, Some(hit_on - 1));
        let p_hit = d20.probability_between(Some(hit_on), Some(threat - 1));
        let p_threat = d20.probability_between(Some(threat), None);
        let p_confirm = d20.probability_between(Some(hit_on), None);
        debug!(
            hit_on,
            threat,
            p_miss = %p_miss,
            p_threat = %p_threat,
            "attack roll odds"
        );

        let hit = self.damage.hit_with(evaluator)?;
        let critical = self.damage.critical_with(evaluator)?;
        let threatened = Distribution::mixture(&[
            (critical, p_confirm.clone()),
            (hit.clone(), Probability::one() - p_confirm),
        ])?;

        Distribution::mixture(&[
            (Distribution::point_mass(0), p_miss),
            (hit, p_hit),
            (threatened, p_threat),
        ])
    }
}

/// Total damage of several attacks in one round (e.g. iteratives).
///
/// # Errors
///
/// Any error from evaluating one of the attacks.
///
/// # Examples
///
/// ```rust
/// use pfdice::{full_attack, Attack, DamageSpec, EvalPolicy};
///
/// let sword = DamageSpec::parse("1d8+4").unwrap();
/// let round = [Attack::new(8, sword.clone()), Attack::new(13, sword)];
/// let total = full_attack(&round, &EvalPolicy::default()).unwrap();
/// assert_eq!(total.max(), 40);
/// ```
pub fn full_attack(attacks: &[Attack], policy: &EvalPolicy) -> Result<Distribution> {
    let mut evaluator = Evaluator::new(policy.clone());
    let mut total = Distribution::point_mass(0);
    for attack in attacks {
        total = total.convolve(&attack.distribution_with(&mut evaluator)?);
    }
    Ok(total)
}

fn join(mut terms: Vec<ExpressionNode>) -> ExpressionNode {
    match terms.len() {
        0 => ExpressionNode::Constant(0),
        1 => terms.remove(0),
        _ => ExpressionNode::Sum(terms),
    }
}
