//! Constraint resolution
//!
//! Providers never look at rules directly. They ask a [`ConstraintResolver`]
//! for the effective [`Constraint`] of an item (or pair of items) and compare
//! their measurement against it.
//!
//! [`RuleResolver`] is the bundled implementation: a priority-ordered
//! [`RuleSet`] loaded from JSON, with board defaults as the fallback.

pub mod resolver;
pub mod rule_set;

pub use resolver::RuleResolver;
pub use rule_set::{
    generate_sample_rules, BoardDefaults, ConstraintSpec, DesignRule, RuleCondition, RuleSet,
};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board::BoardItem;

/// What a constraint limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    AnnularWidth,
    HoleSize,
    ViaDiameter,
    TrackWidth,
    Clearance,
}

impl ConstraintKind {
    pub fn all() -> &'static [ConstraintKind] {
        &[
            ConstraintKind::AnnularWidth,
            ConstraintKind::HoleSize,
            ConstraintKind::ViaDiameter,
            ConstraintKind::TrackWidth,
            ConstraintKind::Clearance,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConstraintKind::AnnularWidth => "annular_width",
            ConstraintKind::HoleSize => "hole_size",
            ConstraintKind::ViaDiameter => "via_diameter",
            ConstraintKind::TrackWidth => "track_width",
            ConstraintKind::Clearance => "clearance",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Ignore,
}

/// Optional lower, preferred and upper bounds (mm)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct MinOptMax {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub opt: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl MinOptMax {
    pub fn min(value: f64) -> Self {
        Self {
            min: Some(value),
            ..Self::default()
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            opt: None,
            max: Some(max),
        }
    }

    pub fn has_min(&self) -> bool {
        self.min.is_some()
    }

    pub fn has_max(&self) -> bool {
        self.max.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.opt.is_none() && self.max.is_none()
    }
}

/// Reference to the rule a constraint came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleRef {
    pub name: String,
    /// True for board defaults rather than an explicit rule
    pub implicit: bool,
}

/// Effective outcome of rule resolution for one query
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub value: MinOptMax,
    pub severity: Severity,
    pub rule: Option<RuleRef>,
}

impl Constraint {
    /// No rule applies: nothing to check
    pub fn none(kind: ConstraintKind) -> Self {
        Self {
            kind,
            value: MinOptMax::default(),
            severity: Severity::Ignore,
            rule: None,
        }
    }

    /// At least one bound, or nothing to report
    pub fn is_valid(&self) -> bool {
        !self.value.is_empty() || self.severity == Severity::Ignore
    }

    pub fn is_ignored(&self) -> bool {
        self.severity == Severity::Ignore
    }

    /// Name used in violation messages
    pub fn name(&self) -> String {
        match &self.rule {
            Some(rule) if rule.implicit => "board setup constraints".to_string(),
            Some(rule) => format!("rule '{}'", rule.name),
            None => "no rule".to_string(),
        }
    }

    pub fn rule_name(&self) -> Option<String> {
        self.rule.as_ref().map(|r| r.name.clone())
    }
}

/// Query contract between providers and whatever owns the rules
pub trait ConstraintResolver {
    /// Effective constraint of `kind` for `a` (paired with `b` for
    /// clearance-like checks), optionally restricted to one layer
    fn evaluate(
        &self,
        kind: ConstraintKind,
        a: &BoardItem<'_>,
        b: Option<&BoardItem<'_>>,
        layer: Option<&str>,
    ) -> Constraint;

    /// Whether any rule mentions `kind` at all
    fn has_rules_for(&self, kind: ConstraintKind) -> bool;

    /// Largest bound any rule of `kind` can produce
    fn max_value(&self, _kind: ConstraintKind) -> Option<f64> {
        None
    }
}
