//! Design Rule Sets
//!
//! Rules are defined in JSON. Each rule has a condition selecting the items
//! it applies to and one or more constraints. Later rules take priority over
//! earlier ones; board defaults apply when nothing else matches.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{ConstraintKind, MinOptMax, Severity};
use crate::board::ItemKind;
use crate::core::{DrcError, DrcOptions};

/// Constraint values configured on the board itself. Acts as an implicit
/// rule below every explicit one.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BoardDefaults {
    #[serde(default)]
    pub min_annular_width: Option<f64>,
    #[serde(default)]
    pub min_hole_size: Option<f64>,
    #[serde(default)]
    pub max_hole_size: Option<f64>,
    #[serde(default)]
    pub min_via_diameter: Option<f64>,
    #[serde(default)]
    pub min_track_width: Option<f64>,
    #[serde(default)]
    pub min_clearance: Option<f64>,
}

impl BoardDefaults {
    pub fn constraint_for(&self, kind: ConstraintKind) -> Option<MinOptMax> {
        let value = match kind {
            ConstraintKind::AnnularWidth => MinOptMax {
                min: self.min_annular_width,
                ..MinOptMax::default()
            },
            ConstraintKind::HoleSize => MinOptMax {
                min: self.min_hole_size,
                opt: None,
                max: self.max_hole_size,
            },
            ConstraintKind::ViaDiameter => MinOptMax {
                min: self.min_via_diameter,
                ..MinOptMax::default()
            },
            ConstraintKind::TrackWidth => MinOptMax {
                min: self.min_track_width,
                ..MinOptMax::default()
            },
            ConstraintKind::Clearance => MinOptMax {
                min: self.min_clearance,
                ..MinOptMax::default()
            },
        };

        (!value.is_empty()).then_some(value)
    }
}

/// Selects the items a rule applies to. Empty fields match everything.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RuleCondition {
    /// Item kinds the rule applies to
    #[serde(default)]
    pub item_types: Vec<ItemKind>,
    /// Case-insensitive substring of the net name
    #[serde(default)]
    pub net_pattern: Option<String>,
    #[serde(default)]
    pub netclass: Option<String>,
    /// Footprint reference prefix, e.g. `U` or `J1`
    #[serde(default)]
    pub footprint_pattern: Option<String>,
    /// Copper layer name
    #[serde(default)]
    pub layer: Option<String>,
}

/// One bound set for one constraint kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConstraintSpec {
    pub kind: ConstraintKind,
    #[serde(flatten)]
    pub value: MinOptMax,
}

impl ConstraintSpec {
    pub fn new(kind: ConstraintKind, value: MinOptMax) -> Self {
        Self { kind, value }
    }
}

/// Named rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignRule {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub condition: RuleCondition,
    #[serde(default)]
    pub constraints: Vec<ConstraintSpec>,
    /// Severity of violations; `Ignore` suppresses them
    #[serde(default)]
    pub severity: Severity,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl DesignRule {
    pub fn constraint(&self, kind: ConstraintKind) -> Option<&ConstraintSpec> {
        self.constraints.iter().find(|c| c.kind == kind)
    }
}

/// Rule set containing board defaults, rules and engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub defaults: BoardDefaults,
    /// Rules in ascending priority
    #[serde(default)]
    pub rules: Vec<DesignRule>,
    #[serde(default)]
    pub settings: DrcOptions,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            name: "Empty".to_string(),
            version: default_version(),
            description: None,
            author: None,
            defaults: BoardDefaults::default(),
            rules: Vec::new(),
            settings: DrcOptions::default(),
        }
    }
}

impl RuleSet {
    pub fn from_json_str(json: &str) -> Result<Self, DrcError> {
        let rule_set: RuleSet = serde_json::from_str(json)?;
        rule_set.validate()?;
        Ok(rule_set)
    }

    pub fn from_file(path: &Path) -> Result<Self, DrcError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Reject rules that can never produce a meaningful constraint
    pub fn validate(&self) -> Result<(), DrcError> {
        self.settings.validate()?;

        for rule in &self.rules {
            if rule.constraints.is_empty() {
                return Err(DrcError::Rules(format!(
                    "rule '{}' has no constraints",
                    rule.name
                )));
            }

            for spec in &rule.constraints {
                if spec.value.is_empty() && rule.severity != Severity::Ignore {
                    return Err(DrcError::Rules(format!(
                        "rule '{}': {} constraint has no bounds",
                        rule.name, spec.kind
                    )));
                }

                if let (Some(min), Some(max)) = (spec.value.min, spec.value.max) {
                    if min > max {
                        return Err(DrcError::Rules(format!(
                            "rule '{}': {} min {} exceeds max {}",
                            rule.name, spec.kind, min, max
                        )));
                    }
                }

                if [spec.value.min, spec.value.opt, spec.value.max]
                    .iter()
                    .flatten()
                    .any(|v| !v.is_finite() || *v < 0.0)
                {
                    return Err(DrcError::Rules(format!(
                        "rule '{}': {} bounds must be finite and non-negative",
                        rule.name, spec.kind
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn enabled_rules(&self) -> impl DoubleEndedIterator<Item = &DesignRule> {
        self.rules.iter().filter(|r| r.enabled)
    }
}

/// Generate a sample rule set (for documentation and the CLI)
pub fn generate_sample_rules() -> RuleSet {
    RuleSet {
        name: "Standard Fabrication Rules".to_string(),
        version: "1.0.0".to_string(),
        description: Some("Typical 2-layer fabrication limits".to_string()),
        author: Some("Engineering Team".to_string()),
        defaults: BoardDefaults {
            min_annular_width: Some(0.1),
            min_hole_size: Some(0.2),
            max_hole_size: Some(6.3),
            min_via_diameter: Some(0.45),
            min_track_width: Some(0.15),
            min_clearance: Some(0.15),
        },
        rules: vec![
            DesignRule {
                name: "Power Tracks".to_string(),
                description: Some("Power nets carry more current".to_string()),
                condition: RuleCondition {
                    item_types: vec![ItemKind::Track],
                    netclass: Some("Power".to_string()),
                    ..RuleCondition::default()
                },
                constraints: vec![
                    ConstraintSpec::new(ConstraintKind::TrackWidth, MinOptMax::min(0.5)),
                    ConstraintSpec::new(ConstraintKind::Clearance, MinOptMax::min(0.3)),
                ],
                severity: Severity::Error,
                enabled: true,
            },
            DesignRule {
                name: "Via Ring".to_string(),
                description: Some("Vias need a wider ring than pads".to_string()),
                condition: RuleCondition {
                    item_types: vec![ItemKind::Via],
                    ..RuleCondition::default()
                },
                constraints: vec![ConstraintSpec::new(
                    ConstraintKind::AnnularWidth,
                    MinOptMax::min(0.13),
                )],
                severity: Severity::Error,
                enabled: true,
            },
            DesignRule {
                name: "Connector Rings".to_string(),
                description: Some("Connector pins are soldered by hand".to_string()),
                condition: RuleCondition {
                    item_types: vec![ItemKind::Pad],
                    footprint_pattern: Some("J".to_string()),
                    ..RuleCondition::default()
                },
                constraints: vec![ConstraintSpec::new(
                    ConstraintKind::AnnularWidth,
                    MinOptMax::range(0.2, 1.5),
                )],
                severity: Severity::Warning,
                enabled: true,
            },
        ],
        settings: DrcOptions::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rules_serialization() {
        let rules = generate_sample_rules();
        let json = serde_json::to_string_pretty(&rules).unwrap();

        let parsed = RuleSet::from_json_str(&json).unwrap();
        assert_eq!(parsed.name, "Standard Fabrication Rules");
        assert_eq!(parsed.rules.len(), 3);
        assert_eq!(parsed.settings.progress_delta, 500);
    }

    #[test]
    fn test_constraint_spec_flattens_bounds() {
        let spec: ConstraintSpec =
            serde_json::from_str(r#"{"kind": "annular_width", "min": 0.2}"#).unwrap();
        assert_eq!(spec.kind, ConstraintKind::AnnularWidth);
        assert_eq!(spec.value.min, Some(0.2));
        assert_eq!(spec.value.max, None);
    }

    #[test]
    fn test_minimal_rule_set() {
        let rules = RuleSet::from_json_str(r#"{"name": "minimal"}"#).unwrap();
        assert!(rules.rules.is_empty());
        assert_eq!(rules.defaults, BoardDefaults::default());
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let json = r#"{
            "name": "bad",
            "rules": [{
                "name": "inverted",
                "constraints": [{"kind": "hole_size", "min": 1.0, "max": 0.5}]
            }]
        }"#;
        assert!(matches!(RuleSet::from_json_str(json), Err(DrcError::Rules(_))));
    }

    #[test]
    fn test_rejects_tiny_max_error() {
        let json = r#"{
            "name": "r",
            "defaults": {"min_annular_width": 0.1},
            "settings": {"max_error": 1e-17}
        }"#;
        assert!(matches!(RuleSet::from_json_str(json), Err(DrcError::Rules(_))));

        let json = r#"{"name": "r", "settings": {"max_error": 0.0}}"#;
        assert!(matches!(RuleSet::from_json_str(json), Err(DrcError::Rules(_))));

        let json = r#"{"name": "r", "settings": {"max_error": 0.001}}"#;
        assert!(RuleSet::from_json_str(json).is_ok());
    }

    #[test]
    fn test_rejects_unbounded_constraint() {
        let json = r#"{
            "name": "bad",
            "rules": [{"name": "empty", "constraints": [{"kind": "clearance"}]}]
        }"#;
        assert!(matches!(RuleSet::from_json_str(json), Err(DrcError::Rules(_))));
    }

    #[test]
    fn test_ignore_rule_needs_no_bounds() {
        let json = r#"{
            "name": "ok",
            "rules": [{
                "name": "waive",
                "severity": "Ignore",
                "constraints": [{"kind": "annular_width"}]
            }]
        }"#;
        assert!(RuleSet::from_json_str(json).is_ok());
    }

    #[test]
    fn test_defaults_constraint() {
        let defaults = BoardDefaults {
            min_hole_size: Some(0.3),
            ..BoardDefaults::default()
        };
        assert_eq!(
            defaults.constraint_for(ConstraintKind::HoleSize),
            Some(MinOptMax::min(0.3))
        );
        assert_eq!(defaults.constraint_for(ConstraintKind::Clearance), None);
    }
}
