//! Priority-ordered rule resolution over a [`RuleSet`]

use super::{
    Constraint, ConstraintKind, ConstraintResolver, DesignRule, RuleCondition, RuleRef, RuleSet,
    Severity,
};
use crate::board::{Board, BoardItem};

/// Rule name attached to constraints that come from board defaults
pub const BOARD_DEFAULTS_RULE: &str = "board setup constraints";

/// Resolves constraints against one board. Rules are tried from last to
/// first; the first enabled match carrying the requested kind wins.
pub struct RuleResolver<'a> {
    rules: &'a RuleSet,
    board: &'a Board,
}

impl<'a> RuleResolver<'a> {
    pub fn new(rules: &'a RuleSet, board: &'a Board) -> Self {
        Self { rules, board }
    }

    pub fn rules(&self) -> &RuleSet {
        self.rules
    }

    fn matches(&self, condition: &RuleCondition, item: &BoardItem<'_>, layer: Option<&str>) -> bool {
        if !condition.item_types.is_empty() && !condition.item_types.contains(&item.kind()) {
            return false;
        }

        if let Some(pattern) = &condition.net_pattern {
            let net_name = item
                .net_name()
                .or_else(|| item.net().and_then(|n| self.board.net_name(n)));
            let matched = net_name
                .map(|name| name.to_lowercase().contains(&pattern.to_lowercase()))
                .unwrap_or(false);
            if !matched {
                return false;
            }
        }

        if let Some(netclass) = &condition.netclass {
            let matched = item
                .net()
                .and_then(|n| self.board.netclass_of(n))
                .map(|nc| nc.eq_ignore_ascii_case(netclass))
                .unwrap_or(false);
            if !matched {
                return false;
            }
        }

        if let Some(prefix) = &condition.footprint_pattern {
            let matched = item
                .footprint()
                .map(|fp| fp.reference.starts_with(prefix.as_str()))
                .unwrap_or(false);
            if !matched {
                return false;
            }
        }

        if let Some(rule_layer) = &condition.layer {
            let matched = match layer {
                Some(layer) => layer == rule_layer,
                None => self
                    .board
                    .item_layers(item)
                    .iter()
                    .any(|l| *l == rule_layer.as_str()),
            };
            if !matched {
                return false;
            }
        }

        true
    }

    fn rule_applies(
        &self,
        rule: &DesignRule,
        a: &BoardItem<'_>,
        b: Option<&BoardItem<'_>>,
        layer: Option<&str>,
    ) -> bool {
        self.matches(&rule.condition, a, layer)
            || b.map_or(false, |b| self.matches(&rule.condition, b, layer))
    }
}

impl ConstraintResolver for RuleResolver<'_> {
    fn evaluate(
        &self,
        kind: ConstraintKind,
        a: &BoardItem<'_>,
        b: Option<&BoardItem<'_>>,
        layer: Option<&str>,
    ) -> Constraint {
        let explicit = self.rules.enabled_rules().rev().find_map(|rule| {
            let spec = rule.constraint(kind)?;
            self.rule_applies(rule, a, b, layer).then(|| Constraint {
                kind,
                value: spec.value,
                severity: rule.severity,
                rule: Some(RuleRef {
                    name: rule.name.clone(),
                    implicit: false,
                }),
            })
        });

        let constraint = explicit.unwrap_or_else(|| match self.rules.defaults.constraint_for(kind) {
            Some(value) => Constraint {
                kind,
                value,
                severity: Severity::Error,
                rule: Some(RuleRef {
                    name: BOARD_DEFAULTS_RULE.to_string(),
                    implicit: true,
                }),
            },
            None => Constraint::none(kind),
        });

        debug_assert!(constraint.is_valid());
        constraint
    }

    fn has_rules_for(&self, kind: ConstraintKind) -> bool {
        self.rules.defaults.constraint_for(kind).is_some()
            || self
                .rules
                .enabled_rules()
                .any(|r| r.constraint(kind).is_some())
    }

    fn max_value(&self, kind: ConstraintKind) -> Option<f64> {
        let from_rules = self
            .rules
            .enabled_rules()
            .filter_map(|r| r.constraint(kind))
            .map(|spec| spec.value);

        self.rules
            .defaults
            .constraint_for(kind)
            .into_iter()
            .chain(from_rules)
            .flat_map(|v| [v.min, v.opt, v.max])
            .flatten()
            .reduce(f64::max)
    }
}
