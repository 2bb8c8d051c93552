//! Bundled check providers

mod annular_width;
mod copper_clearance;
mod hole_size;
mod track_width;
mod via_diameter;

pub use annular_width::AnnularWidthProvider;
pub use copper_clearance::CopperClearanceProvider;
pub use hole_size::HoleSizeProvider;
pub use track_width::TrackWidthProvider;
pub use via_diameter::ViaDiameterProvider;

use super::item::{bound_detail, DrcViolation, ErrorCode};
use super::provider::DrcContext;
use crate::board::{BoardItem, Position};
use crate::rules::{Constraint, ConstraintKind};

/// Skip the provider when its error code is saturated or no rule mentions
/// its constraint. `label` is the capitalised check name, e.g. "Track width".
fn should_run(ctx: &mut DrcContext<'_>, code: ErrorCode, kind: ConstraintKind, label: &str) -> bool {
    if ctx.is_error_limit_exceeded(code) {
        ctx.report_aux(&format!("{} violations ignored. Skipping check.", label));
        return false;
    }

    if !ctx.resolver().has_rules_for(kind) {
        ctx.report_aux(&format!(
            "No {} constraints found. Tests not run.",
            label.to_lowercase()
        ));
        return false;
    }

    true
}

/// Measured extremes of one item, and where to report them
struct Measurement<'a, 'b> {
    item: &'b BoardItem<'a>,
    min: f64,
    max: f64,
    position: Position,
    layer: Option<&'b str>,
}

/// Compare a measurement against both bounds. Each failing bound becomes
/// its own violation.
fn check_bounds(
    ctx: &mut DrcContext<'_>,
    code: ErrorCode,
    constraint: &Constraint,
    what: &str,
    m: Measurement<'_, '_>,
) {
    let name = constraint.name();
    let mut failures = Vec::new();

    if let Some(min) = constraint.value.min {
        if m.min < min {
            failures.push((format!("min {}", what), min, m.min));
        }
    }

    if let Some(max) = constraint.value.max {
        if m.max > max {
            failures.push((format!("max {}", what), max, m.max));
        }
    }

    for (label, bound, actual) in failures {
        let violation = DrcViolation::builder(code)
            .detail(bound_detail(&name, &label, bound, actual))
            .severity(constraint.severity)
            .item(m.item)
            .position(m.position)
            .layer(m.layer)
            .rule(constraint.rule_name())
            .measured(actual, bound)
            .build();
        ctx.report_violation(violation);
    }
}

/// Running minimum and maximum
#[derive(Debug, Clone, Copy)]
struct Extremes {
    min: f64,
    max: f64,
}

impl Extremes {
    fn new() -> Self {
        Self {
            min: f64::MAX,
            max: f64::MIN,
        }
    }

    fn add(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use crate::board::{
        Board, Drill, Footprint, Pad, PadLayerShape, PadType, Padstack, Position, Trace, Via,
        ViaType, ALL_COPPER_LAYERS,
    };
    use crate::core::DrcOptions;
    use crate::drc::provider::{DrcContext, DrcTestProvider};
    use crate::drc::reporter::CollectingReporter;
    use crate::rules::{
        BoardDefaults, ConstraintKind, ConstraintSpec, DesignRule, MinOptMax, RuleCondition,
        RuleResolver, RuleSet, Severity,
    };

    pub fn via(uuid: &str, x: f64, size: f64, drill: f64, net: u32) -> Via {
        Via {
            uuid: uuid.to_string(),
            position: Position::new(x, 0.0),
            size,
            layer_sizes: BTreeMap::new(),
            drill,
            layers: ("F.Cu".to_string(), "B.Cu".to_string()),
            net,
            net_name: None,
            via_type: ViaType::Through,
        }
    }

    pub fn trace(uuid: &str, y: f64, width: f64, net: u32) -> Trace {
        Trace {
            uuid: uuid.to_string(),
            start: Position::new(0.0, y),
            end: Position::new(10.0, y),
            width,
            layer: "F.Cu".to_string(),
            net,
            net_name: None,
        }
    }

    pub fn pth_pad(uuid: &str, number: &str, shape: PadLayerShape, drill: f64) -> Pad {
        Pad {
            uuid: uuid.to_string(),
            number: number.to_string(),
            pad_type: PadType::ThruHole,
            position: Position::default(),
            orientation: 0.0,
            padstack: Padstack::uniform(shape),
            drill: Some(Drill::round(drill)),
            layers: vec![ALL_COPPER_LAYERS.to_string()],
            net: None,
            net_name: None,
        }
    }

    pub fn footprint(pads: Vec<Pad>) -> Footprint {
        Footprint {
            uuid: "fp".to_string(),
            reference: "J1".to_string(),
            value: String::new(),
            position: Position::default(),
            rotation: 0.0,
            pads,
        }
    }

    pub fn single_rule(kind: ConstraintKind, value: MinOptMax) -> RuleSet {
        RuleSet {
            rules: vec![DesignRule {
                name: "test".to_string(),
                description: None,
                condition: RuleCondition::default(),
                constraints: vec![ConstraintSpec::new(kind, value)],
                severity: Severity::Error,
                enabled: true,
            }],
            defaults: BoardDefaults::default(),
            ..RuleSet::default()
        }
    }

    /// Run one provider and return its completion flag and reporter
    pub fn run_provider(
        provider: &dyn DrcTestProvider,
        board: &Board,
        rules: &RuleSet,
        options: &DrcOptions,
    ) -> (bool, CollectingReporter) {
        let resolver = RuleResolver::new(rules, board);
        let mut reporter = CollectingReporter::new();
        let completed = {
            let mut ctx = DrcContext::new(board, &resolver, options, &mut reporter);
            provider.run(&mut ctx)
        };
        (completed, reporter)
    }
}
