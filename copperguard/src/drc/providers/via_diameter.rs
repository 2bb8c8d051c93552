//! Via pad diameter, checked on every layer the via spans

use super::{check_bounds, should_run, Extremes, Measurement};
use crate::board::BoardItem;
use crate::drc::item::ErrorCode;
use crate::drc::provider::{DrcContext, DrcTestProvider};
use crate::rules::ConstraintKind;

pub struct ViaDiameterProvider;

const CODES: &[ErrorCode] = &[ErrorCode::ViaDiameter];

impl DrcTestProvider for ViaDiameterProvider {
    fn name(&self) -> &str {
        "via_diameter"
    }

    fn description(&self) -> &str {
        "Checking via diameters..."
    }

    fn error_codes(&self) -> &[ErrorCode] {
        CODES
    }

    fn run(&self, ctx: &mut DrcContext<'_>) -> bool {
        if !should_run(
            ctx,
            ErrorCode::ViaDiameter,
            ConstraintKind::ViaDiameter,
            "Via diameter",
        ) {
            return true;
        }

        let board = ctx.board();
        let total = board.vias.len();

        for (done, via) in board.vias.iter().enumerate() {
            if ctx.is_error_limit_exceeded(ErrorCode::ViaDiameter) {
                break;
            }

            if !ctx.report_progress(done + 1, total) {
                return false;
            }

            let item = BoardItem::Via(via);
            let constraint = ctx
                .resolver()
                .evaluate(ConstraintKind::ViaDiameter, &item, None, None);
            if constraint.is_ignored() {
                continue;
            }

            let layers = board.via_layers(via);
            let mut diameters = Extremes::new();
            for layer in &layers {
                diameters.add(via.width_on(layer));
            }
            if diameters.is_empty() {
                continue;
            }

            check_bounds(
                ctx,
                ErrorCode::ViaDiameter,
                &constraint,
                "diameter",
                Measurement {
                    item: &item,
                    min: diameters.min,
                    max: diameters.max,
                    position: via.position,
                    layer: layers.first().copied(),
                },
            );
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::core::DrcOptions;
    use crate::drc::providers::test_support::*;
    use crate::rules::MinOptMax;

    #[test]
    fn test_per_layer_diameter() {
        let mut v = via("v1", 0.0, 0.6, 0.3, 1);
        v.layer_sizes.insert("B.Cu".to_string(), 0.4);
        let board = Board {
            vias: vec![v, via("v2", 1.0, 0.6, 0.3, 1)],
            ..Board::default()
        };
        let rules = single_rule(ConstraintKind::ViaDiameter, MinOptMax::min(0.5));
        let (_, reporter) =
            run_provider(&ViaDiameterProvider, &board, &rules, &DrcOptions::default());

        assert_eq!(reporter.violations.len(), 1);
        let v = &reporter.violations[0];
        assert_eq!(v.items, vec!["v1"]);
        assert_eq!(v.measured, Some(0.4));
        assert!(v.message.contains("min diameter 0.5000 mm; actual 0.4000 mm"));
    }

    #[test]
    fn test_skips_without_rules() {
        let board = Board {
            vias: vec![via("v1", 0.0, 0.2, 0.1, 1)],
            ..Board::default()
        };
        let rules = single_rule(ConstraintKind::TrackWidth, MinOptMax::min(0.1));
        let (completed, reporter) =
            run_provider(&ViaDiameterProvider, &board, &rules, &DrcOptions::default());

        assert!(completed);
        assert!(reporter.violations.is_empty());
        assert_eq!(
            reporter.messages,
            vec!["No via diameter constraints found. Tests not run."]
        );
    }
}
