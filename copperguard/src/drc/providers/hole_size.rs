//! Drilled hole size
//!
//! The smallest dimension of each hole is compared with the minimum, the
//! largest with the maximum. Covers plated and non-plated pad holes and
//! vias.

use super::{check_bounds, should_run, Measurement};
use crate::board::BoardItem;
use crate::drc::item::ErrorCode;
use crate::drc::provider::{DrcContext, DrcTestProvider};
use crate::rules::ConstraintKind;

pub struct HoleSizeProvider;

const CODES: &[ErrorCode] = &[ErrorCode::DrillOutOfRange];

/// Smallest and largest drill dimension, or `None` for items without a hole
fn hole_extent(item: &BoardItem<'_>) -> Option<(f64, f64)> {
    match *item {
        BoardItem::Via(via) if via.drill > 0.0 => Some((via.drill, via.drill)),
        BoardItem::Pad { pad, .. } => pad
            .drill
            .as_ref()
            .filter(|d| !d.is_empty())
            .map(|d| (d.min_dimension(), d.max_dimension())),
        _ => None,
    }
}

impl DrcTestProvider for HoleSizeProvider {
    fn name(&self) -> &str {
        "hole_size"
    }

    fn description(&self) -> &str {
        "Checking hole sizes..."
    }

    fn error_codes(&self) -> &[ErrorCode] {
        CODES
    }

    fn run(&self, ctx: &mut DrcContext<'_>) -> bool {
        if !should_run(
            ctx,
            ErrorCode::DrillOutOfRange,
            ConstraintKind::HoleSize,
            "Hole size",
        ) {
            return true;
        }

        let board = ctx.board();
        let items: Vec<_> = board
            .vias
            .iter()
            .map(BoardItem::Via)
            .chain(board.pads())
            .filter_map(|item| hole_extent(&item).map(|extent| (item, extent)))
            .collect();
        let total = items.len();

        for (done, (item, (min, max))) in items.iter().enumerate() {
            if ctx.is_error_limit_exceeded(ErrorCode::DrillOutOfRange) {
                break;
            }

            if !ctx.report_progress(done + 1, total) {
                return false;
            }

            let constraint = ctx
                .resolver()
                .evaluate(ConstraintKind::HoleSize, item, None, None);
            if constraint.is_ignored() {
                continue;
            }

            let layers = board.item_layers(item);
            check_bounds(
                ctx,
                ErrorCode::DrillOutOfRange,
                &constraint,
                "hole",
                Measurement {
                    item,
                    min: *min,
                    max: *max,
                    position: item.position(),
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
    use crate::board::{Board, Drill, PadLayerShape, PadType};
    use crate::core::DrcOptions;
    use crate::drc::providers::test_support::*;
    use crate::rules::MinOptMax;

    #[test]
    fn test_small_via_drill() {
        let board = Board {
            vias: vec![via("v1", 0.0, 0.6, 0.15, 1), via("v2", 2.0, 0.6, 0.3, 1)],
            ..Board::default()
        };
        let rules = single_rule(ConstraintKind::HoleSize, MinOptMax::min(0.2));
        let (completed, reporter) =
            run_provider(&HoleSizeProvider, &board, &rules, &DrcOptions::default());

        assert!(completed);
        assert_eq!(reporter.violations.len(), 1);
        assert_eq!(reporter.violations[0].items, vec!["v1"]);
        assert_eq!(
            reporter.violations[0].message,
            "Hole size out of range (rule 'test' min hole 0.2000 mm; actual 0.1500 mm)"
        );
    }

    #[test]
    fn test_oblong_pad_hole_uses_both_dimensions() {
        let mut slot = pth_pad("slot", "1", PadLayerShape::oval(3.0, 1.5), 0.0);
        slot.drill = Some(Drill::oblong(2.5, 0.8));
        let mut npth = pth_pad("npth", "", PadLayerShape::circle(3.5), 3.5);
        npth.pad_type = PadType::NPThruHole;

        let board = Board {
            footprints: vec![footprint(vec![slot, npth])],
            ..Board::default()
        };
        let rules = single_rule(ConstraintKind::HoleSize, MinOptMax::range(1.0, 3.0));
        let (_, reporter) = run_provider(&HoleSizeProvider, &board, &rules, &DrcOptions::default());

        // Slot: 0.8 too narrow. NPTH: 3.5 too large.
        assert_eq!(reporter.violations.len(), 2);
        assert!(reporter.violations[0].message.contains("min hole"));
        assert_eq!(reporter.violations[1].items, vec!["npth"]);
        assert!(reporter.violations[1].message.contains("max hole"));
    }
}
