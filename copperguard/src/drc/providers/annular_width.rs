//! Annular ring width
//!
//! Vias: `(diameter - drill) / 2` on every copper layer they span.
//!
//! Plated through-hole pads: the closed-form width where the pad shape
//! allows it, otherwise the distance from the hole to the pad outline.
//! Copper from other pads with the same number (a connector pin split over
//! several pads, for instance) counts towards the ring, so a pad failing on
//! its own is re-measured against the merged outline of all its siblings.

use geo::{MultiPolygon, Polygon};
use tracing::debug;

use super::{check_bounds, should_run, Extremes, Measurement};
use crate::board::{Board, BoardItem, Footprint, Pad, Via};
use crate::drc::item::ErrorCode;
use crate::drc::provider::{DrcContext, DrcTestProvider};
use crate::geometry::{
    aggregate_outline, analytic_annular_width, pad_layer_polygon, polygon_annular_width, to_coord,
    ErrorLoc,
};
use crate::rules::ConstraintKind;

pub struct AnnularWidthProvider;

const CODES: &[ErrorCode] = &[ErrorCode::AnnularWidth];

impl AnnularWidthProvider {
    /// Relative cost of checking `item`, for progress reporting
    pub fn effort(board: &Board, item: &BoardItem<'_>) -> usize {
        match *item {
            BoardItem::Via(_) => 1,
            BoardItem::Pad { pad, .. } if pad.is_plated_through() && pad.has_hole() => board
                .pad_layers(pad)
                .iter()
                .map(|layer| 5 + usize::from(pad.shape_on(layer).supports_analytic_width()))
                .sum(),
            _ => 0,
        }
    }
}

fn via_widths(board: &Board, via: &Via) -> Extremes {
    let mut widths = Extremes::new();
    for layer in board.via_layers(via) {
        widths.add((via.width_on(layer) - via.drill) / 2.0);
    }
    widths
}

fn single_pad_width(pad: &Pad, layer: &str, max_error: f64) -> f64 {
    let Some(hole) = pad.hole_shape() else {
        return 0.0;
    };

    let outline = pad_layer_polygon(
        pad.shape_on(layer),
        pad.position,
        pad.orientation,
        max_error,
        ErrorLoc::Inside,
    );

    polygon_annular_width(
        &MultiPolygon::new(vec![outline]),
        &hole,
        to_coord(pad.position),
    )
}

fn aggregate_pad_width(pad: &Pad, siblings: &[&Pad], layer: &str, max_error: f64) -> f64 {
    let Some(hole) = pad.hole_shape() else {
        return 0.0;
    };

    let primary = pad_layer_polygon(
        pad.shape_on(layer),
        pad.position,
        pad.orientation,
        max_error,
        ErrorLoc::Inside,
    );

    let outlines: Vec<Polygon<f64>> = siblings
        .iter()
        .map(|s| {
            pad_layer_polygon(
                s.shape_on(layer),
                s.position,
                s.orientation,
                max_error,
                ErrorLoc::Outside,
            )
        })
        .collect();

    let holes: Vec<Polygon<f64>> = siblings
        .iter()
        .filter_map(|s| s.hole_shape())
        .map(|h| h.to_polygon(max_error, ErrorLoc::Inside))
        .collect();

    let merged = aggregate_outline(&primary, &outlines, &holes);
    polygon_annular_width(&merged, &hole, to_coord(pad.position))
}

/// Width of one pad on one layer. The merged outline of same-numbered pads
/// is only built when the pad cannot pass on its own.
fn pad_width_on(
    pad: &Pad,
    footprint: &Footprint,
    layer: &str,
    min_bound: Option<f64>,
    max_error: f64,
) -> f64 {
    let Some(drill) = pad.drill.as_ref() else {
        return 0.0;
    };
    let siblings = footprint.pads_with_number(&pad.number, pad);

    match analytic_annular_width(pad.shape_on(layer), drill) {
        Some(width) if siblings.is_empty() => width,
        Some(width) => match min_bound {
            Some(min) if width < min => {
                debug!(pad = %pad.uuid, layer, "Re-measuring against sibling pads");
                aggregate_pad_width(pad, &siblings, layer, max_error)
            }
            _ => width,
        },
        None if siblings.is_empty() || min_bound.is_none() => {
            single_pad_width(pad, layer, max_error)
        }
        None => aggregate_pad_width(pad, &siblings, layer, max_error),
    }
}

fn check_item(ctx: &mut DrcContext<'_>, item: &BoardItem<'_>) {
    let board = ctx.board();
    let constraint = ctx
        .resolver()
        .evaluate(ConstraintKind::AnnularWidth, item, None, None);

    if constraint.is_ignored() || constraint.value.is_empty() {
        return;
    }

    let widths = match *item {
        BoardItem::Via(via) => via_widths(board, via),
        BoardItem::Pad { pad, footprint } => {
            let mut widths = Extremes::new();
            for layer in board.pad_layers(pad) {
                widths.add(pad_width_on(
                    pad,
                    footprint,
                    layer,
                    constraint.value.min,
                    ctx.max_error(),
                ));
            }
            widths
        }
        BoardItem::Track(_) => return,
    };

    if widths.is_empty() {
        return;
    }

    let layers = board.item_layers(item);
    check_bounds(
        ctx,
        ErrorCode::AnnularWidth,
        &constraint,
        "annular width",
        Measurement {
            item,
            min: widths.min,
            max: widths.max,
            position: item.position(),
            layer: layers.first().copied(),
        },
    );
}

impl DrcTestProvider for AnnularWidthProvider {
    fn name(&self) -> &str {
        "annular_width"
    }

    fn description(&self) -> &str {
        "Checking pad & via annular rings..."
    }

    fn error_codes(&self) -> &[ErrorCode] {
        CODES
    }

    fn run(&self, ctx: &mut DrcContext<'_>) -> bool {
        if !should_run(
            ctx,
            ErrorCode::AnnularWidth,
            ConstraintKind::AnnularWidth,
            "Annular width",
        ) {
            return true;
        }

        let board = ctx.board();
        let items: Vec<(BoardItem<'_>, usize)> = board
            .vias
            .iter()
            .map(BoardItem::Via)
            .chain(board.pads())
            .map(|item| (item, Self::effort(board, &item)))
            .filter(|(_, effort)| *effort > 0)
            .collect();

        let total: usize = items.iter().map(|(_, effort)| effort).sum();
        let mut done = 0;

        for (item, effort) in &items {
            if ctx.is_error_limit_exceeded(ErrorCode::AnnularWidth) {
                break;
            }

            done += effort;
            if !ctx.report_progress(done, total) {
                return false;
            }

            check_item(ctx, item);
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{PadLayerShape, PadType, Position};
    use crate::core::DrcOptions;
    use crate::drc::providers::test_support::*;
    use crate::rules::{MinOptMax, RuleSet};

    fn annular_rule(min: f64) -> RuleSet {
        single_rule(ConstraintKind::AnnularWidth, MinOptMax::min(min))
    }

    #[test]
    fn test_via_below_minimum() {
        let board = Board {
            vias: vec![via("v1", 0.0, 0.6, 0.3, 1)],
            ..Board::default()
        };
        let (completed, reporter) =
            run_provider(&AnnularWidthProvider, &board, &annular_rule(0.2), &DrcOptions::default());

        assert!(completed);
        assert_eq!(reporter.violations.len(), 1);
        let v = &reporter.violations[0];
        assert_eq!(v.code, ErrorCode::AnnularWidth);
        assert!((v.measured.unwrap() - 0.15).abs() < 1e-9);
        assert_eq!(v.bound, Some(0.2));
        assert_eq!(v.items, vec!["v1"]);
        assert_eq!(v.layer.as_deref(), Some("F.Cu"));
        assert_eq!(
            v.message,
            "Annular width (rule 'test' min annular width 0.2000 mm; actual 0.1500 mm)"
        );
    }

    #[test]
    fn test_no_rules_skips() {
        let board = Board {
            vias: vec![via("v1", 0.0, 0.6, 0.3, 1)],
            ..Board::default()
        };
        let (completed, reporter) =
            run_provider(&AnnularWidthProvider, &board, &RuleSet::default(), &DrcOptions::default());

        assert!(completed);
        assert!(reporter.violations.is_empty());
        assert_eq!(
            reporter.messages,
            vec!["No annular width constraints found. Tests not run."]
        );
    }

    #[test]
    fn test_min_and_max_both_reported() {
        let mut v = via("v1", 0.0, 0.6, 0.3, 1);
        // 0.15 on F.Cu, 0.45 on B.Cu
        v.layer_sizes.insert("B.Cu".to_string(), 1.2);
        let board = Board {
            vias: vec![v],
            ..Board::default()
        };
        let rules = single_rule(ConstraintKind::AnnularWidth, MinOptMax::range(0.2, 0.4));
        let (_, reporter) = run_provider(&AnnularWidthProvider, &board, &rules, &DrcOptions::default());

        assert_eq!(reporter.violations.len(), 2);
        assert!(reporter.violations[0].message.contains("min annular width"));
        assert!(reporter.violations[1].message.contains("max annular width"));
        assert!((reporter.violations[1].measured.unwrap() - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_pth_pad_passes_and_smd_skipped() {
        let mut smd = pth_pad("smd", "2", PadLayerShape::rect(0.3, 0.3), 0.0);
        smd.pad_type = PadType::SMD;
        smd.drill = None;
        let board = Board {
            footprints: vec![footprint(vec![
                pth_pad("p1", "1", PadLayerShape::circle(1.6), 0.8),
                smd,
            ])],
            ..Board::default()
        };
        let (_, reporter) =
            run_provider(&AnnularWidthProvider, &board, &annular_rule(0.2), &DrcOptions::default());
        assert!(reporter.violations.is_empty());
    }

    #[test]
    fn test_offset_pad_uses_polygon() {
        let shape = PadLayerShape::circle(2.0).with_offset(Position::new(0.5, 0.0));
        let board = Board {
            footprints: vec![footprint(vec![pth_pad("p1", "1", shape, 0.8)])],
            ..Board::default()
        };
        let (_, reporter) =
            run_provider(&AnnularWidthProvider, &board, &annular_rule(0.2), &DrcOptions::default());

        // Thin side: 1.0 - 0.5 - 0.4
        assert_eq!(reporter.violations.len(), 1);
        assert!((reporter.violations[0].measured.unwrap() - 0.1).abs() < 0.01);
    }

    #[test]
    fn test_sibling_pad_rescues_thin_ring() {
        let mut cover = pth_pad("cover", "1", PadLayerShape::rect(2.0, 2.0), 0.0);
        cover.pad_type = PadType::SMD;
        cover.drill = None;
        cover.layers = vec!["F.Cu".to_string(), "B.Cu".to_string()];

        let thin = pth_pad("thin", "1", PadLayerShape::circle(1.0), 0.8);
        let board = Board {
            footprints: vec![footprint(vec![thin.clone(), cover.clone()])],
            ..Board::default()
        };
        let (_, reporter) =
            run_provider(&AnnularWidthProvider, &board, &annular_rule(0.2), &DrcOptions::default());
        assert!(reporter.violations.is_empty());

        cover.number = "2".to_string();
        let board = Board {
            footprints: vec![footprint(vec![thin, cover])],
            ..Board::default()
        };
        let (_, reporter) =
            run_provider(&AnnularWidthProvider, &board, &annular_rule(0.2), &DrcOptions::default());
        assert_eq!(reporter.violations.len(), 1);
        assert!((reporter.violations[0].measured.unwrap() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_effort() {
        let board = Board::default();
        let v = via("v", 0.0, 0.6, 0.3, 0);
        assert_eq!(AnnularWidthProvider::effort(&board, &BoardItem::Via(&v)), 1);

        let fp = footprint(vec![pth_pad("p", "1", PadLayerShape::circle(1.6), 0.8)]);
        let item = BoardItem::Pad {
            pad: &fp.pads[0],
            footprint: &fp,
        };
        // Two layers, analytic on both
        assert_eq!(AnnularWidthProvider::effort(&board, &item), 12);
    }

    #[test]
    fn test_cancellation() {
        let board = Board {
            vias: (0..4).map(|i| via(&format!("v{}", i), i as f64, 0.6, 0.3, 1)).collect(),
            ..Board::default()
        };
        let rules = annular_rule(0.2);
        let resolver = crate::rules::RuleResolver::new(&rules, &board);
        let options = DrcOptions {
            progress_delta: 1,
            ..DrcOptions::default()
        };
        let mut calls = 0;
        let mut reporter = crate::drc::reporter::CollectingReporter::with_progress(move |_, _| {
            calls += 1;
            calls < 2
        });

        let completed = {
            let mut ctx = DrcContext::new(&board, &resolver, &options, &mut reporter);
            AnnularWidthProvider.run(&mut ctx)
        };

        assert!(!completed);
        assert_eq!(reporter.violations.len(), 1);
    }

    #[test]
    fn test_final_progress_reaches_total() {
        let board = Board {
            vias: vec![via("v1", 0.0, 0.6, 0.3, 1), via("v2", 2.0, 0.6, 0.3, 1)],
            ..Board::default()
        };
        let rules = annular_rule(0.2);
        let resolver = crate::rules::RuleResolver::new(&rules, &board);
        let options = DrcOptions::default();
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut reporter = crate::drc::reporter::CollectingReporter::with_progress(move |done, total| {
            sink.lock().unwrap().push((done, total));
            true
        });

        let completed = {
            let mut ctx = DrcContext::new(&board, &resolver, &options, &mut reporter);
            AnnularWidthProvider.run(&mut ctx)
        };

        assert!(completed);
        let seen = seen.lock().unwrap();
        let &(done, total) = seen.last().unwrap();
        assert_eq!(done, total);
        assert!(seen.iter().all(|&(d, _)| d > 0));
    }

    #[test]
    fn test_error_limit_stops_early() {
        let board = Board {
            vias: (0..4).map(|i| via(&format!("v{}", i), i as f64, 0.6, 0.3, 1)).collect(),
            ..Board::default()
        };
        let options = DrcOptions {
            error_limit: Some(2),
            ..DrcOptions::default()
        };
        let (completed, reporter) =
            run_provider(&AnnularWidthProvider, &board, &annular_rule(0.2), &options);
        assert!(completed);
        assert_eq!(reporter.violations.len(), 2);
    }
}
