//! Copper-to-copper clearance
//!
//! Runs layer by layer. Every copper shape goes into an R-tree; candidate
//! neighbours are those whose envelope lies within the largest clearance any
//! rule asks for, and only those pairs are measured exactly.

use rstar::{RTree, RTreeObject, AABB};

use super::should_run;
use crate::board::{Board, BoardItem, Pad, PadShape, Position};
use crate::drc::item::{bound_detail, DrcViolation, ErrorCode};
use crate::drc::provider::{DrcContext, DrcTestProvider};
use crate::geometry::{pad_layer_polygon, to_position, CopperShape, ErrorLoc, Seg};
use crate::rules::ConstraintKind;

pub struct CopperClearanceProvider;

const CODES: &[ErrorCode] = &[ErrorCode::Clearance];

/// Copper of one item on one layer
struct CopperEntry<'a> {
    item: BoardItem<'a>,
    shape: CopperShape,
}

/// R-tree node pointing back into the entry list
struct IndexedEnvelope {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn envelope_of(shape: &CopperShape, margin: f64) -> AABB<[f64; 2]> {
    let b = shape.bounds();
    AABB::from_corners([b[0] - margin, b[1] - margin], [b[2] + margin, b[3] + margin])
}

/// Round and oval pads stay exact capsules; everything else is polygonised
fn pad_copper(pad: &Pad, layer: &str, max_error: f64) -> CopperShape {
    let shape = pad.shape_on(layer);
    let centre = pad.position.translated(shape.offset.rotated(pad.orientation));
    let (w, h) = (shape.size.width, shape.size.height);

    match shape.shape {
        PadShape::Circle => CopperShape::Capsule {
            seg: Seg::from_positions(centre, centre),
            width: w,
        },
        PadShape::Oval => {
            let half = if w >= h {
                Position::new((w - h) / 2.0, 0.0)
            } else {
                Position::new(0.0, (h - w) / 2.0)
            }
            .rotated(pad.orientation);
            let start = Position::new(centre.x - half.x, centre.y - half.y);
            CopperShape::Capsule {
                seg: Seg::from_positions(start, centre.translated(half)),
                width: w.min(h),
            }
        }
        _ => CopperShape::Poly(pad_layer_polygon(
            shape,
            pad.position,
            pad.orientation,
            max_error,
            ErrorLoc::Outside,
        )),
    }
}

fn layer_entries<'a>(board: &'a Board, layer: &str, max_error: f64) -> Vec<CopperEntry<'a>> {
    let tracks = board
        .traces
        .iter()
        .filter(|t| t.layer == layer)
        .map(|t| CopperEntry {
            item: BoardItem::Track(t),
            shape: CopperShape::Capsule {
                seg: Seg::from_positions(t.start, t.end),
                width: t.width,
            },
        });

    let vias = board
        .vias
        .iter()
        .filter(|v| board.via_layers(v).contains(&layer))
        .map(|v| CopperEntry {
            item: BoardItem::Via(v),
            shape: CopperShape::Capsule {
                seg: Seg::from_positions(v.position, v.position),
                width: v.width_on(layer),
            },
        });

    let pads = board.pads().filter_map(|item| match item {
        BoardItem::Pad { pad, .. } if board.pad_layers(pad).contains(&layer) => Some(CopperEntry {
            item,
            shape: pad_copper(pad, layer, max_error),
        }),
        _ => None,
    });

    tracks.chain(vias).chain(pads).collect()
}

/// Pairs that are electrically the same copper
fn is_connected(a: &BoardItem<'_>, b: &BoardItem<'_>) -> bool {
    if a.shares_net_with(b) {
        return true;
    }

    match (*a, *b) {
        (
            BoardItem::Pad {
                pad: pa,
                footprint: fa,
            },
            BoardItem::Pad {
                pad: pb,
                footprint: fb,
            },
        ) => std::ptr::eq(fa, fb) && !pa.number.is_empty() && pa.number == pb.number,
        _ => false,
    }
}

fn check_pair(ctx: &mut DrcContext<'_>, a: &CopperEntry<'_>, b: &CopperEntry<'_>, layer: &str) {
    if is_connected(&a.item, &b.item) {
        return;
    }

    let constraint = ctx
        .resolver()
        .evaluate(ConstraintKind::Clearance, &a.item, Some(&b.item), Some(layer));
    let Some(min) = constraint.value.min else {
        return;
    };
    if constraint.is_ignored() {
        return;
    }

    let (actual, at) = a.shape.distance(&b.shape);
    if actual >= min {
        return;
    }

    let violation = DrcViolation::builder(ErrorCode::Clearance)
        .detail(bound_detail(&constraint.name(), "clearance", min, actual))
        .severity(constraint.severity)
        .item(&a.item)
        .item(&b.item)
        .position(to_position(at))
        .layer(Some(layer))
        .rule(constraint.rule_name())
        .measured(actual, min)
        .build();
    ctx.report_violation(violation);
}

impl DrcTestProvider for CopperClearanceProvider {
    fn name(&self) -> &str {
        "clearance"
    }

    fn description(&self) -> &str {
        "Checking copper clearances..."
    }

    fn error_codes(&self) -> &[ErrorCode] {
        CODES
    }

    fn run(&self, ctx: &mut DrcContext<'_>) -> bool {
        if !should_run(ctx, ErrorCode::Clearance, ConstraintKind::Clearance, "Clearance") {
            return true;
        }

        let board = ctx.board();
        let margin = ctx
            .resolver()
            .max_value(ConstraintKind::Clearance)
            .unwrap_or(0.0);

        let layers: Vec<(&str, Vec<CopperEntry<'_>>)> = board
            .copper_layers
            .iter()
            .map(|layer| (layer.as_str(), layer_entries(board, layer, ctx.max_error())))
            .collect();
        let total: usize = layers.iter().map(|(_, entries)| entries.len()).sum();
        let mut done = 0;

        for (layer, entries) in &layers {
            let tree = RTree::bulk_load(
                entries
                    .iter()
                    .enumerate()
                    .map(|(index, entry)| IndexedEnvelope {
                        index,
                        envelope: envelope_of(&entry.shape, 0.0),
                    })
                    .collect(),
            );

            for (index, entry) in entries.iter().enumerate() {
                if ctx.is_error_limit_exceeded(ErrorCode::Clearance) {
                    return true;
                }

                done += 1;
                if !ctx.report_progress(done, total) {
                    return false;
                }

                let search = envelope_of(&entry.shape, margin);
                let mut neighbours: Vec<usize> = tree
                    .locate_in_envelope_intersecting(&search)
                    .map(|n| n.index)
                    .filter(|&other| other > index)
                    .collect();
                neighbours.sort_unstable();

                for other in neighbours {
                    check_pair(ctx, entry, &entries[other], layer);
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PadLayerShape;
    use crate::core::DrcOptions;
    use crate::drc::providers::test_support::*;
    use crate::rules::MinOptMax;

    fn clearance_rule(min: f64) -> crate::rules::RuleSet {
        single_rule(ConstraintKind::Clearance, MinOptMax::min(min))
    }

    #[test]
    fn test_close_tracks_on_different_nets() {
        let board = Board {
            traces: vec![trace("a", 0.0, 0.2, 1), trace("b", 0.3, 0.2, 2)],
            ..Board::default()
        };
        let (completed, reporter) =
            run_provider(&CopperClearanceProvider, &board, &clearance_rule(0.2), &DrcOptions::default());

        assert!(completed);
        assert_eq!(reporter.violations.len(), 1);
        let v = &reporter.violations[0];
        assert_eq!(v.items, vec!["a", "b"]);
        assert!((v.measured.unwrap() - 0.1).abs() < 1e-9);
        assert_eq!(
            v.message,
            "Clearance violation (rule 'test' clearance 0.2000 mm; actual 0.1000 mm)"
        );
    }

    #[test]
    fn test_same_net_never_reported() {
        let board = Board {
            traces: vec![trace("a", 0.0, 0.2, 1), trace("b", 0.1, 0.2, 1)],
            ..Board::default()
        };
        let (_, reporter) =
            run_provider(&CopperClearanceProvider, &board, &clearance_rule(0.2), &DrcOptions::default());
        assert!(reporter.violations.is_empty());
    }

    #[test]
    fn test_far_apart_tracks_pass() {
        let board = Board {
            traces: vec![trace("a", 0.0, 0.2, 1), trace("b", 5.0, 0.2, 2)],
            ..Board::default()
        };
        let (_, reporter) =
            run_provider(&CopperClearanceProvider, &board, &clearance_rule(0.2), &DrcOptions::default());
        assert!(reporter.violations.is_empty());
    }

    #[test]
    fn test_via_against_rect_pad() {
        let mut pad = pth_pad("pad", "1", PadLayerShape::rect(1.0, 1.0), 0.5);
        pad.net = Some(3);
        let board = Board {
            vias: vec![via("v", 1.0, 0.6, 0.3, 4)],
            footprints: vec![footprint(vec![pad])],
            ..Board::default()
        };
        let (_, reporter) =
            run_provider(&CopperClearanceProvider, &board, &clearance_rule(0.25), &DrcOptions::default());

        // Pad edge at x = 0.5, via edge at x = 0.7: one report per layer
        assert_eq!(reporter.violations.len(), 2);
        for v in &reporter.violations {
            assert!((v.measured.unwrap() - 0.2).abs() < 1e-6);
        }
        assert_eq!(reporter.violations[0].layer.as_deref(), Some("F.Cu"));
        assert_eq!(reporter.violations[1].layer.as_deref(), Some("B.Cu"));
    }

    #[test]
    fn test_same_number_pads_are_connected() {
        let a = pth_pad("a", "1", PadLayerShape::circle(1.0), 0.5);
        let mut b = pth_pad("b", "1", PadLayerShape::circle(1.0), 0.5);
        b.position = Position::new(0.8, 0.0);
        let board = Board {
            footprints: vec![footprint(vec![a, b])],
            ..Board::default()
        };
        let (_, reporter) =
            run_provider(&CopperClearanceProvider, &board, &clearance_rule(0.2), &DrcOptions::default());
        assert!(reporter.violations.is_empty());
    }
}
