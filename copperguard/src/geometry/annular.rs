//! Annular ring width
//!
//! Three ways of measuring the copper left around a hole:
//!
//! 1. [`analytic_annular_width`]: closed form for centred simple shapes.
//!    Cheap, and only an approximation of the true minimum for non-round
//!    shapes.
//! 2. [`polygon_annular_width`]: distance from the outline edges to the hole
//!    segment, minus the hole radius. Works for any shape and offset.
//! 3. [`aggregate_outline`]: merges the outlines of same-numbered pads so
//!    copper borrowed from a neighbouring pad counts towards the ring.

use geo::{BooleanOps, Contains, Coord, MultiPolygon, Polygon};

use super::distance::boundary_distance_sq_to_seg;
use super::HoleShape;
use crate::board::{Drill, PadLayerShape, PadShape};

/// Closed-form width, or `None` when the shape is offset or not one of the
/// simple kinds
pub fn analytic_annular_width(shape: &PadLayerShape, drill: &Drill) -> Option<f64> {
    if !shape.supports_analytic_width() {
        return None;
    }

    let size = shape.size;
    let hole = drill.size;

    match shape.shape {
        PadShape::Circle => Some((size.width - hole.width) / 2.0),
        _ => Some((size.width - hole.width).min(size.height - hole.height) / 2.0),
    }
}

/// Width between the hole and the nearest outline edge. A hole whose centre
/// lies outside the outline has escaped the pad and measures 0.
pub fn polygon_annular_width(
    outline: &MultiPolygon<f64>,
    hole: &HoleShape,
    reference: Coord<f64>,
) -> f64 {
    if !outline.0.iter().any(|p| p.contains(&reference)) {
        return 0.0;
    }

    let (dist_sq, _) = boundary_distance_sq_to_seg(outline, &hole.seg);
    (dist_sq.sqrt() - hole.width / 2.0).max(0.0)
}

fn is_usable(polygon: &Polygon<f64>) -> bool {
    polygon.exterior().0.len() >= 4
}

/// Union of the primary outline with its siblings, minus the siblings'
/// holes. The primary pad's own hole is left in place so it can be measured.
pub fn aggregate_outline(
    primary: &Polygon<f64>,
    siblings: &[Polygon<f64>],
    sibling_holes: &[Polygon<f64>],
) -> MultiPolygon<f64> {
    let mut merged = MultiPolygon::new(vec![primary.clone()]);

    for sibling in siblings.iter().filter(|p| is_usable(p)) {
        merged = merged.union(&MultiPolygon::new(vec![sibling.clone()]));
    }

    for hole in sibling_holes.iter().filter(|p| is_usable(p)) {
        merged = merged.difference(&MultiPolygon::new(vec![hole.clone()]));
    }

    merged
}
