//! Shape to polygon conversion
//!
//! Pads, holes and tracks are turned into `geo` polygons. Arcs are split
//! into enough segments that the chord error stays within `max_error`;
//! [`ErrorLoc`] decides on which side of the true outline that error lies.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use geo::{Coord, LineString, Polygon};

use super::distance::{polygon_distance, seg_polygon_distance, segment_distance_sq};
use super::{to_coord, ErrorLoc, Seg};
use crate::board::{PadLayerShape, PadShape, Position};

/// Fewest segments used for a full circle
const MIN_SEGMENTS_PER_CIRCLE: usize = 8;

/// Most segments used for a full circle, whatever the requested error
pub const MAX_SEGMENTS_PER_CIRCLE: usize = 4096;

fn segments_for_arc(per_circle: usize, arc_angle: f64) -> usize {
    ((per_circle as f64) * arc_angle.abs().min(TAU) / TAU).ceil() as usize
}

/// Number of segments needed to approximate an arc of `arc_angle` radians,
/// clamped between the per-circle minimum and maximum
pub fn arc_segment_count(radius: f64, arc_angle: f64, max_error: f64) -> usize {
    let minimum = segments_for_arc(MIN_SEGMENTS_PER_CIRCLE, arc_angle).max(1);
    let maximum = segments_for_arc(MAX_SEGMENTS_PER_CIRCLE, arc_angle).max(minimum);

    if radius <= 0.0 || max_error <= 0.0 {
        return minimum;
    }

    let error = max_error.min(radius);
    let step = 2.0 * (1.0 - error / radius).acos();
    if !step.is_finite() || step <= 0.0 {
        return maximum;
    }

    let count = (arc_angle.abs() / step).ceil();
    if count >= maximum as f64 {
        return maximum;
    }

    (count as usize).clamp(minimum, maximum)
}

/// Append the vertices of an arc, both end points included
fn push_arc(
    points: &mut Vec<Coord<f64>>,
    centre: Coord<f64>,
    radius: f64,
    start_angle: f64,
    arc_angle: f64,
    max_error: f64,
    loc: ErrorLoc,
) {
    if radius <= 0.0 {
        points.push(centre);
        return;
    }

    let count = arc_segment_count(radius, arc_angle, max_error);
    let step = arc_angle / count as f64;
    let r = match loc {
        ErrorLoc::Inside => radius,
        ErrorLoc::Outside => radius / (step / 2.0).cos(),
    };

    for i in 0..=count {
        let angle = start_angle + step * i as f64;
        points.push(Coord {
            x: centre.x + r * angle.cos(),
            y: centre.y + r * angle.sin(),
        });
    }
}

/// Drop repeated vertices so boolean operations see a clean ring
fn dedup_ring(points: Vec<Coord<f64>>) -> Vec<Coord<f64>> {
    const TOLERANCE: f64 = 1e-9;
    let same = |a: &Coord<f64>, b: &Coord<f64>| {
        (a.x - b.x).abs() < TOLERANCE && (a.y - b.y).abs() < TOLERANCE
    };

    let mut ring: Vec<Coord<f64>> = Vec::with_capacity(points.len());
    for p in points {
        if ring.last().map_or(true, |last| !same(last, &p)) {
            ring.push(p);
        }
    }
    while ring.len() > 1 && same(&ring[0], &ring[ring.len() - 1]) {
        ring.pop();
    }
    ring
}

fn make_polygon(points: Vec<Coord<f64>>) -> Polygon<f64> {
    let ring = dedup_ring(points);
    if ring.len() < 3 {
        return Polygon::new(LineString::new(Vec::new()), Vec::new());
    }
    Polygon::new(LineString::from(ring), Vec::new())
}

pub fn circle_polygon(centre: Coord<f64>, radius: f64, max_error: f64, loc: ErrorLoc) -> Polygon<f64> {
    let mut points = Vec::new();
    push_arc(&mut points, centre, radius, 0.0, TAU, max_error, loc);
    make_polygon(points)
}

/// Segment swept by a circle of `width` diameter (tracks, slots, holes)
pub fn capsule_polygon(seg: &Seg, width: f64, max_error: f64, loc: ErrorLoc) -> Polygon<f64> {
    let radius = width / 2.0;
    if radius <= 0.0 {
        return make_polygon(Vec::new());
    }

    let dx = seg.b.x - seg.a.x;
    let dy = seg.b.y - seg.a.y;
    let theta = if dx == 0.0 && dy == 0.0 { 0.0 } else { dy.atan2(dx) };

    let mut points = Vec::new();
    push_arc(&mut points, seg.b, radius, theta - FRAC_PI_2, PI, max_error, loc);
    push_arc(&mut points, seg.a, radius, theta + FRAC_PI_2, PI, max_error, loc);
    make_polygon(points)
}

/// Rectangle centred on the origin with optionally rounded corners
fn rounded_rect_points(
    half_w: f64,
    half_h: f64,
    radius: f64,
    max_error: f64,
    loc: ErrorLoc,
) -> Vec<Coord<f64>> {
    let r = radius.clamp(0.0, half_w.min(half_h));

    if r <= 0.0 {
        return vec![
            Coord { x: half_w, y: -half_h },
            Coord { x: half_w, y: half_h },
            Coord { x: -half_w, y: half_h },
            Coord { x: -half_w, y: -half_h },
        ];
    }

    let corners = [
        (half_w - r, half_h - r, 0.0),
        (-half_w + r, half_h - r, FRAC_PI_2),
        (-half_w + r, -half_h + r, PI),
        (half_w - r, -half_h + r, 3.0 * FRAC_PI_2),
    ];

    let mut points = Vec::new();
    for (x, y, start) in corners {
        push_arc(&mut points, Coord { x, y }, r, start, FRAC_PI_2, max_error, loc);
    }
    points
}

fn chamfered_rect_points(shape: &PadLayerShape) -> Vec<Coord<f64>> {
    let hw = shape.size.width / 2.0;
    let hh = shape.size.height / 2.0;
    let c = shape.chamfer_size();
    let corners = shape.chamfer_corners;

    let mut points = Vec::new();
    let mut corner = |cut: bool, sharp: (f64, f64), first: (f64, f64), second: (f64, f64)| {
        if cut && c > 0.0 {
            points.push(Coord { x: first.0, y: first.1 });
            points.push(Coord { x: second.0, y: second.1 });
        } else {
            points.push(Coord { x: sharp.0, y: sharp.1 });
        }
    };

    corner(corners.bottom_right, (hw, -hh), (hw - c, -hh), (hw, -hh + c));
    corner(corners.top_right, (hw, hh), (hw, hh - c), (hw - c, hh));
    corner(corners.top_left, (-hw, hh), (-hw + c, hh), (-hw, hh - c));
    corner(corners.bottom_left, (-hw, -hh), (-hw, -hh + c), (-hw + c, -hh));

    points
}

fn trapezoid_points(shape: &PadLayerShape) -> Vec<Coord<f64>> {
    let dx = shape.size.width / 2.0;
    let dy = shape.size.height / 2.0;
    let ddx = shape.trapezoid_delta.width / 2.0;
    let ddy = shape.trapezoid_delta.height / 2.0;

    vec![
        Coord { x: -dx + ddy, y: -dy - ddx },
        Coord { x: dx - ddy, y: -dy + ddx },
        Coord { x: dx + ddy, y: dy - ddx },
        Coord { x: -dx - ddy, y: dy + ddx },
    ]
}

/// Outline of a pad shape centred on the origin, before offset and rotation
fn local_pad_points(shape: &PadLayerShape, max_error: f64, loc: ErrorLoc) -> Vec<Coord<f64>> {
    let hw = shape.size.width / 2.0;
    let hh = shape.size.height / 2.0;
    let origin = Coord { x: 0.0, y: 0.0 };

    match shape.shape {
        PadShape::Circle => {
            let mut points = Vec::new();
            push_arc(&mut points, origin, hw, 0.0, TAU, max_error, loc);
            points
        }
        PadShape::Oval => rounded_rect_points(hw, hh, hw.min(hh), max_error, loc),
        PadShape::Rect => rounded_rect_points(hw, hh, 0.0, max_error, loc),
        PadShape::RoundRect => rounded_rect_points(hw, hh, shape.corner_radius(), max_error, loc),
        PadShape::ChamferedRect => chamfered_rect_points(shape),
        PadShape::Trapezoid => trapezoid_points(shape),
        PadShape::Custom if shape.custom_outline.len() >= 3 => {
            shape.custom_outline.iter().map(|p| to_coord(*p)).collect()
        }
        PadShape::Custom => rounded_rect_points(hw, hh, 0.0, max_error, loc),
    }
}

/// Pad outline on one layer in board coordinates. The shape offset is
/// rotated together with the pad.
pub fn pad_layer_polygon(
    shape: &PadLayerShape,
    position: Position,
    orientation: f64,
    max_error: f64,
    loc: ErrorLoc,
) -> Polygon<f64> {
    let points = local_pad_points(shape, max_error, loc)
        .into_iter()
        .map(|c| {
            let local = Position::new(c.x + shape.offset.x, c.y + shape.offset.y);
            to_coord(local.rotated(orientation).translated(position))
        })
        .collect();

    make_polygon(points)
}

/// Copper footprint of an item on one layer, kept exact where possible
#[derive(Debug, Clone)]
pub enum CopperShape {
    /// Tracks, vias, round and oval pads
    Capsule { seg: Seg, width: f64 },
    Poly(Polygon<f64>),
}

impl CopperShape {
    /// Axis-aligned bounds as `[min_x, min_y, max_x, max_y]`
    pub fn bounds(&self) -> [f64; 4] {
        match self {
            CopperShape::Capsule { seg, width } => {
                let r = width / 2.0;
                [
                    seg.a.x.min(seg.b.x) - r,
                    seg.a.y.min(seg.b.y) - r,
                    seg.a.x.max(seg.b.x) + r,
                    seg.a.y.max(seg.b.y) + r,
                ]
            }
            CopperShape::Poly(polygon) => {
                let mut bounds = [f64::MAX, f64::MAX, f64::MIN, f64::MIN];
                for c in polygon.exterior().coords() {
                    bounds[0] = bounds[0].min(c.x);
                    bounds[1] = bounds[1].min(c.y);
                    bounds[2] = bounds[2].max(c.x);
                    bounds[3] = bounds[3].max(c.y);
                }
                bounds
            }
        }
    }

    /// Edge-to-edge distance and the closest-approach point; zero when the
    /// shapes overlap
    pub fn distance(&self, other: &CopperShape) -> (f64, Coord<f64>) {
        match (self, other) {
            (
                CopperShape::Capsule { seg: s, width: ws },
                CopperShape::Capsule { seg: t, width: wt },
            ) => {
                let (d, p) = segment_distance_sq(s, t);
                ((d.sqrt() - ws / 2.0 - wt / 2.0).max(0.0), p)
            }
            (CopperShape::Capsule { seg, width }, CopperShape::Poly(polygon))
            | (CopperShape::Poly(polygon), CopperShape::Capsule { seg, width }) => {
                let (d, p) = seg_polygon_distance(seg, polygon);
                ((d - width / 2.0).max(0.0), p)
            }
            (CopperShape::Poly(a), CopperShape::Poly(b)) => polygon_distance(a, b),
        }
    }
}
