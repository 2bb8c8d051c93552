//! Distance calculations
//!
//! Point, segment and polygon-boundary queries. Distances come back squared
//! together with the closest-approach point, which is what reports need.

use geo::{Contains, Coord, LineString, MultiPolygon, Polygon};

use super::Seg;

const EPSILON: f64 = 1e-12;

fn cross(o: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn dist_sq(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

fn midpoint(a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

/// Squared distance from `p` to segment `a`-`b`, with the closest point on
/// the segment
pub fn point_segment_distance_sq(
    p: Coord<f64>,
    a: Coord<f64>,
    b: Coord<f64>,
) -> (f64, Coord<f64>) {
    let ab = b - a;
    let ab_len2 = ab.x * ab.x + ab.y * ab.y;

    if ab_len2 < EPSILON {
        // Degenerate segment
        return (dist_sq(p, a), a);
    }

    let ap = p - a;
    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_len2).clamp(0.0, 1.0);
    let closest = Coord {
        x: a.x + t * ab.x,
        y: a.y + t * ab.y,
    };

    (dist_sq(p, closest), closest)
}

fn within_box(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> bool {
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

/// Intersection point of two segments, if they touch
fn segment_intersection(s: &Seg, t: &Seg) -> Option<Coord<f64>> {
    let d1 = cross(t.a, t.b, s.a);
    let d2 = cross(t.a, t.b, s.b);
    let d3 = cross(s.a, s.b, t.a);
    let d4 = cross(s.a, s.b, t.b);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        let t_param = d1 / (d1 - d2);
        return Some(Coord {
            x: s.a.x + t_param * (s.b.x - s.a.x),
            y: s.a.y + t_param * (s.b.y - s.a.y),
        });
    }

    // Collinear or touching cases
    if d1.abs() < EPSILON && within_box(s.a, t.a, t.b) {
        return Some(s.a);
    }
    if d2.abs() < EPSILON && within_box(s.b, t.a, t.b) {
        return Some(s.b);
    }
    if d3.abs() < EPSILON && within_box(t.a, s.a, s.b) {
        return Some(t.a);
    }
    if d4.abs() < EPSILON && within_box(t.b, s.a, s.b) {
        return Some(t.b);
    }

    None
}

/// Squared segment-to-segment distance; zero when they intersect
pub fn segment_distance_sq(s: &Seg, t: &Seg) -> (f64, Coord<f64>) {
    if let Some(p) = segment_intersection(s, t) {
        return (0.0, p);
    }

    let mut best = (f64::MAX, s.a);

    for (p, a, b) in [
        (s.a, t.a, t.b),
        (s.b, t.a, t.b),
        (t.a, s.a, s.b),
        (t.b, s.a, s.b),
    ] {
        let (d, closest) = point_segment_distance_sq(p, a, b);
        if d < best.0 {
            best = (d, midpoint(p, closest));
        }
    }

    best
}

/// Squared distance from a ring's edges to a segment. The ring is treated
/// as an open outline: only its edges count, never its interior.
pub fn ring_distance_sq_to_seg(ring: &LineString<f64>, seg: &Seg) -> (f64, Coord<f64>) {
    let mut best = (f64::MAX, seg.a);

    for line in ring.lines() {
        let (d, p) = segment_distance_sq(&Seg::new(line.start, line.end), seg);
        if d < best.0 {
            best = (d, p);
        }
    }

    best
}

/// Squared distance from every outline and hole edge of a polygon set to a
/// segment
pub fn boundary_distance_sq_to_seg(shape: &MultiPolygon<f64>, seg: &Seg) -> (f64, Coord<f64>) {
    let mut best = (f64::MAX, seg.a);

    for polygon in &shape.0 {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            let d = ring_distance_sq_to_seg(ring, seg);
            if d.0 < best.0 {
                best = d;
            }
        }
    }

    best
}

/// Distance (not squared) from a segment to a filled polygon: zero when the
/// segment touches or lies inside it
pub fn seg_polygon_distance(seg: &Seg, polygon: &Polygon<f64>) -> (f64, Coord<f64>) {
    if polygon.contains(&seg.a) {
        return (0.0, seg.a);
    }

    let mut best = ring_distance_sq_to_seg(polygon.exterior(), seg);
    for hole in polygon.interiors() {
        let d = ring_distance_sq_to_seg(hole, seg);
        if d.0 < best.0 {
            best = d;
        }
    }

    (best.0.sqrt(), best.1)
}

/// Distance between two filled polygons: zero when they overlap
pub fn polygon_distance(a: &Polygon<f64>, b: &Polygon<f64>) -> (f64, Coord<f64>) {
    if let Some(p) = a.exterior().0.first() {
        if b.contains(p) {
            return (0.0, *p);
        }
    }
    if let Some(p) = b.exterior().0.first() {
        if a.contains(p) {
            return (0.0, *p);
        }
    }

    let mut best = (f64::MAX, Coord { x: 0.0, y: 0.0 });
    for line in a.exterior().lines() {
        let (d, p) = ring_distance_sq_to_seg(b.exterior(), &Seg::new(line.start, line.end));
        if d < best.0 {
            best = (d, p);
        }
    }

    (best.0.sqrt(), best.1)
}
