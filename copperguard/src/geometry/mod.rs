//! Geometry Kernel
//!
//! Segment and polygon primitives used by the DRC providers:
//!
//! - [`distance`]: point, segment and polygon-boundary distance queries
//! - [`shapes`]: conversion of pads, holes and tracks into polygons
//! - [`annular`]: annular ring width by formula, by polygon and by
//!   aggregating same-numbered pads
//!
//! Polygons are `geo` types in millimetres. Boolean operations come from
//! `geo::BooleanOps`; everything here borrows its inputs and returns fresh
//! values.

pub mod annular;
pub mod distance;
pub mod shapes;

pub use annular::{aggregate_outline, analytic_annular_width, polygon_annular_width};
pub use distance::{
    boundary_distance_sq_to_seg, point_segment_distance_sq, polygon_distance,
    seg_polygon_distance, segment_distance_sq,
};
pub use shapes::{capsule_polygon, circle_polygon, pad_layer_polygon, CopperShape};

use geo::{Coord, Polygon};

use crate::board::Position;

/// Default maximum deviation between a true arc and its polygon (mm)
pub const DEFAULT_MAX_ERROR: f64 = 0.005;

/// Smallest accepted approximation error (mm)
pub const MIN_MAX_ERROR: f64 = 1e-6;

/// Where the approximation error of an arc is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLoc {
    /// Polygon lies inside the true shape (vertices on the arc)
    Inside,
    /// Polygon contains the true shape (edges tangent to the arc)
    Outside,
}

pub fn to_coord(p: Position) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

pub fn to_position(c: Coord<f64>) -> Position {
    Position::new(c.x, c.y)
}

/// Line segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seg {
    pub a: Coord<f64>,
    pub b: Coord<f64>,
}

impl Seg {
    pub fn new(a: Coord<f64>, b: Coord<f64>) -> Self {
        Self { a, b }
    }

    pub fn from_positions(a: Position, b: Position) -> Self {
        Self::new(to_coord(a), to_coord(b))
    }

    pub fn length(&self) -> f64 {
        let dx = self.b.x - self.a.x;
        let dy = self.b.y - self.a.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn center(&self) -> Coord<f64> {
        Coord {
            x: (self.a.x + self.b.x) / 2.0,
            y: (self.a.y + self.b.y) / 2.0,
        }
    }
}

/// A drilled hole: a segment swept by a circle of `width` diameter.
/// Round holes have a zero-length segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoleShape {
    pub seg: Seg,
    pub width: f64,
}

impl HoleShape {
    pub fn new(seg: Seg, width: f64) -> Self {
        Self { seg, width }
    }

    pub fn to_polygon(&self, max_error: f64, loc: ErrorLoc) -> Polygon<f64> {
        capsule_polygon(&self.seg, self.width, max_error, loc)
    }
}
