//! Padstack definitions
//!
//! Per-layer pad shapes and drill descriptions. A padstack carries one
//! default shape and optional overrides for individual copper layers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Position, Size2D};

/// Chamfer ratio above which a chamfered rectangle no longer counts as a
/// plain rectangle for the analytic annular width.
pub const CHAMFER_RATIO_CUTOFF: f64 = 0.30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PadShape {
    Circle,
    Oval,
    Rect,
    RoundRect,
    ChamferedRect,
    Trapezoid,
    Custom,
}

/// Which corners of a chamfered rectangle are cut
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChamferCorners {
    pub top_left: bool,
    pub top_right: bool,
    pub bottom_left: bool,
    pub bottom_right: bool,
}

impl Default for ChamferCorners {
    fn default() -> Self {
        Self {
            top_left: true,
            top_right: true,
            bottom_left: true,
            bottom_right: true,
        }
    }
}

/// Shape of a pad on one copper layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PadLayerShape {
    pub shape: PadShape,
    pub size: Size2D,
    /// Offset of the shape relative to the hole, in pad coordinates
    #[serde(default)]
    pub offset: Position,
    /// Corner radius as a fraction of the smaller side (RoundRect)
    #[serde(default = "default_round_rect_ratio")]
    pub round_rect_ratio: f64,
    /// Chamfer size as a fraction of the smaller side (ChamferedRect)
    #[serde(default)]
    pub chamfer_ratio: f64,
    #[serde(default)]
    pub chamfer_corners: ChamferCorners,
    /// Trapezoid deformation (Trapezoid)
    #[serde(default)]
    pub trapezoid_delta: Size2D,
    /// Outline relative to the pad centre (Custom)
    #[serde(default)]
    pub custom_outline: Vec<Position>,
}

fn default_round_rect_ratio() -> f64 {
    0.25
}

impl PadLayerShape {
    pub fn new(shape: PadShape, size: Size2D) -> Self {
        Self {
            shape,
            size,
            offset: Position::default(),
            round_rect_ratio: default_round_rect_ratio(),
            chamfer_ratio: 0.0,
            chamfer_corners: ChamferCorners::default(),
            trapezoid_delta: Size2D::default(),
            custom_outline: Vec::new(),
        }
    }

    pub fn circle(diameter: f64) -> Self {
        Self::new(PadShape::Circle, Size2D::square(diameter))
    }

    pub fn rect(width: f64, height: f64) -> Self {
        Self::new(PadShape::Rect, Size2D::new(width, height))
    }

    pub fn oval(width: f64, height: f64) -> Self {
        Self::new(PadShape::Oval, Size2D::new(width, height))
    }

    pub fn round_rect(width: f64, height: f64, ratio: f64) -> Self {
        Self {
            round_rect_ratio: ratio,
            ..Self::new(PadShape::RoundRect, Size2D::new(width, height))
        }
    }

    pub fn chamfered_rect(width: f64, height: f64, ratio: f64) -> Self {
        Self {
            chamfer_ratio: ratio,
            ..Self::new(PadShape::ChamferedRect, Size2D::new(width, height))
        }
    }

    pub fn with_offset(mut self, offset: Position) -> Self {
        self.offset = offset;
        self
    }

    pub fn has_offset(&self) -> bool {
        self.offset.x != 0.0 || self.offset.y != 0.0
    }

    /// True when the closed-form annular width applies: a centred shape of
    /// one of the simple kinds.
    pub fn supports_analytic_width(&self) -> bool {
        if self.has_offset() {
            return false;
        }

        match self.shape {
            PadShape::Circle | PadShape::Oval | PadShape::Rect | PadShape::RoundRect => true,
            PadShape::ChamferedRect => self.chamfer_ratio <= CHAMFER_RATIO_CUTOFF,
            PadShape::Trapezoid | PadShape::Custom => false,
        }
    }

    /// Corner radius for rounded rectangles, clamped to half the smaller side
    pub fn corner_radius(&self) -> f64 {
        let min_side = self.size.width.min(self.size.height);
        (self.round_rect_ratio.clamp(0.0, 0.5)) * min_side
    }

    /// Chamfer length for chamfered rectangles
    pub fn chamfer_size(&self) -> f64 {
        let min_side = self.size.width.min(self.size.height);
        self.chamfer_ratio.clamp(0.0, 0.5) * min_side
    }
}

/// Default shape plus optional per-layer overrides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Padstack {
    pub default: PadLayerShape,
    #[serde(default)]
    pub layers: BTreeMap<String, PadLayerShape>,
}

impl Padstack {
    pub fn uniform(shape: PadLayerShape) -> Self {
        Self {
            default: shape,
            layers: BTreeMap::new(),
        }
    }

    pub fn with_layer(mut self, layer: &str, shape: PadLayerShape) -> Self {
        self.layers.insert(layer.to_string(), shape);
        self
    }

    pub fn shape_on(&self, layer: &str) -> &PadLayerShape {
        self.layers.get(layer).unwrap_or(&self.default)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DrillShape {
    #[default]
    Circle,
    Oblong,
}

/// Drilled hole of a pad
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Drill {
    pub size: Size2D,
    #[serde(default)]
    pub shape: DrillShape,
}

impl Drill {
    pub fn round(diameter: f64) -> Self {
        Self {
            size: Size2D::square(diameter),
            shape: DrillShape::Circle,
        }
    }

    pub fn oblong(width: f64, height: f64) -> Self {
        Self {
            size: Size2D::new(width, height),
            shape: DrillShape::Oblong,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size.width <= 0.0 || self.size.height <= 0.0
    }

    pub fn min_dimension(&self) -> f64 {
        match self.shape {
            DrillShape::Circle => self.size.width,
            DrillShape::Oblong => self.size.width.min(self.size.height),
        }
    }

    pub fn max_dimension(&self) -> f64 {
        match self.shape {
            DrillShape::Circle => self.size.width,
            DrillShape::Oblong => self.size.width.max(self.size.height),
        }
    }
}
