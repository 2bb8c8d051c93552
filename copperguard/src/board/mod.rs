//! Board Item Model
//!
//! Read-only snapshot of the copper objects the DRC engine inspects:
//! track segments, vias, footprints and their pads. Everything is in
//! millimetres; angles are in degrees.
//!
//! The snapshot is plain serde data so hosts can hand the engine a board
//! exported from any editor. The engine never mutates it.

mod items;
mod padstack;

pub use items::{BoardItem, ItemKind};
pub use padstack::{
    ChamferCorners, Drill, DrillShape, PadLayerShape, PadShape, Padstack, CHAMFER_RATIO_CUTOFF,
};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::core::DrcError;
use crate::geometry::{HoleShape, Seg};

/// Pad layer wildcard meaning "every copper layer of the board"
pub const ALL_COPPER_LAYERS: &str = "*.Cu";

/// 2D position in millimetres
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rotate about the origin by `degrees` (counter-clockwise)
    pub fn rotated(&self, degrees: f64) -> Self {
        if degrees == 0.0 {
            return *self;
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    pub fn translated(&self, other: Position) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Size2D {
    pub width: f64,
    pub height: f64,
}

impl Size2D {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn square(side: f64) -> Self {
        Self::new(side, side)
    }
}

/// Net definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcbNet {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub netclass: Option<String>,
}

/// Footprint (component) on the board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Footprint {
    pub uuid: String,
    pub reference: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub pads: Vec<Pad>,
}

impl Footprint {
    /// All pads sharing `number`, except `exclude` itself. Unnumbered pads
    /// have no siblings.
    pub fn pads_with_number<'a>(&'a self, number: &str, exclude: &Pad) -> Vec<&'a Pad> {
        if number.is_empty() {
            return Vec::new();
        }

        self.pads
            .iter()
            .filter(|p| p.number == number && !std::ptr::eq(*p, exclude))
            .collect()
    }
}

/// Pad on a footprint. Positions are absolute board coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pad {
    pub uuid: String,
    #[serde(default)]
    pub number: String,
    pub pad_type: PadType,
    pub position: Position,
    #[serde(default)]
    pub orientation: f64,
    pub padstack: Padstack,
    #[serde(default)]
    pub drill: Option<Drill>,
    pub layers: Vec<String>,
    #[serde(default)]
    pub net: Option<u32>,
    #[serde(default)]
    pub net_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PadType {
    ThruHole,
    SMD,
    Connect,
    NPThruHole, // Non-plated through hole
}

impl Pad {
    pub fn has_hole(&self) -> bool {
        self.drill.as_ref().map_or(false, |d| !d.is_empty())
    }

    pub fn is_plated_through(&self) -> bool {
        self.pad_type == PadType::ThruHole
    }

    pub fn shape_on(&self, layer: &str) -> &PadLayerShape {
        self.padstack.shape_on(layer)
    }

    /// The hole as a capsule centred on the pad position. Oblong drills are
    /// aligned with their long side and rotated with the pad.
    pub fn hole_shape(&self) -> Option<HoleShape> {
        let drill = self.drill.as_ref().filter(|d| !d.is_empty())?;
        let centre = self.position;

        let (half_len, width) = match drill.shape {
            DrillShape::Circle => (Position::default(), drill.size.width),
            DrillShape::Oblong => {
                let Size2D { width, height } = drill.size;
                if width >= height {
                    (Position::new((width - height) / 2.0, 0.0), height)
                } else {
                    (Position::new(0.0, (height - width) / 2.0), width)
                }
            }
        };

        let half_len = half_len.rotated(self.orientation);
        let a = Position::new(centre.x - half_len.x, centre.y - half_len.y);
        let b = centre.translated(half_len);
        Some(HoleShape::new(Seg::from_positions(a, b), width))
    }
}

/// Track segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub uuid: String,
    pub start: Position,
    pub end: Position,
    pub width: f64,
    pub layer: String,
    #[serde(default)]
    pub net: u32,
    #[serde(default)]
    pub net_name: Option<String>,
}

impl Trace {
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    pub fn midpoint(&self) -> Position {
        Position::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }
}

/// Via (vertical interconnect)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Via {
    pub uuid: String,
    pub position: Position,
    /// Default pad diameter (mm)
    pub size: f64,
    /// Per-layer pad diameters overriding `size`
    #[serde(default)]
    pub layer_sizes: BTreeMap<String, f64>,
    /// Drill diameter (mm)
    pub drill: f64,
    /// Start and end copper layers
    pub layers: (String, String),
    #[serde(default)]
    pub net: u32,
    #[serde(default)]
    pub net_name: Option<String>,
    #[serde(default)]
    pub via_type: ViaType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ViaType {
    #[default]
    Through,
    Blind,
    Buried,
    Micro,
}

impl Via {
    pub fn width_on(&self, layer: &str) -> f64 {
        self.layer_sizes.get(layer).copied().unwrap_or(self.size)
    }

    pub fn hole_shape(&self) -> HoleShape {
        let p = self.position;
        HoleShape::new(Seg::from_positions(p, p), self.drill)
    }
}

/// Complete board snapshot handed to the DRC engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub filename: String,
    /// Copper layers in stack order, front to back
    #[serde(default = "default_copper_layers")]
    pub copper_layers: Vec<String>,
    #[serde(default)]
    pub nets: Vec<PcbNet>,
    #[serde(default)]
    pub footprints: Vec<Footprint>,
    #[serde(default)]
    pub traces: Vec<Trace>,
    #[serde(default)]
    pub vias: Vec<Via>,
}

fn default_copper_layers() -> Vec<String> {
    vec!["F.Cu".to_string(), "B.Cu".to_string()]
}

impl Default for Board {
    fn default() -> Self {
        Self {
            uuid: String::new(),
            filename: String::new(),
            copper_layers: default_copper_layers(),
            nets: Vec::new(),
            footprints: Vec::new(),
            traces: Vec::new(),
            vias: Vec::new(),
        }
    }
}

impl Board {
    pub fn from_json_str(json: &str) -> Result<Self, DrcError> {
        let board: Board = serde_json::from_str(json)?;
        board.validate()?;
        Ok(board)
    }

    /// Reject snapshots the engine cannot reason about
    pub fn validate(&self) -> Result<(), DrcError> {
        if self.copper_layers.is_empty() {
            return Err(DrcError::Board("board has no copper layers".to_string()));
        }

        let mut seen = HashSet::new();
        for layer in &self.copper_layers {
            if !seen.insert(layer.as_str()) {
                return Err(DrcError::Board(format!("duplicate copper layer {}", layer)));
            }
        }

        for via in &self.vias {
            for layer in [&via.layers.0, &via.layers.1] {
                if !seen.contains(layer.as_str()) {
                    return Err(DrcError::Board(format!(
                        "via {} references unknown copper layer {}",
                        via.uuid, layer
                    )));
                }
            }
        }

        Ok(())
    }

    fn layer_index(&self, layer: &str) -> Option<usize> {
        self.copper_layers.iter().position(|l| l == layer)
    }

    pub fn is_copper_layer(&self, layer: &str) -> bool {
        self.layer_index(layer).is_some()
    }

    /// Copper layers spanned by a via, in stack order
    pub fn via_layers(&self, via: &Via) -> Vec<&str> {
        let (Some(a), Some(b)) = (self.layer_index(&via.layers.0), self.layer_index(&via.layers.1))
        else {
            return Vec::new();
        };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.copper_layers[lo..=hi].iter().map(String::as_str).collect()
    }

    /// Copper layers a pad occupies, in stack order
    pub fn pad_layers(&self, pad: &Pad) -> Vec<&str> {
        if pad.layers.iter().any(|l| l == ALL_COPPER_LAYERS) {
            return self.copper_layers.iter().map(String::as_str).collect();
        }

        self.copper_layers
            .iter()
            .filter(|l| pad.layers.contains(*l))
            .map(String::as_str)
            .collect()
    }

    /// Copper layers of any item
    pub fn item_layers(&self, item: &BoardItem<'_>) -> Vec<&str> {
        match *item {
            BoardItem::Track(t) => self
                .copper_layers
                .iter()
                .filter(|l| **l == t.layer)
                .map(String::as_str)
                .collect(),
            BoardItem::Via(v) => self.via_layers(v),
            BoardItem::Pad { pad, .. } => self.pad_layers(pad),
        }
    }

    /// Track segments followed by vias, in board order
    pub fn tracks(&self) -> impl Iterator<Item = BoardItem<'_>> {
        self.traces
            .iter()
            .map(BoardItem::Track)
            .chain(self.vias.iter().map(BoardItem::Via))
    }

    /// Every footprint pad together with its footprint
    pub fn pads(&self) -> impl Iterator<Item = BoardItem<'_>> {
        self.footprints.iter().flat_map(|footprint| {
            footprint
                .pads
                .iter()
                .map(move |pad| BoardItem::Pad { pad, footprint })
        })
    }

    pub fn items(&self) -> impl Iterator<Item = BoardItem<'_>> {
        self.tracks().chain(self.pads())
    }

    pub fn net(&self, id: u32) -> Option<&PcbNet> {
        self.nets.iter().find(|n| n.id == id)
    }

    pub fn net_name(&self, id: u32) -> Option<&str> {
        self.net(id).map(|n| n.name.as_str())
    }

    pub fn netclass_of(&self, id: u32) -> Option<&str> {
        self.net(id).and_then(|n| n.netclass.as_deref())
    }
}
