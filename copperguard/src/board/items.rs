//! Borrowed views over board items
//!
//! Providers see every copper object through [`BoardItem`], a closed set of
//! variants they can match on. Anything a provider does not understand is
//! simply ignored by its `match`.

use serde::{Deserialize, Serialize};

use super::{Footprint, Pad, Position, Trace, Via};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    Track,
    Via,
    Pad,
}

#[derive(Debug, Clone, Copy)]
pub enum BoardItem<'a> {
    Track(&'a Trace),
    Via(&'a Via),
    Pad {
        pad: &'a Pad,
        footprint: &'a Footprint,
    },
}

impl<'a> BoardItem<'a> {
    pub fn kind(&self) -> ItemKind {
        match *self {
            BoardItem::Track(_) => ItemKind::Track,
            BoardItem::Via(_) => ItemKind::Via,
            BoardItem::Pad { .. } => ItemKind::Pad,
        }
    }

    pub fn uuid(&self) -> &'a str {
        match *self {
            BoardItem::Track(t) => &t.uuid,
            BoardItem::Via(v) => &v.uuid,
            BoardItem::Pad { pad, .. } => &pad.uuid,
        }
    }

    /// Anchor position used when reporting violations
    pub fn position(&self) -> Position {
        match *self {
            BoardItem::Track(t) => t.midpoint(),
            BoardItem::Via(v) => v.position,
            BoardItem::Pad { pad, .. } => pad.position,
        }
    }

    pub fn net(&self) -> Option<u32> {
        match *self {
            BoardItem::Track(t) => Some(t.net),
            BoardItem::Via(v) => Some(v.net),
            BoardItem::Pad { pad, .. } => pad.net,
        }
    }

    pub fn net_name(&self) -> Option<&'a str> {
        match *self {
            BoardItem::Track(t) => t.net_name.as_deref(),
            BoardItem::Via(v) => v.net_name.as_deref(),
            BoardItem::Pad { pad, .. } => pad.net_name.as_deref(),
        }
    }

    pub fn footprint(&self) -> Option<&'a Footprint> {
        match *self {
            BoardItem::Pad { footprint, .. } => Some(footprint),
            _ => None,
        }
    }

    /// True when both items sit on the same real net. Unconnected items
    /// (no net, or net 0) never share a net.
    pub fn shares_net_with(&self, other: &BoardItem<'_>) -> bool {
        match (self.net(), other.net()) {
            (Some(a), Some(b)) => a != 0 && a == b,
            _ => false,
        }
    }

    /// Short human-readable description, e.g. `Pad 1 of U3` or `Via [GND]`
    pub fn describe(&self) -> String {
        let net = self
            .net_name()
            .map(|n| format!(" [{}]", n))
            .unwrap_or_default();

        match *self {
            BoardItem::Track(t) => format!("Track{} on {}", net, t.layer),
            BoardItem::Via(v) => format!("Via{} {} - {}", net, v.layers.0, v.layers.1),
            BoardItem::Pad { pad, footprint } => {
                format!("Pad {}{} of {}", pad.number, net, footprint.reference)
            }
        }
    }
}
