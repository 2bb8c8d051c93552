//! DRC violations

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::board::{BoardItem, Position};
use crate::rules::Severity;

/// Kind of problem a violation reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    AnnularWidth,
    DrillOutOfRange,
    ViaDiameter,
    TrackWidth,
    Clearance,
}

impl ErrorCode {
    pub fn all() -> &'static [ErrorCode] {
        &[
            ErrorCode::AnnularWidth,
            ErrorCode::DrillOutOfRange,
            ErrorCode::ViaDiameter,
            ErrorCode::TrackWidth,
            ErrorCode::Clearance,
        ]
    }

    /// Human-readable title, the first part of every message
    pub fn title(&self) -> &'static str {
        match self {
            ErrorCode::AnnularWidth => "Annular width",
            ErrorCode::DrillOutOfRange => "Hole size out of range",
            ErrorCode::ViaDiameter => "Via diameter",
            ErrorCode::TrackWidth => "Track width",
            ErrorCode::Clearance => "Clearance violation",
        }
    }

    /// Stable identifier for machine-readable output
    pub fn key(&self) -> &'static str {
        match self {
            ErrorCode::AnnularWidth => "annular_width",
            ErrorCode::DrillOutOfRange => "drill_out_of_range",
            ErrorCode::ViaDiameter => "via_diameter",
            ErrorCode::TrackWidth => "track_width",
            ErrorCode::Clearance => "clearance",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One reported design rule violation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrcViolation {
    /// Derived from the content, so identical runs give identical ids
    pub id: String,
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    /// Uuids of the implicated items
    pub items: Vec<String>,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound: Option<f64>,
}

impl DrcViolation {
    pub fn builder(code: ErrorCode) -> ViolationBuilder {
        ViolationBuilder::new(code)
    }

    /// Same violation reported with a different severity
    pub fn with_severity(self, severity: Severity) -> Self {
        Self { severity, ..self }
    }
}

/// Builder for [`DrcViolation`]. The id is assigned by [`ViolationBuilder::build`].
#[derive(Debug, Clone)]
pub struct ViolationBuilder {
    code: ErrorCode,
    severity: Severity,
    message: String,
    items: Vec<String>,
    position: Position,
    layer: Option<String>,
    rule: Option<String>,
    measured: Option<f64>,
    bound: Option<f64>,
}

impl ViolationBuilder {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            severity: Severity::Error,
            message: code.title().to_string(),
            items: Vec::new(),
            position: Position::default(),
            layer: None,
            rule: None,
            measured: None,
            bound: None,
        }
    }

    /// Message detail appended to the code's title
    pub fn detail(mut self, detail: impl AsRef<str>) -> Self {
        self.message = format!("{} {}", self.code.title(), detail.as_ref());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn item(mut self, item: &BoardItem<'_>) -> Self {
        self.items.push(item.uuid().to_string());
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn layer(mut self, layer: Option<&str>) -> Self {
        self.layer = layer.map(str::to_string);
        self
    }

    pub fn rule(mut self, rule: Option<String>) -> Self {
        self.rule = rule;
        self
    }

    pub fn measured(mut self, measured: f64, bound: f64) -> Self {
        self.measured = Some(measured);
        self.bound = Some(bound);
        self
    }

    pub fn build(self) -> DrcViolation {
        let key = format!(
            "{}|{}|{:.6}|{:.6}|{}|{}",
            self.code.key(),
            self.items.join(","),
            self.position.x,
            self.position.y,
            self.layer.as_deref().unwrap_or(""),
            self.message
        );

        DrcViolation {
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string(),
            code: self.code,
            severity: self.severity,
            message: self.message,
            items: self.items,
            position: self.position,
            layer: self.layer,
            rule: self.rule,
            measured: self.measured,
            bound: self.bound,
        }
    }
}

/// Format a length in millimetres
pub fn format_mm(value: f64, precision: usize) -> String {
    format!("{:.*} mm", precision, value)
}

/// Format a bound and a measured value so that they never print the same.
/// Starts at 4 decimals and adds digits while the two would collide.
pub fn format_bound_pair(bound: f64, actual: f64) -> (String, String) {
    let mut precision = 4;
    loop {
        let b = format_mm(bound, precision);
        let a = format_mm(actual, precision);
        if b != a || precision >= 8 {
            return (b, a);
        }
        precision += 1;
    }
}

/// Standard detail text: `(rule 'X' min width 0.2000 mm; actual 0.1500 mm)`
pub fn bound_detail(constraint_name: &str, what: &str, bound: f64, actual: f64) -> String {
    let (b, a) = format_bound_pair(bound, actual);
    format!("({} {} {}; actual {})", constraint_name, what, b, a)
}
