use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D point in drawing units (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Entity kind tag carried over from the drawing export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    Polyline { closed: bool },
    Region,
    /// An inserted block reference. Points hold the insertion point, or the
    /// exploded outline when the exporter resolves the block geometry.
    Insert,
    Circle { radius: f64 },
    Text { content: String },
}

/// One geometric primitive extracted from a drawing, with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGeometry {
    pub points: Vec<Point>,
    pub layer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_name: Option<String>,
    pub kind: EntityKind,
}

/// Structural role assigned to a shape. Declaration order is the resolution
/// priority when metadata matches more than one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Column,
    Beam,
    Wall,
    Slab,
    Foundation,
    Unknown,
}

impl ElementType {
    /// The classifiable types in priority order. Unknown is the absence of a
    /// match, never a match itself.
    pub const CLASSIFIABLE: [ElementType; 5] = [
        ElementType::Column,
        ElementType::Beam,
        ElementType::Wall,
        ElementType::Slab,
        ElementType::Foundation,
    ];

    pub fn is_unknown(&self) -> bool {
        matches!(self, ElementType::Unknown)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ElementType::Column => "column",
            ElementType::Beam => "beam",
            ElementType::Wall => "wall",
            ElementType::Slab => "slab",
            ElementType::Foundation => "foundation",
            ElementType::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ElementType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "column" => Ok(ElementType::Column),
            "beam" => Ok(ElementType::Beam),
            "wall" => Ok(ElementType::Wall),
            "slab" => Ok(ElementType::Slab),
            "foundation" => Ok(ElementType::Foundation),
            "unknown" => Ok(ElementType::Unknown),
            _ => Err(anyhow::anyhow!("unknown element type: {}", s)),
        }
    }
}

/// Dominant axis of a linear element in plan view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanDirection {
    Horizontal,
    Vertical,
}

impl fmt::Display for SpanDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanDirection::Horizontal => write!(f, "horizontal"),
            SpanDirection::Vertical => write!(f, "vertical"),
        }
    }
}

/// Physical quantities derived from an element's outline. All lengths are in
/// meters, areas in square meters, orientation in degrees within [0, 180).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementMetrics {
    pub area: f64,
    pub perimeter: f64,
    /// Shorter bounding-box side.
    pub width: f64,
    /// Longer bounding-box side.
    pub length: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
    pub orientation: f64,
    pub aspect_ratio: f64,
    pub centroid: Point,
}

impl ElementMetrics {
    pub fn zero() -> Self {
        Self {
            area: 0.0,
            perimeter: 0.0,
            width: 0.0,
            length: 0.0,
            thickness: None,
            orientation: 0.0,
            aspect_ratio: 0.0,
            centroid: Point::new(0.0, 0.0),
        }
    }
}

/// A raw shape after classification. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedElement {
    /// Position in the analyzed sequence; compliance warnings refer to
    /// elements through this index.
    pub index: usize,
    pub element_type: ElementType,
    pub source: RawGeometry,
    pub metrics: ElementMetrics,
    /// Cross-section label in centimeters, e.g. `30x50`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_direction: Option<SpanDirection>,
}

/// Severity of a compliance warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "critical" | "crit" => Ok(Severity::Critical),
            _ => Err(anyhow::anyhow!("unknown severity: {}", s)),
        }
    }
}

/// A single code-compliance finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceWarning {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Indexes of the offending elements; empty for aggregate findings.
    #[serde(default)]
    pub element_refs: Vec<usize>,
}
