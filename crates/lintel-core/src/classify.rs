use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::annotations;
use crate::config::{Config, FallbackConfig};
use crate::geometry::{self, EPSILON};
use crate::types::{
    ClassifiedElement, ElementMetrics, ElementType, EntityKind, Point, RawGeometry, SpanDirection,
};

/// Why a classification is less than clean.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationNote {
    Clean,
    /// Metadata matched several types; resolved to the highest priority.
    Ambiguous { candidates: Vec<ElementType> },
    /// Geometry unusable; the element degraded to a zero-metric unknown.
    Degraded { reason: String },
}

/// One classified element together with its diagnostic note.
#[derive(Debug, Clone)]
pub struct Classification {
    pub element: ClassifiedElement,
    pub note: ClassificationNote,
}

/// Assigns element types to raw shapes: keyword metadata first, geometric
/// fallback second. Pure; every tunable comes from the configuration.
pub struct ElementClassifier {
    /// Lowercased keyword lists in priority order.
    keywords: Vec<(ElementType, Vec<String>)>,
    fallback: FallbackConfig,
    excluded_layers: GlobSet,
}

fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = GlobBuilder::new(pattern).case_insensitive(true).build() {
            builder.add(glob);
        }
    }
    builder
        .build()
        .unwrap_or_else(|_| GlobSetBuilder::new().build().unwrap())
}

/// Lowercase with the combining dot stripped, so the Turkish dotted capital
/// İ ("KİRİŞ") compares equal to the plain lowercase form ("kiriş").
fn normalize(s: &str) -> String {
    s.to_lowercase().replace('\u{307}', "")
}

impl ElementClassifier {
    pub fn new(config: &Config) -> Self {
        let kw = &config.keywords;
        let keywords = vec![
            (ElementType::Column, normalize_all(&kw.column)),
            (ElementType::Beam, normalize_all(&kw.beam)),
            (ElementType::Wall, normalize_all(&kw.wall)),
            (ElementType::Slab, normalize_all(&kw.slab)),
            (ElementType::Foundation, normalize_all(&kw.foundation)),
        ];
        Self {
            keywords,
            fallback: config.fallback.clone(),
            excluded_layers: build_globset(&config.layers.exclude),
        }
    }

    /// Whether a layer is excluded from analysis (annotation and
    /// dimension layers).
    pub fn is_excluded(&self, layer: &str) -> bool {
        self.excluded_layers.is_match(layer)
    }

    /// Classify one raw shape at the given position in the analyzed
    /// sequence. Unusable geometry degrades to an unknown element rather
    /// than failing the run.
    pub fn classify(&self, geom: &RawGeometry, index: usize) -> Classification {
        if let Some(reason) = degrade_reason(geom) {
            return Classification {
                element: degraded_unknown(geom, index),
                note: ClassificationNote::Degraded { reason },
            };
        }

        let metrics = compute_metrics(geom);
        let candidates = self.metadata_matches(geom);
        let (element_type, note) = match candidates.as_slice() {
            [] => (
                self.geometric_fallback(geom, &metrics),
                ClassificationNote::Clean,
            ),
            [only] => (*only, ClassificationNote::Clean),
            [first, ..] => (
                *first,
                ClassificationNote::Ambiguous {
                    candidates: candidates.clone(),
                },
            ),
        };

        Classification {
            element: build_element(geom, index, element_type, metrics),
            note,
        }
    }

    /// Every type whose keyword list matches the layer or block name, in
    /// priority order.
    fn metadata_matches(&self, geom: &RawGeometry) -> Vec<ElementType> {
        let layer = normalize(&geom.layer);
        let block = geom.block_name.as_deref().map(normalize);
        self.keywords
            .iter()
            .filter_map(|(ty, words)| {
                let hit = words.iter().any(|w| {
                    layer.contains(w.as_str())
                        || block.as_deref().is_some_and(|b| b.contains(w.as_str()))
                });
                hit.then_some(*ty)
            })
            .collect()
    }

    /// Geometry-only classification for shapes with no metadata match.
    fn geometric_fallback(&self, geom: &RawGeometry, metrics: &ElementMetrics) -> ElementType {
        if matches!(geom.kind, EntityKind::Text { .. }) {
            return ElementType::Unknown;
        }
        let fb = &self.fallback;
        let closed = encloses_area(geom);

        if closed
            && metrics.length <= fb.max_column_side
            && metrics.aspect_ratio <= fb.max_column_aspect
        {
            return ElementType::Column;
        }
        if metrics.aspect_ratio >= fb.min_beam_aspect && metrics.area < fb.min_slab_area {
            return ElementType::Beam;
        }
        if closed && metrics.area >= fb.min_slab_area {
            // Mean thickness of the outline. Thin for walls, large for slabs.
            let thinness = 2.0 * metrics.area / metrics.perimeter.max(EPSILON);
            if thinness <= fb.max_wall_thickness {
                return ElementType::Wall;
            }
            return ElementType::Slab;
        }
        ElementType::Unknown
    }
}

fn normalize_all(words: &[String]) -> Vec<String> {
    words.iter().map(|w| normalize(w)).collect()
}

/// Whether the shape encloses an area. Block references need an exploded
/// outline to count; a bare insertion point does not.
fn encloses_area(geom: &RawGeometry) -> bool {
    match geom.kind {
        EntityKind::Circle { .. } => true,
        EntityKind::Text { .. } => false,
        EntityKind::Polyline { closed } => closed && geom.points.len() >= 3,
        EntityKind::Region | EntityKind::Insert => geom.points.len() >= 3,
    }
}

/// A reason the geometry cannot be measured, or `None` when it can.
fn degrade_reason(geom: &RawGeometry) -> Option<String> {
    if geom.points.iter().any(|p| !p.is_finite()) {
        return Some("non-finite coordinates".to_string());
    }
    match &geom.kind {
        EntityKind::Circle { radius } if !(radius.is_finite() && *radius > 0.0) => {
            Some(format!("circle with invalid radius {radius}"))
        }
        EntityKind::Polyline { closed: true } | EntityKind::Region if geom.points.len() < 3 => {
            Some(format!(
                "closed outline with only {} point(s)",
                geom.points.len()
            ))
        }
        _ => None,
    }
}

/// Derive physical metrics for one shape. Circles use the exact formulas,
/// everything else goes through the polygon math over the point sequence.
fn compute_metrics(geom: &RawGeometry) -> ElementMetrics {
    if let EntityKind::Circle { radius } = geom.kind {
        let (area, circumference, diameter) = geometry::circle_metrics(radius);
        let center = geom
            .points
            .first()
            .copied()
            .unwrap_or_else(|| Point::new(0.0, 0.0));
        return ElementMetrics {
            area,
            perimeter: circumference,
            width: diameter,
            length: diameter,
            thickness: None,
            orientation: 0.0,
            aspect_ratio: 1.0,
            centroid: center,
        };
    }

    let points = &geom.points;
    let (width, length) = geometry::principal_dimensions(points);
    ElementMetrics {
        area: geometry::polygon_area(points),
        perimeter: geometry::perimeter(points),
        width,
        length,
        thickness: None,
        orientation: geometry::orientation_degrees(points),
        aspect_ratio: geometry::aspect_ratio(width, length),
        centroid: geometry::centroid(points),
    }
}

fn build_element(
    geom: &RawGeometry,
    index: usize,
    element_type: ElementType,
    metrics: ElementMetrics,
) -> ClassifiedElement {
    // Unknowns keep their bounding dimensions and centroid; everything
    // domain-specific is zeroed.
    let metrics = if element_type.is_unknown() {
        ElementMetrics {
            area: 0.0,
            perimeter: 0.0,
            orientation: 0.0,
            aspect_ratio: 0.0,
            ..metrics
        }
    } else {
        metrics
    };

    let span_direction = match element_type {
        ElementType::Beam | ElementType::Wall => Some(if metrics.orientation >= 90.0 {
            SpanDirection::Vertical
        } else {
            SpanDirection::Horizontal
        }),
        _ => None,
    };

    let thickness = match element_type {
        ElementType::Wall if metrics.width > 0.0 => Some(metrics.width),
        _ => None,
    };

    let section_label = match (&geom.kind, element_type) {
        (EntityKind::Text { content }, ElementType::Column | ElementType::Beam) => {
            annotations::extract_section(content)
                .map(|(w, l)| annotations::section_label(w, l))
        }
        (_, ElementType::Column) if metrics.width > 0.0 => {
            Some(annotations::section_label(metrics.width, metrics.length))
        }
        _ => None,
    };

    ClassifiedElement {
        index,
        element_type,
        source: geom.clone(),
        metrics: ElementMetrics {
            thickness,
            ..metrics
        },
        section_label,
        span_direction,
    }
}

fn degraded_unknown(geom: &RawGeometry, index: usize) -> ClassifiedElement {
    ClassifiedElement {
        index,
        element_type: ElementType::Unknown,
        source: geom.clone(),
        metrics: ElementMetrics::zero(),
        section_label: None,
        span_direction: None,
    }
}
