use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::{ClassifiedElement, ElementType};

/// An aggregate that may have no defined value, such as floor area per
/// column when the drawing has no columns. Serializes as the number or the
/// string `"undefined"`; it is never NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateValue {
    Defined(f64),
    Undefined,
}

impl AggregateValue {
    pub fn as_defined(&self) -> Option<f64> {
        match self {
            AggregateValue::Defined(v) => Some(*v),
            AggregateValue::Undefined => None,
        }
    }
}

impl fmt::Display for AggregateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateValue::Defined(v) => write!(f, "{}", v),
            AggregateValue::Undefined => write!(f, "undefined"),
        }
    }
}

impl Serialize for AggregateValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            AggregateValue::Defined(v) => serializer.serialize_f64(*v),
            AggregateValue::Undefined => serializer.serialize_str("undefined"),
        }
    }
}

impl<'de> Deserialize<'de> for AggregateValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Marker(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(AggregateValue::Defined(v)),
            Raw::Marker(s) if s == "undefined" => Ok(AggregateValue::Undefined),
            Raw::Marker(s) => Err(D::Error::custom(format!(
                "expected a number or \"undefined\", got \"{s}\""
            ))),
        }
    }
}

/// Area distribution for one element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeStatistics {
    pub count: usize,
    pub total_area: f64,
    pub mean_area: f64,
    pub median_area: f64,
    pub min_area: f64,
    pub max_area: f64,
    pub std_dev_area: f64,
    pub total_perimeter: f64,
}

/// Cross-type aggregates for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub per_type: BTreeMap<ElementType, TypeStatistics>,
    /// Plan area covered by slab elements, square meters.
    pub footprint_area: f64,
    pub wall_area_ratio: AggregateValue,
    pub floor_area_per_column: AggregateValue,
}

/// Grouped elements plus derived statistics for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub elements_by_type: BTreeMap<ElementType, Vec<ClassifiedElement>>,
    pub statistics: Statistics,
    /// Every analyzed element, unknowns included.
    pub total_count: usize,
    /// Elements with unusable geometry that degraded to unknown.
    pub degraded_count: usize,
    /// Entities dropped before classification by layer exclusion.
    pub skipped_count: usize,
}

impl AnalysisResult {
    pub fn count_of(&self, ty: ElementType) -> usize {
        self.elements_by_type.get(&ty).map_or(0, Vec::len)
    }
}

/// Reduce grouped elements into per-type and cross-type statistics.
/// Deterministic: the same grouping always produces bit-identical output.
pub fn compute(elements_by_type: &BTreeMap<ElementType, Vec<ClassifiedElement>>) -> Statistics {
    let mut per_type = BTreeMap::new();
    for (ty, elements) in elements_by_type {
        if elements.is_empty() {
            continue;
        }
        per_type.insert(*ty, type_statistics(elements));
    }

    let footprint_area = total_area(elements_by_type, ElementType::Slab);
    let wall_area = total_area(elements_by_type, ElementType::Wall);
    let column_count = elements_by_type
        .get(&ElementType::Column)
        .map_or(0, Vec::len);

    let wall_area_ratio = if footprint_area > 0.0 {
        AggregateValue::Defined(wall_area / footprint_area)
    } else {
        AggregateValue::Undefined
    };

    let floor_area_per_column = if column_count > 0 {
        AggregateValue::Defined(footprint_area / column_count as f64)
    } else {
        AggregateValue::Undefined
    };

    Statistics {
        per_type,
        footprint_area,
        wall_area_ratio,
        floor_area_per_column,
    }
}

fn total_area(
    elements_by_type: &BTreeMap<ElementType, Vec<ClassifiedElement>>,
    ty: ElementType,
) -> f64 {
    elements_by_type
        .get(&ty)
        .map_or(0.0, |elements| elements.iter().map(|e| e.metrics.area).sum())
}

fn type_statistics(elements: &[ClassifiedElement]) -> TypeStatistics {
    let count = elements.len();
    let mut areas: Vec<f64> = elements.iter().map(|e| e.metrics.area).collect();
    let total_area: f64 = areas.iter().sum();
    let mean_area = total_area / count as f64;
    let variance = areas
        .iter()
        .map(|a| (a - mean_area).powi(2))
        .sum::<f64>()
        / count as f64;
    let total_perimeter = elements.iter().map(|e| e.metrics.perimeter).sum();

    areas.sort_by(|a, b| a.total_cmp(b));
    let median_area = median(&areas);

    TypeStatistics {
        count,
        total_area,
        mean_area,
        median_area,
        min_area: areas[0],
        max_area: areas[count - 1],
        std_dev_area: variance.sqrt(),
        total_perimeter,
    }
}

/// Median of a sorted, non-empty slice.
pub(crate) fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
