use std::collections::HashSet;
use std::f64::consts::PI;

use crate::config::{RulesConfig, ThresholdConfig};
use crate::stats::{median, AnalysisResult};
use crate::types::{ClassifiedElement, ComplianceWarning, ElementType, Severity};

/// How a rule inspects the analysis.
#[derive(Clone, Copy)]
enum RuleCheck {
    /// Evaluated once for every element of the given type.
    PerElement {
        element_type: ElementType,
        predicate: fn(&ClassifiedElement, &ThresholdConfig) -> Option<String>,
    },
    /// Evaluated once against the aggregates.
    Aggregate {
        predicate: fn(&AnalysisResult, &ThresholdConfig) -> Option<String>,
    },
}

/// One entry in the compliance rule table.
pub struct ComplianceRule {
    pub id: &'static str,
    default_severity: Severity,
    suggestion: &'static str,
    check: RuleCheck,
}

/// The built-in rule table. Adding a rule is adding an entry here; the
/// evaluation loop below never changes.
pub static RULES: &[ComplianceRule] = &[
    ComplianceRule {
        id: "column_min_size",
        default_severity: Severity::Critical,
        suggestion: "Increase the column cross-section to at least the configured minimum side.",
        check: RuleCheck::PerElement {
            element_type: ElementType::Column,
            predicate: column_min_size,
        },
    },
    ComplianceRule {
        id: "beam_max_span",
        default_severity: Severity::Warning,
        suggestion: "Split the span with an intermediate support or deepen the beam section.",
        check: RuleCheck::PerElement {
            element_type: ElementType::Beam,
            predicate: beam_max_span,
        },
    },
    ComplianceRule {
        id: "wall_min_ratio",
        default_severity: Severity::Critical,
        suggestion: "Add shear walls until the wall area reaches the required footprint fraction.",
        check: RuleCheck::Aggregate {
            predicate: wall_min_ratio,
        },
    },
    ComplianceRule {
        id: "wall_recommended_ratio",
        default_severity: Severity::Info,
        suggestion: "Consider additional shear walls to reach the recommended footprint fraction.",
        check: RuleCheck::Aggregate {
            predicate: wall_recommended_ratio,
        },
    },
    ComplianceRule {
        id: "column_density",
        default_severity: Severity::Warning,
        suggestion: "Add columns to reduce the floor area each one carries.",
        check: RuleCheck::Aggregate {
            predicate: column_density,
        },
    },
    ComplianceRule {
        id: "foundation_balance",
        default_severity: Severity::Warning,
        suggestion: "Check that every column line continues into a foundation element.",
        check: RuleCheck::Aggregate {
            predicate: foundation_balance,
        },
    },
    ComplianceRule {
        id: "foundation_excess",
        default_severity: Severity::Warning,
        suggestion: "Check for duplicated or leftover foundation outlines under the column grid.",
        check: RuleCheck::Aggregate {
            predicate: foundation_excess,
        },
    },
    ComplianceRule {
        id: "slab_compactness",
        default_severity: Severity::Info,
        suggestion: "Review the slab outline; highly irregular plans concentrate stresses.",
        check: RuleCheck::PerElement {
            element_type: ElementType::Slab,
            predicate: slab_compactness,
        },
    },
    ComplianceRule {
        id: "column_symmetry",
        default_severity: Severity::Warning,
        suggestion: "Distribute columns more evenly to pull the mass center back toward the grid median.",
        check: RuleCheck::Aggregate {
            predicate: column_symmetry,
        },
    },
];

fn column_min_size(element: &ClassifiedElement, thresholds: &ThresholdConfig) -> Option<String> {
    let side = element.metrics.width.min(element.metrics.length);
    // Symbols and labels have no drawn cross-section to measure.
    if side <= 0.0 {
        return None;
    }
    (side < thresholds.min_column_size).then(|| {
        format!(
            "column {} has cross-section side {:.2} m, below the minimum {:.2} m",
            element.section_label.as_deref().unwrap_or("(unlabeled)"),
            side,
            thresholds.min_column_size
        )
    })
}

fn beam_max_span(element: &ClassifiedElement, thresholds: &ThresholdConfig) -> Option<String> {
    let span = element.metrics.length;
    (span > thresholds.max_beam_span).then(|| {
        format!(
            "beam span {:.2} m exceeds the maximum {:.2} m",
            span, thresholds.max_beam_span
        )
    })
}

fn wall_min_ratio(result: &AnalysisResult, thresholds: &ThresholdConfig) -> Option<String> {
    let ratio = result.statistics.wall_area_ratio.as_defined()?;
    (ratio < thresholds.min_wall_ratio).then(|| {
        format!(
            "wall area is {:.2}% of the footprint, below the minimum {:.2}%",
            ratio * 100.0,
            thresholds.min_wall_ratio * 100.0
        )
    })
}

fn wall_recommended_ratio(
    result: &AnalysisResult,
    thresholds: &ThresholdConfig,
) -> Option<String> {
    let ratio = result.statistics.wall_area_ratio.as_defined()?;
    // Below the minimum the critical rule owns the finding.
    if ratio < thresholds.min_wall_ratio {
        return None;
    }
    (ratio < thresholds.recommended_wall_ratio).then(|| {
        format!(
            "wall area is {:.2}% of the footprint, below the recommended {:.2}%",
            ratio * 100.0,
            thresholds.recommended_wall_ratio * 100.0
        )
    })
}

fn column_density(result: &AnalysisResult, thresholds: &ThresholdConfig) -> Option<String> {
    // Undefined when there are no columns; the rule does not apply then.
    let density = result.statistics.floor_area_per_column.as_defined()?;
    (density > thresholds.max_column_density).then(|| {
        format!(
            "{:.1} m² of floor per column exceeds the maximum {:.1} m²",
            density, thresholds.max_column_density
        )
    })
}

fn foundation_balance(result: &AnalysisResult, thresholds: &ThresholdConfig) -> Option<String> {
    let columns = result.count_of(ElementType::Column);
    if columns == 0 {
        return None;
    }
    let foundations = result.count_of(ElementType::Foundation);
    let required = columns as f64 * thresholds.min_foundation_ratio;
    ((foundations as f64) < required).then(|| {
        format!(
            "{} foundation element(s) for {} column(s); expected at least {:.0}",
            foundations, columns, required
        )
    })
}

fn foundation_excess(result: &AnalysisResult, thresholds: &ThresholdConfig) -> Option<String> {
    let columns = result.count_of(ElementType::Column);
    let foundations = result.count_of(ElementType::Foundation);
    // With no columns at all, every foundation counts as surplus.
    let allowed = columns as f64 * thresholds.max_foundation_ratio;
    ((foundations as f64) > allowed).then(|| {
        format!(
            "{} foundation element(s) for {} column(s); expected at most {:.0}",
            foundations,
            columns,
            allowed.floor()
        )
    })
}

fn slab_compactness(element: &ClassifiedElement, thresholds: &ThresholdConfig) -> Option<String> {
    let (area, perimeter) = (element.metrics.area, element.metrics.perimeter);
    if area <= 0.0 || perimeter <= 0.0 {
        return None;
    }
    let compactness = 4.0 * PI * area / (perimeter * perimeter);
    (compactness < thresholds.min_slab_compactness).then(|| {
        format!(
            "slab outline compactness {:.2} is below {:.2}",
            compactness, thresholds.min_slab_compactness
        )
    })
}

fn column_symmetry(result: &AnalysisResult, thresholds: &ThresholdConfig) -> Option<String> {
    let columns = result.elements_by_type.get(&ElementType::Column)?;
    // Grids of four or fewer columns are exempt.
    if columns.len() <= 4 {
        return None;
    }
    let mut xs: Vec<f64> = columns.iter().map(|c| c.metrics.centroid.x).collect();
    let mut ys: Vec<f64> = columns.iter().map(|c| c.metrics.centroid.y).collect();
    let n = columns.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    xs.sort_by(|a, b| a.total_cmp(b));
    ys.sort_by(|a, b| a.total_cmp(b));
    let deviation = ((mean_x - median(&xs)).powi(2) + (mean_y - median(&ys)).powi(2)).sqrt();
    (deviation > thresholds.max_center_deviation).then(|| {
        format!(
            "column mass center sits {:.1} m from the median center, above the {:.1} m limit",
            deviation, thresholds.max_center_deviation
        )
    })
}

/// Evaluate the full rule table against an analysis.
///
/// The output is ordered by severity descending, then rule id, then the
/// first affected element. A duplicate finding for the same rule and
/// element keeps only the first occurrence.
pub fn evaluate(
    result: &AnalysisResult,
    thresholds: &ThresholdConfig,
    rules_config: &RulesConfig,
) -> Vec<ComplianceWarning> {
    let mut warnings = Vec::new();

    for rule in RULES {
        let severity = rules_config
            .severities
            .get(rule.id)
            .copied()
            .unwrap_or(rule.default_severity);

        match rule.check {
            RuleCheck::PerElement {
                element_type,
                predicate,
            } => {
                let Some(elements) = result.elements_by_type.get(&element_type) else {
                    continue;
                };
                for element in elements {
                    if let Some(message) = predicate(element, thresholds) {
                        warnings.push(ComplianceWarning {
                            rule_id: rule.id.to_string(),
                            severity,
                            message,
                            suggestion: Some(rule.suggestion.to_string()),
                            element_refs: vec![element.index],
                        });
                    }
                }
            }
            RuleCheck::Aggregate { predicate } => {
                if let Some(message) = predicate(result, thresholds) {
                    warnings.push(ComplianceWarning {
                        rule_id: rule.id.to_string(),
                        severity,
                        message,
                        suggestion: Some(rule.suggestion.to_string()),
                        element_refs: vec![],
                    });
                }
            }
        }
    }

    dedup_and_sort(warnings)
}

fn dedup_and_sort(mut warnings: Vec<ComplianceWarning>) -> Vec<ComplianceWarning> {
    let mut seen: HashSet<(String, Option<usize>)> = HashSet::new();
    warnings.retain(|w| seen.insert((w.rule_id.clone(), w.element_refs.first().copied())));
    warnings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.rule_id.cmp(&b.rule_id))
            .then_with(|| {
                let a_ref = a.element_refs.first().copied().unwrap_or(0);
                let b_ref = b.element_refs.first().copied().unwrap_or(0);
                a_ref.cmp(&b_ref)
            })
    });
    warnings
}
