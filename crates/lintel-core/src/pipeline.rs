use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::classify::{Classification, ClassificationNote, ElementClassifier};
use crate::config::Config;
use crate::error::AnalysisError;
use crate::rules;
use crate::stats::{self, AnalysisResult};
use crate::types::{ClassifiedElement, ComplianceWarning, ElementType, RawGeometry};

/// Classified elements, statistics and compliance warnings for one run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    pub result: AnalysisResult,
    pub warnings: Vec<ComplianceWarning>,
}

/// Runs the classify, aggregate and rule phases over raw drawing geometry.
pub struct Analyzer {
    config: Config,
    classifier: ElementClassifier,
}

impl Analyzer {
    pub fn new(config: Config) -> Self {
        let classifier = ElementClassifier::new(&config);
        Self { config, classifier }
    }

    /// Analyze a batch of raw geometry.
    pub fn analyze(&self, geometry: &[RawGeometry]) -> AnalysisOutput {
        let never = AtomicBool::new(false);
        self.analyze_with_cancel(geometry, &never)
            .expect("uncancelled analysis cannot fail")
    }

    /// Analyze with a cancellation flag. The flag is checked at the barrier
    /// between classification and aggregation; a cancelled run returns an
    /// error and never a partial result.
    pub fn analyze_with_cancel(
        &self,
        geometry: &[RawGeometry],
        cancel: &AtomicBool,
    ) -> Result<AnalysisOutput, AnalysisError> {
        let (kept, skipped_count) = self.partition_excluded(geometry);

        // Elements are classified independently; the classifier is shared
        // read-only, and indexed collection keeps the input order.
        let classifications: Vec<Classification> = kept
            .par_iter()
            .enumerate()
            .map(|(index, geom)| self.classifier.classify(geom, index))
            .collect();

        if cancel.load(Ordering::Relaxed) {
            return Err(AnalysisError::Cancelled);
        }

        let mut elements_by_type: BTreeMap<ElementType, Vec<ClassifiedElement>> = BTreeMap::new();
        let mut total_count = 0;
        let mut degraded_count = 0;
        for Classification { element, note } in classifications {
            match note {
                ClassificationNote::Clean => {}
                ClassificationNote::Ambiguous { candidates } => {
                    let names: Vec<String> =
                        candidates.iter().map(|t| t.to_string()).collect();
                    eprintln!(
                        "Warning: layer '{}' matches several element types ({}); keeping {}",
                        element.source.layer,
                        names.join(", "),
                        element.element_type
                    );
                }
                ClassificationNote::Degraded { reason } => {
                    eprintln!("Warning: element {} degraded: {}", element.index, reason);
                    degraded_count += 1;
                }
            }
            total_count += 1;
            elements_by_type
                .entry(element.element_type)
                .or_default()
                .push(element);
        }

        let statistics = stats::compute(&elements_by_type);
        let result = AnalysisResult {
            elements_by_type,
            statistics,
            total_count,
            degraded_count,
            skipped_count,
        };
        let warnings = rules::evaluate(&result, &self.config.thresholds, &self.config.rules);

        Ok(AnalysisOutput { result, warnings })
    }

    fn partition_excluded<'a>(&self, geometry: &'a [RawGeometry]) -> (Vec<&'a RawGeometry>, usize) {
        let mut kept = Vec::with_capacity(geometry.len());
        let mut skipped = 0;
        for geom in geometry {
            if self.classifier.is_excluded(&geom.layer) {
                skipped += 1;
            } else {
                kept.push(geom);
            }
        }
        (kept, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityKind, Point};

    fn closed_rect(layer: &str, x: f64, y: f64, w: f64, h: f64) -> RawGeometry {
        RawGeometry {
            points: vec![
                Point::new(x, y),
                Point::new(x + w, y),
                Point::new(x + w, y + h),
                Point::new(x, y + h),
            ],
            layer: layer.to_string(),
            block_name: None,
            kind: EntityKind::Polyline { closed: true },
        }
    }

    fn sample_plan() -> Vec<RawGeometry> {
        vec![
            closed_rect("DOSEME", 0.0, 0.0, 10.0, 10.0),
            closed_rect("KOLON", 0.0, 0.0, 0.3, 0.3),
            closed_rect("KOLON", 9.7, 9.7, 0.3, 0.3),
            closed_rect("PERDE", 0.0, 2.0, 0.25, 6.0),
            RawGeometry {
                points: vec![Point::new(0.0, 5.0), Point::new(6.0, 5.0)],
                layer: "KIRIS".to_string(),
                block_name: None,
                kind: EntityKind::Polyline { closed: false },
            },
        ]
    }

    #[test]
    fn test_analyze_groups_and_counts() {
        let analyzer = Analyzer::new(Config::default());
        let output = analyzer.analyze(&sample_plan());
        let result = &output.result;
        assert_eq!(result.total_count, 5);
        assert_eq!(result.degraded_count, 0);
        assert_eq!(result.skipped_count, 0);
        assert_eq!(result.count_of(ElementType::Slab), 1);
        assert_eq!(result.count_of(ElementType::Column), 2);
        assert_eq!(result.count_of(ElementType::Wall), 1);
        assert_eq!(result.count_of(ElementType::Beam), 1);
    }

    #[test]
    fn test_analyze_preserves_input_order_in_indexes() {
        let analyzer = Analyzer::new(Config::default());
        let output = analyzer.analyze(&sample_plan());
        let columns = &output.result.elements_by_type[&ElementType::Column];
        assert_eq!(columns[0].index, 1);
        assert_eq!(columns[1].index, 2);
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let analyzer = Analyzer::new(Config::default());
        let plan = sample_plan();
        let first = analyzer.analyze(&plan);
        let second = analyzer.analyze(&plan);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_excluded_layers_are_skipped_and_counted() {
        let analyzer = Analyzer::new(Config::default());
        let mut plan = sample_plan();
        plan.push(closed_rect("S-DIM-01", 0.0, 0.0, 1.0, 1.0));
        plan.push(closed_rect("DEFPOINTS", 0.0, 0.0, 1.0, 1.0));
        let output = analyzer.analyze(&plan);
        assert_eq!(output.result.skipped_count, 2);
        assert_eq!(output.result.total_count, 5);
    }

    #[test]
    fn test_degraded_elements_are_kept_as_unknown() {
        let analyzer = Analyzer::new(Config::default());
        let plan = vec![RawGeometry {
            points: vec![Point::new(0.0, 0.0)],
            layer: "KOLON".to_string(),
            block_name: None,
            kind: EntityKind::Polyline { closed: true },
        }];
        let output = analyzer.analyze(&plan);
        assert_eq!(output.result.total_count, 1);
        assert_eq!(output.result.degraded_count, 1);
        assert_eq!(output.result.count_of(ElementType::Unknown), 1);
    }

    #[test]
    fn test_cancelled_run_returns_no_partial_result() {
        let analyzer = Analyzer::new(Config::default());
        let cancel = AtomicBool::new(true);
        let err = analyzer
            .analyze_with_cancel(&sample_plan(), &cancel)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Cancelled));
    }

    #[test]
    fn test_empty_input_produces_empty_result() {
        let analyzer = Analyzer::new(Config::default());
        let output = analyzer.analyze(&[]);
        assert_eq!(output.result.total_count, 0);
        assert!(output.result.elements_by_type.is_empty());
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_warnings_reference_analyzed_indexes() {
        let analyzer = Analyzer::new(Config::default());
        let mut plan = sample_plan();
        // An undersized column at position 5.
        plan.push(closed_rect("KOLON", 5.0, 5.0, 0.2, 0.2));
        let output = analyzer.analyze(&plan);
        let finding = output
            .warnings
            .iter()
            .find(|w| w.rule_id == "column_min_size")
            .expect("undersized column should fire");
        assert_eq!(finding.element_refs, vec![5]);
    }
}
