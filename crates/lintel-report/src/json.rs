use serde::Serialize;

use lintel_core::pipeline::AnalysisOutput;
use lintel_core::types::Severity;

/// Serialize a full analysis to JSON.
pub fn format_report(output: &AnalysisOutput, compact: bool) -> String {
    if compact {
        serde_json::to_string(output).expect("analysis output should be serializable")
    } else {
        serde_json::to_string_pretty(output).expect("analysis output should be serializable")
    }
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    #[serde(flatten)]
    output: &'a AnalysisOutput,
    check: CheckStatus,
}

#[derive(Serialize)]
struct CheckStatus {
    passed: bool,
    fail_on: Severity,
    failing_warning_count: usize,
}

/// Serialize a compliance check: the analysis plus a check block with the
/// pass verdict. Returns the JSON and whether the check passed.
pub fn format_check(output: &AnalysisOutput, fail_on: Severity, compact: bool) -> (String, bool) {
    let failing_warning_count = output
        .warnings
        .iter()
        .filter(|w| w.severity >= fail_on)
        .count();
    let passed = failing_warning_count == 0;

    let check_output = CheckOutput {
        output,
        check: CheckStatus {
            passed,
            fail_on,
            failing_warning_count,
        },
    };

    let rendered = if compact {
        serde_json::to_string(&check_output).expect("check output should be serializable")
    } else {
        serde_json::to_string_pretty(&check_output).expect("check output should be serializable")
    };

    (rendered, passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintel_core::config::Config;
    use lintel_core::pipeline::Analyzer;
    use lintel_core::types::{EntityKind, Point, RawGeometry};

    fn closed_rect(layer: &str, w: f64, h: f64) -> RawGeometry {
        RawGeometry {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(w, 0.0),
                Point::new(w, h),
                Point::new(0.0, h),
            ],
            layer: layer.to_string(),
            block_name: None,
            kind: EntityKind::Polyline { closed: true },
        }
    }

    fn sample_output() -> AnalysisOutput {
        let analyzer = Analyzer::new(Config::default());
        analyzer.analyze(&[
            closed_rect("DOSEME", 10.0, 10.0),
            closed_rect("KOLON", 0.2, 0.2),
        ])
    }

    #[test]
    fn test_report_is_valid_json() {
        let rendered = format_report(&sample_output(), false);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert!(value.get("result").is_some());
        assert!(value.get("warnings").is_some());
        assert_eq!(value["result"]["total_count"], 2);
    }

    #[test]
    fn test_compact_report_is_single_line() {
        let rendered = format_report(&sample_output(), true);
        assert_eq!(rendered.lines().count(), 1);
    }

    #[test]
    fn test_undefined_aggregates_serialize_as_marker() {
        let analyzer = Analyzer::new(Config::default());
        let output = analyzer.analyze(&[closed_rect("DOSEME", 10.0, 10.0)]);
        let rendered = format_report(&output, false);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(
            value["result"]["statistics"]["floor_area_per_column"],
            "undefined"
        );
    }

    #[test]
    fn test_check_failing() {
        let (rendered, passed) = format_check(&sample_output(), Severity::Critical, false);
        assert!(!passed);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["check"]["passed"], false);
        assert_eq!(value["check"]["fail_on"], "critical");
        assert!(value["check"]["failing_warning_count"].as_u64().unwrap() >= 1);
        // Flattened analysis fields sit beside the check block.
        assert!(value.get("result").is_some());
    }

    #[test]
    fn test_check_passing_at_higher_bar() {
        let analyzer = Analyzer::new(Config::default());
        let output = analyzer.analyze(&[
            closed_rect("DOSEME", 10.0, 10.0),
            closed_rect("KOLON", 0.3, 0.3),
            closed_rect("PERDE", 0.25, 8.4),
        ]);
        // Only warnings remain (density, foundations), so critical passes.
        let (rendered, passed) = format_check(&output, Severity::Critical, true);
        assert!(passed);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["check"]["passed"], true);

        let (_, passed_at_warning) = format_check(&output, Severity::Warning, true);
        assert!(!passed_at_warning);
    }
}
