use chrono::Local;

use lintel_core::pipeline::AnalysisOutput;
use lintel_core::stats::AggregateValue;
use lintel_core::types::Severity;

/// Format a full analysis report as markdown.
pub fn format_report(output: &AnalysisOutput) -> String {
    let mut out = String::new();
    let result = &output.result;

    out.push_str("# Structural Plan Analysis\n\n");
    out.push_str(&format!(
        "Generated {}\n\n",
        Local::now().format("%Y-%m-%d %H:%M")
    ));
    out.push_str(&format!(
        "Analyzed **{}** elements ({} degraded, {} skipped)\n\n",
        result.total_count, result.degraded_count, result.skipped_count
    ));

    if !result.statistics.per_type.is_empty() {
        out.push_str("## Elements\n\n");
        out.push_str("| Type | Count | Total area (m²) | Mean (m²) | Min (m²) | Max (m²) | Std dev |\n");
        out.push_str("|------|-------|-----------------|-----------|----------|----------|--------|\n");
        for (ty, stats) in &result.statistics.per_type {
            out.push_str(&format!(
                "| {} | {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |\n",
                ty, stats.count, stats.total_area, stats.mean_area, stats.min_area,
                stats.max_area, stats.std_dev_area
            ));
        }
        out.push('\n');
    }

    out.push_str("## Aggregates\n\n");
    out.push_str(&format!(
        "- Footprint area: {:.2} m²\n",
        result.statistics.footprint_area
    ));
    out.push_str(&format!(
        "- Wall area ratio: {}\n",
        format_aggregate(&result.statistics.wall_area_ratio)
    ));
    out.push_str(&format!(
        "- Floor area per column: {}\n\n",
        format_aggregate(&result.statistics.floor_area_per_column)
    ));

    if output.warnings.is_empty() {
        out.push_str("## Compliance\n\nNo warnings.\n");
    } else {
        out.push_str(&format!(
            "## Compliance Warnings ({})\n\n",
            output.warnings.len()
        ));
        out.push_str("| Severity | Rule | Elements | Message |\n");
        out.push_str("|----------|------|----------|----------|\n");
        for warning in &output.warnings {
            let refs: Vec<String> = warning
                .element_refs
                .iter()
                .map(|i| i.to_string())
                .collect();
            out.push_str(&format!(
                "| {} | `{}` | {} | {} |\n",
                severity_label(warning.severity),
                warning.rule_id,
                if refs.is_empty() {
                    "-".to_string()
                } else {
                    refs.join(", ")
                },
                warning.message
            ));
        }
    }

    out
}

/// Format a compliance check as markdown. Returns the rendered output and
/// whether the check passed at the given severity bar.
pub fn format_check(output: &AnalysisOutput, fail_on: Severity) -> (String, bool) {
    let mut out = format_report(output);

    let failing = output
        .warnings
        .iter()
        .filter(|w| w.severity >= fail_on)
        .count();
    let passed = failing == 0;

    out.push_str("\n## Result\n\n");
    if passed {
        out.push_str("**CHECK PASSED**\n");
    } else {
        out.push_str(&format!(
            "**CHECK FAILED**: {} warning(s) at severity {} or above\n",
            failing, fail_on
        ));
    }

    (out, passed)
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "CRITICAL",
        Severity::Warning => "WARNING",
        Severity::Info => "INFO",
    }
}

fn format_aggregate(value: &AggregateValue) -> String {
    match value.as_defined() {
        Some(v) => format!("{:.4}", v),
        None => "undefined".to_string(),
    }
}
