use chrono::Local;
use colored::Colorize;

use lintel_core::pipeline::AnalysisOutput;
use lintel_core::stats::AggregateValue;
use lintel_core::types::Severity;

/// Format a full analysis report for terminal output.
pub fn format_report(output: &AnalysisOutput) -> String {
    let mut out = String::new();
    let result = &output.result;

    out.push_str(&format!("\n{}\n", "Structural Plan Analysis".bold()));
    out.push_str(&format!("{}\n", "=".repeat(50)));
    out.push_str(&format!(
        "Generated {}\n",
        Local::now().format("%Y-%m-%d %H:%M")
    ));

    out.push_str(&format!(
        "\n{} {} elements ({} degraded, {} skipped)\n",
        "Analyzed".bold(),
        result.total_count,
        result.degraded_count,
        result.skipped_count
    ));

    if !result.statistics.per_type.is_empty() {
        out.push_str(&format!("\n{}\n{}\n", "Elements".bold(), "-".repeat(50)));
        for (ty, stats) in &result.statistics.per_type {
            out.push_str(&format!(
                "  {:<12} {:>4}   total {:>9.2} m²   mean {:>8.2} m²\n",
                ty.to_string(),
                stats.count,
                stats.total_area,
                stats.mean_area
            ));
        }
    }

    out.push_str(&format!("\n{}\n{}\n", "Aggregates".bold(), "-".repeat(50)));
    out.push_str(&format!(
        "  Footprint area:          {:.2} m²\n",
        result.statistics.footprint_area
    ));
    out.push_str(&format!(
        "  Wall area ratio:         {}\n",
        format_ratio(&result.statistics.wall_area_ratio)
    ));
    out.push_str(&format!(
        "  Floor area per column:   {}\n",
        format_density(&result.statistics.floor_area_per_column)
    ));

    if output.warnings.is_empty() {
        out.push_str(&format!("\n{}\n", "No compliance warnings!".green().bold()));
    } else {
        out.push_str(&format!(
            "\n{} ({} found)\n{}\n",
            "Compliance Warnings".red().bold(),
            output.warnings.len(),
            "-".repeat(50)
        ));
        for warning in &output.warnings {
            let refs = if warning.element_refs.is_empty() {
                String::new()
            } else {
                let ids: Vec<String> = warning
                    .element_refs
                    .iter()
                    .map(|i| i.to_string())
                    .collect();
                format!(" (element {})", ids.join(", "))
            };
            out.push_str(&format!(
                "\n  {} [{}]{}\n",
                severity_label(warning.severity),
                warning.rule_id,
                refs
            ));
            out.push_str(&format!("    {}\n", warning.message));
            if let Some(ref suggestion) = warning.suggestion {
                out.push_str(&format!("    {}: {}\n", "Suggestion".cyan(), suggestion));
            }
        }
    }

    out.push('\n');
    out
}

/// Format a compliance check. Returns the rendered output and whether the
/// check passed at the given severity bar.
pub fn format_check(output: &AnalysisOutput, fail_on: Severity) -> (String, bool) {
    let mut out = String::new();

    let failing: Vec<_> = output
        .warnings
        .iter()
        .filter(|w| w.severity >= fail_on)
        .collect();

    for warning in &output.warnings {
        out.push_str(&format!(
            "{} [{}] {}\n",
            severity_label(warning.severity),
            warning.rule_id,
            warning.message
        ));
    }

    let passed = failing.is_empty();
    if passed {
        out.push_str(&format!("\n{}\n", "CHECK PASSED".green().bold()));
    } else {
        out.push_str(&format!(
            "\n{}: {} warning(s) at severity {} or above\n",
            "CHECK FAILED".red().bold(),
            failing.len(),
            fail_on
        ));
    }

    (out, passed)
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Critical => "CRIT".red().bold().to_string(),
        Severity::Warning => "WARN".yellow().bold().to_string(),
        Severity::Info => "INFO".blue().to_string(),
    }
}

fn format_ratio(value: &AggregateValue) -> String {
    match value.as_defined() {
        Some(v) => format!("{:.4}", v),
        None => "undefined".to_string(),
    }
}

fn format_density(value: &AggregateValue) -> String {
    match value.as_defined() {
        Some(v) => format!("{:.2} m²/column", v),
        None => "undefined".to_string(),
    }
}
