//! Report rendering for CSV, JSON and plain-text result files.

use handle_check_lib::{format_response_time, OutputFormat, ProbeOutcome, ResultSummary};
use serde::Serialize;
use std::collections::BTreeMap;

const CSV_HEADER: &str = "platform,username,status,url,category,response_time,status_code,error";

/// Everything a report needs besides its format.
pub struct ReportContext<'a> {
    pub username: &'a str,
    pub results: &'a [ProbeOutcome],
    pub summary: &'a ResultSummary,
    pub debug: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    timestamp: String,
    total_platforms: usize,
    summary: &'a ResultSummary,
    results: &'a [ProbeOutcome],
}

/// Pretty-printed JSON document with a generation timestamp.
pub fn render_json(
    results: &[ProbeOutcome],
    summary: &ResultSummary,
) -> Result<String, serde_json::Error> {
    let report = JsonReport {
        timestamp: chrono::Local::now().to_rfc3339(),
        total_platforms: summary.total_platforms,
        summary,
        results,
    };
    serde_json::to_string_pretty(&report)
}

/// CSV with a header row and one row per result.
pub fn render_csv(results: &[ProbeOutcome]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for result in results {
        let status_code = result
            .status_code
            .map(|code| code.to_string())
            .unwrap_or_default();
        let fields = [
            csv_field(&result.platform),
            csv_field(&result.username),
            result.status.to_string(),
            csv_field(&result.url),
            csv_field(&result.category),
            format!("{:.2}", result.response_time_ms),
            status_code,
            csv_field(result.error.as_deref().unwrap_or_default()),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

/// Quote a field when it contains a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Plain-text report for files: no colors, grouped by category.
pub fn render_text(report: &ReportContext<'_>) -> String {
    let mut lines = vec![
        "Username Availability Report".to_string(),
        "=".repeat(40),
        format!("Username: {}", report.username),
        format!("Generated: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")),
        String::new(),
    ];

    let mut by_category: BTreeMap<&str, Vec<&ProbeOutcome>> = BTreeMap::new();
    for result in report.results {
        if result.status.is_error() && !report.debug {
            continue;
        }
        by_category.entry(&result.category).or_default().push(result);
    }

    for (category, outcomes) in by_category {
        lines.push(format!("{}:", category.to_uppercase()));
        lines.push("-".repeat(20));
        for outcome in outcomes {
            lines.push(format!(
                "  {:<20} {:<10} {:>7}  {}",
                outcome.platform,
                outcome.status.as_str().to_uppercase(),
                format_response_time(outcome.response_time_ms),
                outcome.url
            ));
            if let (true, Some(error)) = (report.debug, &outcome.error) {
                lines.push(format!("    error: {}", error));
            }
        }
        lines.push(String::new());
    }

    let summary = report.summary;
    lines.push("SUMMARY:".to_string());
    lines.push("-".repeat(20));
    lines.push(format!("Total platforms: {}", summary.total_platforms));
    lines.push(format!("Available: {}", summary.available));
    lines.push(format!("Taken: {}", summary.taken));
    if summary.unknown > 0 {
        lines.push(format!("Unknown: {}", summary.unknown));
    }
    if report.debug && summary.errors > 0 {
        lines.push(format!("Errors: {}", summary.errors));
    }
    lines.push(format!(
        "Availability rate: {:.1}%",
        summary.availability_rate()
    ));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Write the report to `path` in the given format.
pub fn save_to_file(
    path: &str,
    format: OutputFormat,
    report: &ReportContext<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    let contents = match format {
        OutputFormat::Json => render_json(report.results, report.summary)?,
        OutputFormat::Csv => render_csv(report.results),
        OutputFormat::Text => render_text(report),
    };

    std::fs::write(path, contents)
        .map_err(|e| format!("Failed to write results to '{}': {}", path, e))?;
    tracing::debug!(path, %format, "results saved");
    Ok(())
}
