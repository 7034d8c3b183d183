//! Console display logic for handle-check.
//!
//! This module handles all styled terminal output: the run header, results
//! grouped by category, live progress lines, summaries and the listing
//! commands. Uses only the `console` crate.

use console::{pad_str, style, Alignment, Term};
use handle_check_lib::{
    format_response_time, Availability, Catalog, CheckConfig, ProbeOutcome, ProgressEvent,
    ProgressSink, ResultSummary,
};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::ErrorStats;

const PLATFORM_WIDTH: usize = 20;

// ── Progress ─────────────────────────────────────────────────────────────────

/// Writes one line per finished platform to stderr so stdout stays clean.
pub struct ConsoleProgress {
    term: Term,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn emit(&self, event: ProgressEvent) {
        let line = format!(
            "{} {} {} {}",
            style(format!("[{}/{}]", event.completed, event.total)).dim(),
            pad_str(&event.platform, PLATFORM_WIDTH, Alignment::Left, Some("..")),
            styled_status(event.status),
            style(format!("({:.1}%)", event.percentage)).dim(),
        );
        let _ = self.term.write_line(&line);
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a check.
pub fn print_header(username: &str, platform_count: usize, config: &CheckConfig) {
    println!(
        "{} {} {}",
        style("handle-check").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "- Checking '{}' on {} platform{}",
            username,
            platform_count,
            if platform_count == 1 { "" } else { "s" }
        ))
        .dim(),
    );
    println!(
        "{}",
        style(format!(
            "Workers: {} | Timeout: {:.1}s | Delay: {}ms",
            config.concurrency,
            config.timeout.as_secs_f64(),
            config.delay.as_millis()
        ))
        .dim()
    );
    println!();
}

// ── Results ──────────────────────────────────────────────────────────────────

fn styled_status(status: Availability) -> console::StyledObject<&'static str> {
    match status {
        Availability::Available => style("AVAILABLE").green().bold(),
        Availability::Taken => style("TAKEN").red().bold(),
        Availability::Unknown => style("UNKNOWN").yellow(),
        Availability::Error => style("ERROR").red().dim(),
    }
}

/// Print results grouped by category. Failed platforms only appear in
/// debug mode. Empty categories are omitted.
pub fn print_results(results: &[ProbeOutcome], debug: bool) {
    let mut by_category: BTreeMap<&str, Vec<&ProbeOutcome>> = BTreeMap::new();
    for result in results {
        if result.status.is_error() && !debug {
            continue;
        }
        by_category.entry(&result.category).or_default().push(result);
    }

    if by_category.is_empty() {
        println!("  {}", style("No results to display").dim());
        return;
    }

    for (category, outcomes) in by_category {
        let title = format!("── {} ({}) ", category.to_uppercase(), outcomes.len());
        println!(
            "  {} {}",
            style(&title).cyan().bold(),
            style("─".repeat(50usize.saturating_sub(title.chars().count()))).dim(),
        );
        for outcome in outcomes {
            print_result_line(outcome, debug);
        }
        println!();
    }
}

fn print_result_line(result: &ProbeOutcome, debug: bool) {
    let padded = pad_str(&result.platform, PLATFORM_WIDTH, Alignment::Left, Some(".."));
    let status = pad_str(
        &styled_status(result.status).to_string(),
        9,
        Alignment::Left,
        None,
    )
    .into_owned();

    println!(
        "    {}  {}  {}  {}",
        style(&padded).white(),
        status,
        style(format!("{:>7}", format_response_time(result.response_time_ms))).dim(),
        style(&result.url).dim(),
    );

    if debug {
        if let Some(error) = &result.error {
            println!("      {} {}", style("└─").dim(), style(error).red().dim());
        } else if let Some(final_url) = &result.final_url {
            println!("      {} redirected to {}", style("└─").dim(), final_url);
        }
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary with colored counts.
pub fn print_summary(summary: &ResultSummary, duration: Duration, debug: bool) {
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );

    let mut parts = vec![
        style(format!("{} available", summary.available))
            .green()
            .to_string(),
        style(format!("{} taken", summary.taken)).red().to_string(),
    ];
    if summary.unknown > 0 {
        parts.push(
            style(format!("{} unknown", summary.unknown))
                .yellow()
                .to_string(),
        );
    }
    if debug && summary.errors > 0 {
        parts.push(style(format!("{} errors", summary.errors)).red().dim().to_string());
    }

    let separator = format!("  {}  ", style("|").dim());
    println!(
        "  {} platform{} in {:.1}s  {}  {}",
        style(summary.total_platforms).bold(),
        if summary.total_platforms == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        parts.join(separator.as_str()),
    );
    println!(
        "  {}",
        style(format!(
            "Availability rate: {:.1}%",
            summary.availability_rate()
        ))
        .dim()
    );
}

/// Print a categorized error summary using colors.
pub fn print_error_summary(error_stats: &ErrorStats) {
    println!();
    println!(
        "  {}",
        style("Some platforms could not be checked:").yellow()
    );
    for line in error_stats.summary_lines() {
        println!("    {} {}", style("•").dim(), line);
    }
}

pub fn print_suggestions(suggestions: &[String]) {
    if suggestions.is_empty() {
        return;
    }
    println!();
    println!("  {}", style("Alternative usernames to try:").cyan().bold());
    for suggestion in suggestions {
        println!("    {} {}", style("•").dim(), suggestion);
    }
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", style("warning:").yellow().bold(), message);
}

pub fn print_saved(path: &str) {
    eprintln!("{} {}", style("Results saved to").dim(), path);
}

// ── Listing commands ─────────────────────────────────────────────────────────

/// Print every category with its platform count.
pub fn print_categories(catalog: &Catalog) {
    let heading = console::Style::new().yellow().bold();
    let name_style = console::Style::new().green().bold();
    let count_style = console::Style::new().cyan();

    println!();
    println!("{}", heading.apply_to("Available Categories:"));
    println!();

    for category in catalog.categories() {
        let count = catalog.select(Some(category.as_str()), None).len();
        println!(
            "  {} {}",
            name_style.apply_to(format!("{:<16}", category)),
            count_style.apply_to(format!("({})", count)),
        );
    }

    println!();
    println!("Use: handle-check <username> --category <category>");
}

/// Print every platform, grouped by category.
pub fn print_platforms(catalog: &Catalog) {
    let heading = console::Style::new().yellow().bold();
    let category_style = console::Style::new().green().bold();

    println!();
    println!(
        "{}",
        heading.apply_to(format!("Supported Platforms ({}):", catalog.len()))
    );

    for category in catalog.categories() {
        let names: Vec<&str> = catalog
            .select(Some(category.as_str()), None)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        println!();
        println!("  {}", category_style.apply_to(&category));
        println!("    {}", names.join(", "));
    }

    println!();
    println!("Use: handle-check <username> --platforms <name,name>");
}
