//! Handle Check CLI Application
//!
//! A command-line interface for checking whether a username is still free
//! across a catalog of web platforms. This application provides a
//! user-friendly interface to the handle-check-lib library.

mod output;
mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use handle_check_lib::{
    load_env_config, suggest_username_variations, validate_username, Availability, Catalog,
    CheckConfig, CheckSession, ConfigManager, EnvConfig, FileConfig, HandleCheckError,
    OutputFormat, ProbeOutcome, ResultSummary,
};
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Exit status used when the user interrupts a running check.
const EXIT_INTERRUPTED: i32 = 130;

/// CLI arguments for handle-check
#[derive(Parser, Debug)]
#[command(name = "handle-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Check username availability across web platforms")]
#[command(
    long_about = "Check whether a username is still available across social, developer, gaming and other web platforms.\n\nPlatforms are probed concurrently with a global rate limit, and results can be written as text, CSV or JSON."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Username to check
    #[arg(value_name = "USERNAME", help_heading = "Platform Selection")]
    pub username: Option<String>,

    /// Only check platforms in this category (use --list-categories to see all)
    #[arg(
        short = 'c',
        long = "category",
        value_name = "CATEGORY",
        help_heading = "Platform Selection"
    )]
    pub category: Option<String>,

    /// Only check these platforms (comma-separated or multiple -p flags)
    #[arg(short = 'p', long = "platforms", value_name = "PLATFORM", value_delimiter = ',', action = clap::ArgAction::Append, help_heading = "Platform Selection")]
    pub platforms: Option<Vec<String>>,

    /// List all platform categories and exit
    #[arg(long = "list-categories", help_heading = "Platform Selection")]
    pub list_categories: bool,

    /// List all supported platforms and exit
    #[arg(long = "list-platforms", help_heading = "Platform Selection")]
    pub list_platforms: bool,

    /// Use a platform catalog file instead of the built-in one
    #[arg(long = "catalog", value_name = "FILE", help_heading = "Platform Selection")]
    pub catalog: Option<String>,

    /// Only show platforms where the username is available
    #[arg(
        short = 'a',
        long = "available-only",
        conflicts_with = "taken_only",
        help_heading = "Output Format"
    )]
    pub available_only: bool,

    /// Only show platforms where the username is taken
    #[arg(short = 't', long = "taken-only", help_heading = "Output Format")]
    pub taken_only: bool,

    /// Output format: text, csv or json
    #[arg(
        short = 'f',
        long = "format",
        value_name = "FORMAT",
        help_heading = "Output Format"
    )]
    pub format: Option<OutputFormat>,

    /// Also write the results to this file
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output Format"
    )]
    pub output: Option<String>,

    /// Disable colored output
    #[arg(long = "no-color", help_heading = "Output Format")]
    pub no_color: bool,

    /// Suggest alternative usernames when the username is taken
    #[arg(long = "suggest-alternatives", help_heading = "Output Format")]
    pub suggest_alternatives: bool,

    /// Request timeout in seconds (default: 10)
    #[arg(long = "timeout", value_name = "SECS", help_heading = "Performance")]
    pub timeout: Option<f64>,

    /// Max concurrent platform checks (default: 50, max: 100)
    #[arg(
        short = 'w',
        long = "max-workers",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub max_workers: Option<usize>,

    /// Minimum delay between requests in seconds (default: 0.1)
    #[arg(long = "delay", value_name = "SECS", help_heading = "Performance")]
    pub delay: Option<f64>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show failed platforms and detailed error messages
    #[arg(long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Show progress as each platform completes
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Error statistics for aggregated reporting
#[derive(Debug, Default)]
pub(crate) struct ErrorStats {
    pub(crate) timeouts: Vec<String>,
    pub(crate) network_errors: Vec<String>,
    pub(crate) other_errors: Vec<String>,
}

impl ErrorStats {
    fn from_outcomes(outcomes: &[ProbeOutcome]) -> Self {
        let mut stats = Self::default();
        for outcome in outcomes.iter().filter(|o| o.status.is_error()) {
            stats.add_error(&outcome.platform, outcome.error.as_deref().unwrap_or_default());
        }
        stats
    }

    fn add_error(&mut self, platform: &str, message: &str) {
        let msg_lower = message.to_lowercase();

        if msg_lower.contains("timeout") || msg_lower.contains("timed out") {
            self.timeouts.push(platform.to_string());
        } else if msg_lower.contains("network")
            || msg_lower.contains("connect")
            || msg_lower.contains("dns")
        {
            self.network_errors.push(platform.to_string());
        } else {
            self.other_errors.push(platform.to_string());
        }
    }

    pub(crate) fn has_errors(&self) -> bool {
        !self.timeouts.is_empty() || !self.network_errors.is_empty() || !self.other_errors.is_empty()
    }

    /// Plain-text summary lines, one per error kind.
    pub(crate) fn summary_lines(&self) -> Vec<String> {
        let format_list = |platforms: &[String], max_show: usize| -> String {
            if platforms.len() <= max_show {
                platforms.join(", ")
            } else {
                let remaining = platforms.len() - max_show;
                format!("{}, ... and {} more", platforms[..max_show].join(", "), remaining)
            }
        };

        [
            ("timeouts", &self.timeouts),
            ("network errors", &self.network_errors),
            ("other errors", &self.other_errors),
        ]
        .into_iter()
        .filter(|(_, platforms)| !platforms.is_empty())
        .map(|(label, platforms)| {
            format!("{} {}: {}", platforms.len(), label, format_list(platforms, 5))
        })
        .collect()
    }
}

/// Settings resolved from defaults, config files, environment and flags.
#[derive(Debug)]
struct RunSettings {
    config: CheckConfig,
    catalog_path: Option<String>,
    format: OutputFormat,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_tracing(args.debug);

    if args.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    if let Err(e) = run(args).await {
        if let Some(HandleCheckError::Interrupted { .. }) = e.downcast_ref::<HandleCheckError>() {
            eprintln!("\n{}", e);
            process::exit(EXIT_INTERRUPTED);
        }
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Logs go to stderr so stdout stays clean for reports.
fn init_tracing(debug: bool) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    // Listing commands are self-contained
    if args.list_categories || args.list_platforms {
        return Ok(());
    }

    if args.username.is_none() {
        return Err(
            "You must specify a username, or use --list-categories / --list-platforms".to_string(),
        );
    }

    if let Some(timeout) = args.timeout {
        match seconds_to_duration(timeout) {
            Some(duration) if !duration.is_zero() => {}
            _ => return Err("Timeout must be a positive number of seconds".to_string()),
        }
    }

    if let Some(workers) = args.max_workers {
        if workers == 0 || workers > 100 {
            return Err("Max workers must be between 1 and 100".to_string());
        }
    }

    if let Some(delay) = args.delay {
        if seconds_to_duration(delay).is_none() {
            return Err("Delay must be zero or a positive number of seconds".to_string());
        }
    }

    if let Some(platforms) = &args.platforms {
        if platforms.iter().all(|p| p.trim().is_empty()) {
            return Err("--platforms needs at least one platform name".to_string());
        }
    }

    Ok(())
}

/// Convert a seconds flag to a `Duration`; `None` when negative, not a
/// number, or too large to represent.
fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(seconds).ok()
}

/// Main username checking logic
async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let listing = args.list_categories || args.list_platforms;

    // Reject bad usernames before touching config, catalog or network
    let mut warnings = Vec::new();
    if !listing {
        if let Some(username) = &args.username {
            warnings = validate_username(username)?;
        }
    }

    let settings = build_settings(&args)?;
    let catalog = load_catalog(settings.catalog_path.as_deref())?;

    if args.list_categories {
        ui::print_categories(&catalog);
        return Ok(());
    }
    if args.list_platforms {
        ui::print_platforms(&catalog);
        return Ok(());
    }

    let username = args
        .username
        .as_deref()
        .ok_or("You must specify a username")?;
    let text_mode = settings.format == OutputFormat::Text;

    for warning in &warnings {
        ui::print_warning(warning);
    }

    let debug = settings.config.debug;
    let verbose = settings.config.verbose;
    let mut session = CheckSession::new(catalog, settings.config)?;
    if verbose {
        session = session.with_progress_sink(Arc::new(ui::ConsoleProgress::new()));
    }

    // Ctrl-C cancels the running session
    let cancel = session.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    if text_mode {
        let selected = session
            .catalog()
            .select(args.category.as_deref(), args.platforms.as_deref())
            .len();
        ui::print_header(username, selected, session.config());
    }

    let started = Instant::now();
    let results = session
        .check_username(username, args.category.as_deref(), args.platforms.as_deref())
        .await?;
    let duration = started.elapsed();

    let summary = ResultSummary::from_outcomes(&results);
    let shown = filter_results(&results, &args);

    display_results(&shown, &summary, settings.format, debug, duration)?;

    if debug && text_mode {
        let error_stats = ErrorStats::from_outcomes(&results);
        if error_stats.has_errors() {
            ui::print_error_summary(&error_stats);
        }
    }

    if args.suggest_alternatives && text_mode && summary.taken > 0 {
        ui::print_suggestions(&suggest_username_variations(username));
    }

    if let Some(path) = &args.output {
        let report = output::ReportContext {
            username,
            results: &shown,
            summary: &summary,
            debug,
        };
        output::save_to_file(path, settings.format, &report)?;
        ui::print_saved(path);
    }

    Ok(())
}

/// Resolve settings with precedence CLI > environment > config file > defaults.
fn build_settings(args: &Args) -> Result<RunSettings, Box<dyn std::error::Error>> {
    let env_config = load_env_config();
    let file_config = load_file_config(args, &env_config)?;

    let mut config = file_config.apply(CheckConfig::default());
    config = env_config.apply(config);
    config = apply_cli_args_to_config(config, args);

    let catalog_path = args
        .catalog
        .clone()
        .or_else(|| env_config.catalog.clone())
        .or_else(|| file_config.catalog_path().map(str::to_string));

    let format = args
        .format
        .or(env_config.format)
        .or_else(|| file_config.output_format())
        .unwrap_or_default();

    Ok(RunSettings {
        config,
        catalog_path,
        format,
    })
}

/// Load the explicit config file (`--config` or `HC_CONFIG`), or discover one.
fn load_file_config(
    args: &Args,
    env_config: &EnvConfig,
) -> Result<FileConfig, Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new();

    let explicit = args.config.as_ref().or(env_config.config.as_ref());
    match explicit {
        Some(path) => {
            tracing::debug!(path = %path, "using explicit config file");
            let file_config = config_manager
                .load_file(path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?;
            Ok(file_config)
        }
        None => Ok(config_manager.discover_and_load()?),
    }
}

/// Apply CLI arguments to config (highest precedence).
///
/// Only flags the user actually passed override earlier layers.
fn apply_cli_args_to_config(mut config: CheckConfig, args: &Args) -> CheckConfig {
    if let Some(timeout) = args.timeout.and_then(seconds_to_duration) {
        config = config.with_timeout(timeout);
    }
    if let Some(workers) = args.max_workers {
        config = config.with_concurrency(workers);
    }
    if let Some(delay) = args.delay.and_then(seconds_to_duration) {
        config = config.with_delay(delay);
    }
    if args.verbose {
        config.verbose = true;
    }
    if args.debug {
        config.debug = true;
    }
    config
}

fn load_catalog(path: Option<&str>) -> Result<Catalog, HandleCheckError> {
    match path {
        Some(path) => {
            tracing::debug!(path, "loading platform catalog");
            Catalog::load_file(path)
        }
        None => Catalog::builtin(),
    }
}

/// Apply `--available-only` / `--taken-only`.
fn filter_results(results: &[ProbeOutcome], args: &Args) -> Vec<ProbeOutcome> {
    let wanted = if args.available_only {
        Some(Availability::Available)
    } else if args.taken_only {
        Some(Availability::Taken)
    } else {
        None
    };

    results
        .iter()
        .filter(|outcome| wanted.map_or(true, |status| outcome.status == status))
        .cloned()
        .collect()
}

fn display_results(
    results: &[ProbeOutcome],
    summary: &ResultSummary,
    format: OutputFormat,
    debug: bool,
    duration: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", output::render_json(results, summary)?);
        }
        OutputFormat::Csv => {
            print!("{}", output::render_csv(results));
        }
        OutputFormat::Text => {
            ui::print_results(results, debug);
            println!();
            ui::print_summary(summary, duration, debug);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("handle-check").chain(args.iter().copied()))
            .unwrap()
    }

    fn outcome(platform: &str, status: Availability, error: Option<&str>) -> ProbeOutcome {
        ProbeOutcome {
            platform: platform.to_string(),
            username: "alice".to_string(),
            status,
            url: format!("https://{}.test/alice", platform.to_lowercase()),
            api_url: None,
            status_code: None,
            final_url: None,
            response_time_ms: 12.5,
            category: "social".to_string(),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_args_requires_username() {
        assert!(validate_args(&parse(&[])).is_err());
        assert!(validate_args(&parse(&["alice"])).is_ok());
        assert!(validate_args(&parse(&["--list-categories"])).is_ok());
        assert!(validate_args(&parse(&["--list-platforms"])).is_ok());
    }

    #[test]
    fn test_validate_args_ranges() {
        assert!(validate_args(&parse(&["alice", "-w", "0"])).is_err());
        assert!(validate_args(&parse(&["alice", "-w", "101"])).is_err());
        assert!(validate_args(&parse(&["alice", "-w", "100"])).is_ok());
        assert!(validate_args(&parse(&["alice", "--timeout", "0"])).is_err());
        assert!(validate_args(&parse(&["alice", "--timeout", "2.5"])).is_ok());
        assert!(validate_args(&parse(&["alice", "--delay", "-1"])).is_err());
        assert!(validate_args(&parse(&["alice", "--delay", "0"])).is_ok());
    }

    #[test]
    fn test_unrepresentable_durations_rejected() {
        let err = validate_args(&parse(&["alice", "--delay", "1e20"])).unwrap_err();
        assert!(err.contains("Delay"));
        let err = validate_args(&parse(&["alice", "--timeout", "1e20"])).unwrap_err();
        assert!(err.contains("Timeout"));
        assert!(validate_args(&parse(&["alice", "--timeout", "NaN"])).is_err());
        assert!(validate_args(&parse(&["alice", "--timeout", "1e-12"])).is_err());

        // Never panics even when validation is skipped
        let config = apply_cli_args_to_config(
            CheckConfig::default(),
            &parse(&["alice", "--delay", "1e20", "--timeout", "inf"]),
        );
        assert_eq!(config, CheckConfig::default());
    }

    #[test]
    fn test_conflicting_filters_rejected_by_parser() {
        let result = Args::try_parse_from(["handle-check", "alice", "-a", "-t"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_platforms_accept_commas_and_repeats() {
        let args = parse(&["alice", "-p", "GitHub,GitLab", "-p", "Steam"]);
        assert_eq!(
            args.platforms,
            Some(vec![
                "GitHub".to_string(),
                "GitLab".to_string(),
                "Steam".to_string()
            ])
        );
    }

    #[test]
    fn test_format_flag_parses() {
        assert_eq!(parse(&["alice", "-f", "json"]).format, Some(OutputFormat::Json));
        assert!(Args::try_parse_from(["handle-check", "alice", "-f", "xml"]).is_err());
    }

    #[test]
    fn test_cli_args_override_config() {
        let base = CheckConfig::default().with_concurrency(20).with_debug(false);
        let args = parse(&["alice", "-w", "5", "--timeout", "2.5", "--delay", "0", "--debug"]);
        let config = apply_cli_args_to_config(base, &args);

        assert_eq!(config.concurrency, 5);
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.delay, Duration::ZERO);
        assert!(config.debug);
        assert!(!config.verbose);
    }

    #[test]
    fn test_cli_args_keep_lower_layers_when_absent() {
        let base = CheckConfig::default()
            .with_concurrency(7)
            .with_verbose(true);
        let config = apply_cli_args_to_config(base.clone(), &parse(&["alice"]));
        assert_eq!(config, base);
    }

    #[test]
    fn test_filter_results() {
        let results = vec![
            outcome("GitHub", Availability::Taken, None),
            outcome("GitLab", Availability::Available, None),
            outcome("Steam", Availability::Error, Some("Connection failed")),
        ];

        let available = filter_results(&results, &parse(&["alice", "-a"]));
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].platform, "GitLab");

        let taken = filter_results(&results, &parse(&["alice", "-t"]));
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].platform, "GitHub");

        assert_eq!(filter_results(&results, &parse(&["alice"])).len(), 3);
    }

    #[test]
    fn test_error_stats_categorization() {
        let results = vec![
            outcome(
                "GitHub",
                Availability::Error,
                Some("Timeout after 10s during: GET https://github.test/alice"),
            ),
            outcome(
                "GitLab",
                Availability::Error,
                Some("Network error: Connection failed"),
            ),
            outcome("Steam", Availability::Error, Some("Configuration error: bad method")),
            outcome("Twitch", Availability::Taken, None),
        ];

        let stats = ErrorStats::from_outcomes(&results);
        assert!(stats.has_errors());
        assert_eq!(stats.timeouts, vec!["GitHub"]);
        assert_eq!(stats.network_errors, vec!["GitLab"]);
        assert_eq!(stats.other_errors, vec!["Steam"]);
        assert_eq!(stats.summary_lines().len(), 3);
    }

    #[test]
    fn test_error_stats_truncates_long_lists() {
        let mut stats = ErrorStats::default();
        for i in 0..7 {
            stats.add_error(&format!("P{}", i), "timed out");
        }
        let lines = stats.summary_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("7 timeouts: P0, P1, P2, P3, P4"));
        assert!(lines[0].ends_with("... and 2 more"));
    }

    #[test]
    fn test_error_stats_empty() {
        let stats = ErrorStats::from_outcomes(&[outcome("GitHub", Availability::Taken, None)]);
        assert!(!stats.has_errors());
        assert!(stats.summary_lines().is_empty());
    }
}
