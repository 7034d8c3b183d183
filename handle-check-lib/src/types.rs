//! Core data types for username availability checking.
//!
//! This module defines the result record produced for every probed platform,
//! the session configuration, and the aggregate summary used by reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Desktop browser User-Agent sent with every probe. Several platforms
/// serve a bare error page to unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Verdict for one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    /// The handle does not appear to exist on the platform
    Available,
    /// The handle is claimed
    Taken,
    /// The platform answered but the answer was inconclusive
    Unknown,
    /// The probe itself failed (timeout, connection error, broken definition)
    Error,
}

impl Availability {
    /// All four values, in display order.
    pub const ALL: [Availability; 4] = [
        Availability::Available,
        Availability::Taken,
        Availability::Unknown,
        Availability::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Taken => "taken",
            Availability::Unknown => "unknown",
            Availability::Error => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Availability::Error)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of probing one platform for one username.
///
/// Outcomes are built once by a worker and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Catalog key of the platform
    pub platform: String,

    /// The username that was checked
    pub username: String,

    /// Availability verdict
    pub status: Availability,

    /// Human-facing profile URL (always rendered from the profile template)
    pub url: String,

    /// API endpoint used for the check, for API-backed platforms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// HTTP status of the exchange, absent when no response was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// URL after following redirects (redirect probes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,

    /// Wall-clock duration of the exchange in milliseconds, two decimals
    #[serde(rename = "response_time")]
    pub response_time_ms: f64,

    /// Category tag copied from the platform definition
    pub category: String,

    /// Failure description for `error` outcomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Convert an elapsed duration to milliseconds rounded to two decimals.
pub(crate) fn elapsed_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100_000.0).round() / 100.0
}

/// Configuration options for a check session.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    /// Timeout for each platform exchange.
    /// Default: 10 seconds
    pub timeout: Duration,

    /// Maximum number of platforms probed at the same time.
    /// Default: 50, Range: 1-100
    pub concurrency: usize,

    /// Minimum spacing between two requests, across all workers.
    /// Default: 100ms, zero disables throttling
    pub delay: Duration,

    /// Emit a progress notification as each platform completes
    pub verbose: bool,

    /// Log per-platform failures at warn instead of debug level; the CLI
    /// also lists failed platforms when set
    pub debug: bool,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            concurrency: 50,
            delay: Duration::from_millis(100),
            verbose: false,
            debug: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CheckConfig {
    /// Set the worker pool size.
    ///
    /// Clamped to 1-100 to prevent resource exhaustion.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the minimum delay between requests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Enable or disable progress notifications.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable or disable debug diagnostics.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Override the User-Agent header.
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Report format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text grouped by category
    #[default]
    Text,
    /// Comma separated values, one row per platform
    Csv,
    /// Pretty-printed JSON document with summary
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "Unknown output format '{}', expected text, csv or json",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Per-category breakdown of verdicts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub available: usize,
    pub taken: usize,
    pub error: usize,
    pub unknown: usize,
}

impl CategoryCounts {
    fn record(&mut self, status: Availability) {
        match status {
            Availability::Available => self.available += 1,
            Availability::Taken => self.taken += 1,
            Availability::Unknown => self.unknown += 1,
            Availability::Error => self.error += 1,
        }
    }
}

/// Aggregate statistics over a result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total_platforms: usize,
    pub available: usize,
    pub taken: usize,
    pub errors: usize,
    pub unknown: usize,
    pub categories: BTreeMap<String, CategoryCounts>,
}

impl ResultSummary {
    /// Count verdicts overall and per category.
    pub fn from_outcomes(outcomes: &[ProbeOutcome]) -> Self {
        let mut summary = ResultSummary {
            total_platforms: outcomes.len(),
            ..Default::default()
        };

        for outcome in outcomes {
            match outcome.status {
                Availability::Available => summary.available += 1,
                Availability::Taken => summary.taken += 1,
                Availability::Unknown => summary.unknown += 1,
                Availability::Error => summary.errors += 1,
            }
            summary
                .categories
                .entry(outcome.category.clone())
                .or_default()
                .record(outcome.status);
        }

        summary
    }

    /// Share of available platforms, in percent of all results.
    pub fn availability_rate(&self) -> f64 {
        if self.total_platforms == 0 {
            0.0
        } else {
            self.available as f64 / self.total_platforms as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(platform: &str, category: &str, status: Availability) -> ProbeOutcome {
        ProbeOutcome {
            platform: platform.to_string(),
            username: "alice".to_string(),
            status,
            url: format!("https://{}.test/alice", platform),
            api_url: None,
            status_code: None,
            final_url: None,
            response_time_ms: 0.0,
            category: category.to_string(),
            error: None,
        }
    }

    #[test]
    fn test_default_config() {
        let config = CheckConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.concurrency, 50);
        assert_eq!(config.delay, Duration::from_millis(100));
        assert!(!config.verbose);
        assert!(!config.debug);
    }

    #[test]
    fn test_concurrency_is_clamped() {
        assert_eq!(CheckConfig::default().with_concurrency(0).concurrency, 1);
        assert_eq!(CheckConfig::default().with_concurrency(500).concurrency, 100);
        assert_eq!(CheckConfig::default().with_concurrency(5).concurrency, 5);
    }

    #[test]
    fn test_elapsed_ms_rounds_to_two_decimals() {
        assert_eq!(elapsed_ms(Duration::from_micros(12_346)), 12.35);
        assert_eq!(elapsed_ms(Duration::from_millis(250)), 250.0);
        assert_eq!(elapsed_ms(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_availability_serializes_lowercase() {
        let json = serde_json::to_string(&Availability::Available).unwrap();
        assert_eq!(json, "\"available\"");
        let parsed: Availability = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, Availability::Error);
    }

    #[test]
    fn test_outcome_field_names() {
        let mut o = outcome("GitHub", "developer", Availability::Taken);
        o.status_code = Some(200);
        let value = serde_json::to_value(&o).unwrap();
        assert_eq!(value["status"], "taken");
        assert_eq!(value["status_code"], 200);
        assert!(value.get("response_time").is_some());
        assert!(value.get("api_url").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!(" CSV ".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_summary_counts() {
        let outcomes = vec![
            outcome("GitHub", "developer", Availability::Taken),
            outcome("GitLab", "developer", Availability::Available),
            outcome("Steam", "gaming", Availability::Error),
            outcome("Twitch", "gaming", Availability::Unknown),
        ];

        let summary = ResultSummary::from_outcomes(&outcomes);
        assert_eq!(summary.total_platforms, 4);
        assert_eq!(summary.available, 1);
        assert_eq!(summary.taken, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.unknown, 1);
        assert_eq!(summary.availability_rate(), 25.0);

        let gaming = &summary.categories["gaming"];
        assert_eq!(gaming.error, 1);
        assert_eq!(gaming.unknown, 1);
        assert_eq!(gaming.taken, 0);
    }

    #[test]
    fn test_empty_summary_rate() {
        assert_eq!(ResultSummary::from_outcomes(&[]).availability_rate(), 0.0);
    }
}
