//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `HC_*`
//! environment variables, and merging them with proper precedence rules.
//! Command-line flags are layered on top by the CLI.

use crate::error::HandleCheckError;
use crate::types::{CheckConfig, OutputFormat};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Where to load the platform catalog from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogConfig>,

    /// Output formatting preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Per-request timeout (as string, e.g., "500ms", "10s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Worker pool size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Minimum spacing between requests (same format as timeout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CatalogConfig {
    /// Path to a platform catalog JSON file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    /// Default report format: text, csv or json
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl FileConfig {
    /// Overlay the file's defaults on `base`.
    ///
    /// Values were validated when the file was loaded; anything that still
    /// fails to parse is left at the base value.
    pub fn apply(&self, mut base: CheckConfig) -> CheckConfig {
        let Some(defaults) = &self.defaults else {
            return base;
        };

        if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration_string) {
            base.timeout = timeout;
        }
        if let Some(delay) = defaults.delay.as_deref().and_then(parse_duration_string) {
            base.delay = delay;
        }
        if let Some(concurrency) = defaults.concurrency {
            base = base.with_concurrency(concurrency);
        }
        if let Some(verbose) = defaults.verbose {
            base.verbose = verbose;
        }
        if let Some(debug) = defaults.debug {
            base.debug = debug;
        }
        if let Some(user_agent) = &defaults.user_agent {
            base.user_agent = user_agent.clone();
        }
        base
    }

    pub fn catalog_path(&self) -> Option<&str> {
        self.catalog.as_ref().and_then(|c| c.path.as_deref())
    }

    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output
            .as_ref()
            .and_then(|o| o.format.as_deref())
            .and_then(|f| f.parse().ok())
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    local_dir: PathBuf,
    home_dir: Option<PathBuf>,
    xdg_config_dir: Option<PathBuf>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Create a manager that searches the current directory, `$HOME` and
    /// the XDG config directory.
    pub fn new() -> Self {
        let home_dir = env::var_os("HOME").map(PathBuf::from);
        let xdg_config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| home_dir.as_ref().map(|home| home.join(".config")));

        Self {
            local_dir: PathBuf::from("."),
            home_dir,
            xdg_config_dir,
        }
    }

    /// Create a manager with explicit search directories.
    pub fn with_dirs(
        local_dir: PathBuf,
        home_dir: Option<PathBuf>,
        xdg_config_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            local_dir,
            home_dir,
            xdg_config_dir,
        }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, HandleCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(HandleCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            HandleCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            HandleCheckError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        validate_config(&config)?;
        tracing::debug!(path = %path.display(), "loaded configuration file");

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Files found later override earlier ones field by field: XDG, then
    /// the home directory, then the current directory. A file that fails to
    /// parse is an error rather than being skipped.
    pub fn discover_and_load(&self) -> Result<FileConfig, HandleCheckError> {
        let mut merged = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.xdg_config_path(),
            self.global_config_path(),
            self.local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            let config = self.load_file(&path)?;
            merged = merge_configs(merged, config);
            loaded_files.push(path);
        }

        if loaded_files.len() > 1 {
            tracing::info!(
                files = ?loaded_files,
                "multiple config files found, later files take precedence"
            );
        }

        Ok(merged)
    }

    fn local_config_path(&self) -> Option<PathBuf> {
        ["handle-check.toml", ".handle-check.toml"]
            .iter()
            .map(|name| self.local_dir.join(name))
            .find(|path| path.exists())
    }

    fn global_config_path(&self) -> Option<PathBuf> {
        let home = self.home_dir.as_ref()?;
        [".handle-check.toml", "handle-check.toml"]
            .iter()
            .map(|name| home.join(name))
            .find(|path| path.exists())
    }

    fn xdg_config_path(&self) -> Option<PathBuf> {
        let path = self
            .xdg_config_dir
            .as_ref()?
            .join("handle-check")
            .join("config.toml");
        path.exists().then_some(path)
    }
}

/// Merge two configurations; values from `higher` win.
pub fn merge_configs(lower: FileConfig, higher: FileConfig) -> FileConfig {
    FileConfig {
        defaults: match (lower.defaults, higher.defaults) {
            (Some(lower), Some(higher)) => Some(DefaultsConfig {
                timeout: higher.timeout.or(lower.timeout),
                concurrency: higher.concurrency.or(lower.concurrency),
                delay: higher.delay.or(lower.delay),
                verbose: higher.verbose.or(lower.verbose),
                debug: higher.debug.or(lower.debug),
                user_agent: higher.user_agent.or(lower.user_agent),
            }),
            (lower, higher) => higher.or(lower),
        },
        catalog: match (lower.catalog, higher.catalog) {
            (Some(lower), Some(higher)) => Some(CatalogConfig {
                path: higher.path.or(lower.path),
            }),
            (lower, higher) => higher.or(lower),
        },
        output: match (lower.output, higher.output) {
            (Some(lower), Some(higher)) => Some(OutputConfig {
                format: higher.format.or(lower.format),
            }),
            (lower, higher) => higher.or(lower),
        },
    }
}

fn validate_config(config: &FileConfig) -> Result<(), HandleCheckError> {
    if let Some(defaults) = &config.defaults {
        if let Some(concurrency) = defaults.concurrency {
            if concurrency == 0 || concurrency > 100 {
                return Err(HandleCheckError::config(
                    "Concurrency must be between 1 and 100",
                ));
            }
        }

        for (field, value) in [("timeout", &defaults.timeout), ("delay", &defaults.delay)] {
            if let Some(value) = value {
                if parse_duration_string(value).is_none() {
                    return Err(HandleCheckError::config(format!(
                        "Invalid {} format '{}'. Use format like '500ms', '10s', '2m'",
                        field, value
                    )));
                }
            }
        }

        if let Some(user_agent) = &defaults.user_agent {
            if user_agent.trim().is_empty() {
                return Err(HandleCheckError::config("user_agent cannot be empty"));
            }
        }
    }

    if let Some(format) = config.output.as_ref().and_then(|o| o.format.as_deref()) {
        format
            .parse::<OutputFormat>()
            .map_err(HandleCheckError::config)?;
    }

    Ok(())
}

/// Settings taken from `HC_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub timeout: Option<Duration>,
    pub concurrency: Option<usize>,
    pub delay: Option<Duration>,
    pub verbose: Option<bool>,
    pub debug: Option<bool>,
    pub catalog: Option<String>,
    pub format: Option<OutputFormat>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Parse settings through `lookup`, which maps a variable name to its
    /// value. Invalid values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env_config = EnvConfig::default();

        if let Some(val) = lookup("HC_TIMEOUT") {
            env_config.timeout = parse_env(&val, "HC_TIMEOUT", parse_duration_string);
        }

        if let Some(val) = lookup("HC_CONCURRENCY") {
            env_config.concurrency = parse_env(&val, "HC_CONCURRENCY", |v| {
                v.trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|c| (1..=100).contains(c))
            });
        }

        if let Some(val) = lookup("HC_DELAY") {
            env_config.delay = parse_env(&val, "HC_DELAY", parse_duration_string);
        }

        if let Some(val) = lookup("HC_VERBOSE") {
            env_config.verbose = parse_env(&val, "HC_VERBOSE", parse_bool);
        }

        if let Some(val) = lookup("HC_DEBUG") {
            env_config.debug = parse_env(&val, "HC_DEBUG", parse_bool);
        }

        if let Some(val) = lookup("HC_FORMAT") {
            env_config.format = parse_env(&val, "HC_FORMAT", |v| v.parse().ok());
        }

        if let Some(path) = lookup("HC_CATALOG").filter(|p| !p.trim().is_empty()) {
            tracing::debug!(HC_CATALOG = %path, "using environment setting");
            env_config.catalog = Some(path);
        }

        if let Some(path) = lookup("HC_CONFIG").filter(|p| !p.trim().is_empty()) {
            tracing::debug!(HC_CONFIG = %path, "using environment setting");
            env_config.config = Some(path);
        }

        env_config
    }

    /// Overlay the environment settings on `base`.
    pub fn apply(&self, mut base: CheckConfig) -> CheckConfig {
        if let Some(timeout) = self.timeout {
            base.timeout = timeout;
        }
        if let Some(delay) = self.delay {
            base.delay = delay;
        }
        if let Some(concurrency) = self.concurrency {
            base = base.with_concurrency(concurrency);
        }
        if let Some(verbose) = self.verbose {
            base.verbose = verbose;
        }
        if let Some(debug) = self.debug {
            base.debug = debug;
        }
        base
    }
}

/// Load configuration from the process environment.
pub fn load_env_config() -> EnvConfig {
    EnvConfig::from_lookup(|name| env::var(name).ok())
}

fn parse_env<T, F>(value: &str, name: &str, parse: F) -> Option<T>
where
    F: FnOnce(&str) -> Option<T>,
{
    let parsed = parse(value);
    if parsed.is_some() {
        tracing::debug!(variable = name, value, "using environment setting");
    } else {
        tracing::warn!(variable = name, value, "ignoring invalid environment setting");
    }
    parsed
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a duration like "500ms", "10s", "2m" or bare seconds ("0.5").
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    let (number, millis_per_unit) = if let Some(ms) = value.strip_suffix("ms") {
        (ms, 1.0)
    } else if let Some(s) = value.strip_suffix('s') {
        (s, 1_000.0)
    } else if let Some(m) = value.strip_suffix('m') {
        (m, 60_000.0)
    } else {
        (value.as_str(), 1_000.0)
    };

    let amount = number.trim().parse::<f64>().ok()?;
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(amount * millis_per_unit / 1_000.0).ok()
}
