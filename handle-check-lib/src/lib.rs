//! # Handle Check Library
//!
//! A fast, concurrent library for checking whether a username is still
//! available across a catalog of web platforms.
//!
//! Each platform is probed with one HTTP request, interpreted by the
//! platform's strategy (status code, page content, JSON API, redirect
//! target or page title), and reported as `available`, `taken`, `unknown`
//! or `error`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use handle_check_lib::{Catalog, CheckConfig, CheckSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = CheckSession::new(Catalog::builtin()?, CheckConfig::default())?;
//!     let results = session.check_username("alice", None, None).await?;
//!
//!     for result in results {
//!         println!("{}: {}", result.platform, result.status);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Bounded concurrency**: configurable worker pool over all platforms
//! - **Global rate limiting**: minimum spacing between any two requests
//! - **Failure isolation**: a failing platform becomes an `error` result
//! - **Data-driven catalog**: platform definitions loaded from JSON
//! - **Configurable**: TOML config files and `HC_*` environment variables

// Re-export main public API types and functions
// This makes them available as handle_check_lib::TypeName
pub use catalog::{Catalog, PlatformDefinition};
pub use config::{
    load_env_config, parse_duration_string, ConfigManager, EnvConfig, FileConfig,
};
pub use error::HandleCheckError;
pub use probe::{ProbeRequest, ProbeResponse, ProbeStrategy};
pub use progress::{ChannelProgressSink, ProgressEvent, ProgressSink, ProgressSnapshot};
pub use rate_limit::RateLimiter;
pub use session::CheckSession;
pub use types::{
    Availability, CategoryCounts, CheckConfig, OutputFormat, ProbeOutcome, ResultSummary,
    DEFAULT_USER_AGENT,
};
pub use utils::{format_response_time, suggest_username_variations, validate_username};

// Public modules
pub mod catalog;
pub mod probe;

// Internal modules - these are not part of the public API
mod config;
mod dispatcher;
mod error;
mod progress;
mod rate_limit;
mod session;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, HandleCheckError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        author: AUTHOR,
        strategies: ProbeStrategy::ALL.iter().map(ProbeStrategy::name).collect(),
    }
}

/// Information about the library build
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub author: &'static str,
    /// Selector names of the supported probe strategies
    pub strategies: Vec<&'static str>,
}
