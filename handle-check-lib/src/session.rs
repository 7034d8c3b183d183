//! Check session: the entry point that ties catalog, dispatcher and
//! progress tracking together.

use crate::catalog::Catalog;
use crate::dispatcher::ProbeDispatcher;
use crate::error::HandleCheckError;
use crate::progress::{ProgressSink, SessionProgress};
use crate::types::{CheckConfig, ProbeOutcome};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Orchestrates one or more username checks against a platform catalog.
///
/// A session owns the HTTP client, the global rate limiter and the
/// cancellation token; every `check_username` call runs its probes through
/// the same limiter.
///
/// # Example
///
/// ```rust,no_run
/// use handle_check_lib::{Catalog, CheckConfig, CheckSession};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let session = CheckSession::new(Catalog::builtin()?, CheckConfig::default())?;
///     let results = session.check_username("alice", Some("developer"), None).await?;
///     for result in results {
///         println!("{}: {}", result.platform, result.status);
///     }
///     Ok(())
/// }
/// ```
pub struct CheckSession {
    catalog: Catalog,
    config: CheckConfig,
    dispatcher: ProbeDispatcher,
    progress_sink: Option<Arc<dyn ProgressSink>>,
    cancel: CancellationToken,
}

impl CheckSession {
    /// Create a session over an already-loaded catalog.
    pub fn new(catalog: Catalog, config: CheckConfig) -> Result<Self, HandleCheckError> {
        let dispatcher = ProbeDispatcher::new(&config)?;
        Ok(Self {
            catalog,
            config,
            dispatcher,
            progress_sink: None,
            cancel: CancellationToken::new(),
        })
    }

    /// Receive a notification per completed platform (verbose sessions only).
    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress_sink = Some(sink);
        self
    }

    /// Token that interrupts running checks when cancelled.
    ///
    /// Cancelling it makes the current and every later `check_username`
    /// call return [`HandleCheckError::Interrupted`].
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Check `username` against the selected platforms.
    ///
    /// `category` and `platforms` filter the catalog case-insensitively and
    /// combine as an intersection; with neither, every platform is checked.
    /// Results are sorted by platform name, ignoring case, and contain
    /// exactly one outcome per selected platform.
    ///
    /// # Errors
    ///
    /// Returns `HandleCheckError` if:
    /// - The filters select no platform (`EmptySelection`)
    /// - The session is cancelled before every platform finished (`Interrupted`)
    ///
    /// Failures of individual platforms never surface here; they come back
    /// as outcomes with status `error`.
    pub async fn check_username(
        &self,
        username: &str,
        category: Option<&str>,
        platforms: Option<&[String]>,
    ) -> Result<Vec<ProbeOutcome>, HandleCheckError> {
        let targets = self.catalog.select(category, platforms);
        if targets.is_empty() {
            return Err(HandleCheckError::EmptySelection {
                category: category.map(str::to_string),
                platforms: platforms.map(<[String]>::to_vec),
            });
        }

        let total = targets.len();
        tracing::info!(
            username,
            platforms = total,
            concurrency = self.dispatcher.concurrency(),
            "starting username check"
        );

        let progress = SessionProgress::new(total, self.config.verbose, self.progress_sink.clone())
            .with_debug(self.config.debug);
        let started = Instant::now();
        let mut outcomes = self
            .dispatcher
            .run(username, &targets, &progress, &self.cancel)
            .await;

        if outcomes.len() < total {
            tracing::warn!(completed = outcomes.len(), total, "username check interrupted");
            return Err(HandleCheckError::Interrupted {
                completed: outcomes.len(),
                total,
            });
        }

        outcomes.sort_by_cached_key(|outcome| outcome.platform.to_lowercase());

        tracing::info!(
            username,
            platforms = total,
            elapsed = ?started.elapsed(),
            "username check finished"
        );
        Ok(outcomes)
    }

    /// Distinct categories in the full catalog, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.catalog.categories()
    }

    /// All platform names in the full catalog, sorted.
    pub fn platform_names(&self) -> Vec<String> {
        self.catalog.platform_names()
    }
}
