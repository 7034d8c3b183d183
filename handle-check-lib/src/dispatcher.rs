//! Bounded fan-out of platform probes.
//!
//! The dispatcher runs one probe per selected platform with at most
//! `concurrency` in flight, gates every request through the shared
//! [`RateLimiter`], and converts any per-platform failure into an `error`
//! outcome so one broken platform never aborts the session.

use crate::catalog::PlatformDefinition;
use crate::error::HandleCheckError;
use crate::probe::{HttpProber, ProbeRequest, ProbeStrategy};
use crate::progress::SessionProgress;
use crate::rate_limit::RateLimiter;
use crate::types::{elapsed_ms, Availability, CheckConfig, ProbeOutcome};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

pub struct ProbeDispatcher {
    prober: HttpProber,
    limiter: Arc<RateLimiter>,
    concurrency: usize,
}

impl ProbeDispatcher {
    pub fn new(config: &CheckConfig) -> Result<Self, HandleCheckError> {
        Ok(Self {
            prober: HttpProber::new(config)?,
            limiter: Arc::new(RateLimiter::new(config.delay)),
            concurrency: config.concurrency.max(1),
        })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Probe one platform. Never fails: problems become an `error` outcome.
    pub async fn probe_platform(
        &self,
        username: &str,
        platform: &str,
        definition: &PlatformDefinition,
    ) -> ProbeOutcome {
        let request = match ProbeRequest::build(platform, definition, username) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(platform, error = %e, "skipping platform with broken definition");
                return error_outcome(username, platform, definition, e, 0.0);
            }
        };

        self.limiter.wait().await;

        let start = Instant::now();
        let result = self.prober.fetch(platform, &request).await;
        let response_time_ms = elapsed_ms(start.elapsed());

        let response = match result {
            Ok(response) => response,
            Err(e) => return error_outcome(username, platform, definition, e, response_time_ms),
        };

        let status = request.strategy.classify(platform, definition, &response);
        let final_url = match request.strategy {
            ProbeStrategy::Redirect => Some(response.final_url),
            _ => None,
        };

        ProbeOutcome {
            platform: platform.to_string(),
            username: username.to_string(),
            status,
            url: request.profile_url,
            api_url: request.api_url,
            status_code: Some(response.status),
            final_url,
            response_time_ms,
            category: definition.category.clone(),
            error: None,
        }
    }

    /// Probe every target and collect the outcomes in completion order.
    ///
    /// Stops taking new results once `cancel` fires; the returned vector
    /// then holds only the platforms that finished before that point.
    pub async fn run(
        &self,
        username: &str,
        targets: &[(&str, &PlatformDefinition)],
        progress: &SessionProgress,
        cancel: &CancellationToken,
    ) -> Vec<ProbeOutcome> {
        let probes = targets
            .iter()
            .map(|(platform, definition)| self.probe_platform(username, platform, definition));

        let stream = stream::iter(probes)
            .buffer_unordered(self.concurrency)
            .take_until(cancel.cancelled());
        futures_util::pin_mut!(stream);

        let mut outcomes = Vec::with_capacity(targets.len());
        while let Some(outcome) = stream.next().await {
            progress.record(&outcome);
            outcomes.push(outcome);
        }

        outcomes
    }
}

fn error_outcome(
    username: &str,
    platform: &str,
    definition: &PlatformDefinition,
    error: HandleCheckError,
    response_time_ms: f64,
) -> ProbeOutcome {
    ProbeOutcome {
        platform: platform.to_string(),
        username: username.to_string(),
        status: Availability::Error,
        url: definition.profile_url(platform, username).unwrap_or_default(),
        api_url: definition.api_url_for(username),
        status_code: None,
        final_url: None,
        response_time_ms,
        category: definition.category.clone(),
        error: Some(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn dispatcher() -> ProbeDispatcher {
        ProbeDispatcher::new(&CheckConfig::default().with_delay(Duration::ZERO)).unwrap()
    }

    #[tokio::test]
    async fn test_broken_definition_becomes_error_outcome() {
        let dispatcher = dispatcher();
        let definition = PlatformDefinition::default().with_category("developer");

        let outcome = dispatcher.probe_platform("alice", "Broken", &definition).await;
        assert_eq!(outcome.status, Availability::Error);
        assert_eq!(outcome.platform, "Broken");
        assert_eq!(outcome.category, "developer");
        assert_eq!(outcome.url, "");
        assert!(outcome.error.unwrap().contains("url_pattern"));
    }

    #[tokio::test]
    async fn test_api_without_api_url_becomes_error_outcome() {
        let dispatcher = dispatcher();
        let definition =
            PlatformDefinition::new("https://x.test/{username}").with_strategy(ProbeStrategy::Api);

        let outcome = dispatcher.probe_platform("alice", "X", &definition).await;
        assert_eq!(outcome.status, Availability::Error);
        assert_eq!(outcome.url, "https://x.test/alice");
        assert!(outcome.error.unwrap().contains("api_url"));
    }

    #[tokio::test]
    async fn test_cancelled_run_returns_early() {
        let dispatcher = dispatcher();
        let definition = PlatformDefinition::default();
        let targets = vec![("A", &definition), ("B", &definition)];
        let progress = SessionProgress::new(targets.len(), false, None);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcomes = dispatcher.run("alice", &targets, &progress, &cancel).await;
        assert!(outcomes.len() <= targets.len());
        assert_eq!(progress.snapshot().completed, outcomes.len());
    }
}
