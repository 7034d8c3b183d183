//! Completion tracking and progress notifications for a running session.

use crate::types::{Availability, ProbeOutcome};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::Level;

/// Notification emitted when one platform finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub platform: String,
    pub status: Availability,
    pub completed: usize,
    pub total: usize,
    /// Share of the session finished so far, 0-100
    pub percentage: f64,
}

/// Receiver for progress notifications.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Forwards events over a channel, for consumers on another thread.
pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
}

impl ProgressSnapshot {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }

    pub fn is_finished(&self) -> bool {
        self.completed >= self.total
    }
}

/// Shared completed counter for one session.
///
/// Each finished platform is recorded exactly once; the counter never
/// passes `total`. Verbose sessions forward every non-error completion to
/// the sink. Errors only go to the log: at debug level normally, at warn
/// level in debug sessions.
pub struct SessionProgress {
    state: Mutex<ProgressSnapshot>,
    verbose: bool,
    failure_level: Level,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl SessionProgress {
    pub fn new(total: usize, verbose: bool, sink: Option<Arc<dyn ProgressSink>>) -> Self {
        Self {
            state: Mutex::new(ProgressSnapshot { completed: 0, total }),
            verbose,
            failure_level: Level::DEBUG,
            sink,
        }
    }

    /// Raise per-platform failures to `warn` so they show without a
    /// debug log filter.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.failure_level = if debug { Level::WARN } else { Level::DEBUG };
        self
    }

    pub fn failure_level(&self) -> Level {
        self.failure_level
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one finished platform and notify the sink.
    pub fn record(&self, outcome: &ProbeOutcome) -> ProgressSnapshot {
        let snapshot = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.completed < state.total {
                state.completed += 1;
            } else {
                tracing::warn!(platform = %outcome.platform, "completion recorded past session total");
            }
            *state
        };

        if outcome.status.is_error() {
            let error = outcome.error.as_deref().unwrap_or("unknown error");
            if self.failure_level == Level::WARN {
                tracing::warn!(platform = %outcome.platform, error, "platform check failed");
            } else {
                tracing::debug!(
                    platform = %outcome.platform,
                    error,
                    completed = snapshot.completed,
                    total = snapshot.total,
                    "platform check failed"
                );
            }
        } else {
            tracing::trace!(
                platform = %outcome.platform,
                status = %outcome.status,
                completed = snapshot.completed,
                total = snapshot.total,
                "platform checked"
            );
            if self.verbose {
                if let Some(sink) = &self.sink {
                    sink.emit(ProgressEvent {
                        platform: outcome.platform.clone(),
                        status: outcome.status,
                        completed: snapshot.completed,
                        total: snapshot.total,
                        percentage: snapshot.percentage(),
                    });
                }
            }
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(platform: &str, status: Availability) -> ProbeOutcome {
        ProbeOutcome {
            platform: platform.to_string(),
            username: "alice".to_string(),
            status,
            url: String::new(),
            api_url: None,
            status_code: None,
            final_url: None,
            response_time_ms: 0.0,
            category: "unknown".to_string(),
            error: None,
        }
    }

    #[test]
    fn test_counter_and_events() {
        let (tx, rx) = std::sync::mpsc::channel();
        let progress = SessionProgress::new(4, true, Some(Arc::new(ChannelProgressSink::new(tx))));

        progress.record(&outcome("A", Availability::Available));
        progress.record(&outcome("B", Availability::Error));
        progress.record(&outcome("C", Availability::Taken));
        let last = progress.record(&outcome("D", Availability::Unknown));

        assert_eq!(last, ProgressSnapshot { completed: 4, total: 4 });
        assert!(last.is_finished());

        let events: Vec<ProgressEvent> = rx.try_iter().collect();
        let names: Vec<&str> = events.iter().map(|e| e.platform.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "D"]);
        assert_eq!(events[0].percentage, 25.0);
        assert_eq!(events[2].percentage, 100.0);
    }

    #[test]
    fn test_quiet_session_emits_nothing() {
        let (tx, rx) = std::sync::mpsc::channel();
        let progress = SessionProgress::new(1, false, Some(Arc::new(ChannelProgressSink::new(tx))));
        progress.record(&outcome("A", Availability::Taken));
        assert_eq!(rx.try_iter().count(), 0);
        assert_eq!(progress.snapshot().completed, 1);
    }

    #[test]
    fn test_debug_session_raises_failure_level() {
        let quiet = SessionProgress::new(1, false, None);
        assert_eq!(quiet.failure_level(), Level::DEBUG);

        let (tx, rx) = std::sync::mpsc::channel();
        let debug = SessionProgress::new(2, true, Some(Arc::new(ChannelProgressSink::new(tx))))
            .with_debug(true);
        assert_eq!(debug.failure_level(), Level::WARN);

        // still counted, still not forwarded to the sink
        debug.record(&outcome("A", Availability::Error));
        assert_eq!(debug.snapshot().completed, 1);
        assert_eq!(rx.try_iter().count(), 0);

        assert_eq!(
            SessionProgress::new(1, false, None).with_debug(false).failure_level(),
            Level::DEBUG
        );
    }

    #[test]
    fn test_counter_never_exceeds_total() {
        let progress = SessionProgress::new(1, false, None);
        progress.record(&outcome("A", Availability::Taken));
        let snapshot = progress.record(&outcome("A", Availability::Taken));
        assert_eq!(snapshot.completed, 1);
    }

    #[test]
    fn test_concurrent_recording() {
        let progress = Arc::new(SessionProgress::new(64, false, None));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let progress = Arc::clone(&progress);
                std::thread::spawn(move || {
                    for j in 0..8 {
                        progress.record(&outcome(&format!("p{}-{}", i, j), Availability::Taken));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(progress.snapshot(), ProgressSnapshot { completed: 64, total: 64 });
    }
}
