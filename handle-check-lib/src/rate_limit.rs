//! Global request spacing shared by every worker of a session.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum gap between consecutive outbound requests.
///
/// Admissions are serialized: a caller holds the lock while it sleeps out
/// the remaining gap, so two admissions are never closer than `delay`
/// no matter how many workers race for it. The lock is never held across
/// the network exchange itself.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait until a request may be sent and return the admission instant.
    ///
    /// With a zero delay this returns immediately. A delay too large to add
    /// to an instant admits the first caller and parks every later one
    /// until it is dropped.
    pub async fn wait(&self) -> Instant {
        if self.delay.is_zero() {
            return Instant::now();
        }

        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            match previous.checked_add(self.delay) {
                Some(ready_at) if ready_at > Instant::now() => {
                    tokio::time::sleep_until(ready_at).await;
                }
                Some(_) => {}
                // Not representable as an instant: no second admission, ever.
                None => std::future::pending::<()>().await,
            }
        }

        let admitted = Instant::now();
        *last = Some(admitted);
        admitted
    }
}
