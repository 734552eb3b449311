// File: testing-framework/src/orchestrator/clock.rs
//
// Clock abstraction
//
// Every wait of the harness (watcher polling, pauses between batch chunks)
// goes through a `Clock`, so that tests can run with paused tokio time and
// hit multi-minute deadlines instantly.

use std::future::Future;
use std::pin::Pin;
use tokio::time::{self, Duration, Instant};

/// Time source of the harness
///
/// # Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use tokio::time::Duration;
/// use shardnet_testing_framework::orchestrator::clock::{Clock, PausedClock};
///
/// #[tokio::test(start_paused = true)]
/// async fn test_deadline() {
///     let clock = Arc::new(PausedClock::new());
///     let deadline = clock.deadline(Duration::from_secs(300));
///     clock.advance(Duration::from_secs(301)).await;
///     assert!(clock.is_past(deadline));
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Current instant (simulated under `PausedClock`)
    fn now(&self) -> Instant;

    /// Sleep for the given duration
    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Instant `budget` from now
    fn deadline(&self, budget: Duration) -> Instant {
        self.now() + budget
    }

    fn is_past(&self, deadline: Instant) -> bool {
        self.now() >= deadline
    }
}

/// Real tokio time, used against live networks
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        time::Instant::now()
    }

    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(time::sleep(d))
    }
}

/// Paused tokio time
///
/// # Important Notes
///
/// 1. Use `#[tokio::test(start_paused = true)]`, or let `new()` pause time
/// 2. With time paused, the runtime jumps to the next timer as soon as every
///    task is idle, so a watcher polling every second costs no real time
/// 3. `advance()` moves time explicitly
pub struct PausedClock;

impl PausedClock {
    /// Creates a new PausedClock and pauses tokio time
    pub fn new() -> Self {
        time::pause();
        Self
    }

    pub async fn advance(&self, d: Duration) {
        time::advance(d).await
    }
}

impl Clock for PausedClock {
    fn now(&self) -> Instant {
        time::Instant::now()
    }

    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(time::sleep(d))
    }
}

impl Default for PausedClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_paused_clock_advancement() {
        let clock = Arc::new(PausedClock::new());
        let start = clock.now();

        clock.advance(Duration::from_secs(1)).await;
        assert_eq!(clock.now() - start, Duration::from_secs(1));

        clock.advance(Duration::from_secs(2)).await;
        assert_eq!(clock.now() - start, Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_reached_by_sleeping() {
        let clock: Arc<dyn Clock> = Arc::new(PausedClock);
        let deadline = clock.deadline(Duration::from_secs(300));
        assert!(!clock.is_past(deadline));

        // Auto-advance: completes immediately in real time
        clock.sleep(Duration::from_secs(300)).await;
        assert!(clock.is_past(deadline));
    }

    #[tokio::test]
    async fn test_system_clock() {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let start = clock.now();

        clock.sleep(Duration::from_millis(10)).await;

        assert!(clock.now() - start >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_paused_clock_sleep_expires_correctly() {
        let clock = Arc::new(PausedClock::new());

        let sleep_duration = Duration::from_secs(5);
        let clock_clone = clock.clone();

        let sleep_task = tokio::spawn(async move {
            clock_clone.sleep(sleep_duration).await;
            42
        });

        // Give task time to register
        tokio::time::sleep(Duration::from_millis(1)).await;

        clock.advance(sleep_duration + Duration::from_secs(1)).await;

        assert_eq!(sleep_task.await.unwrap(), 42);
    }
}
