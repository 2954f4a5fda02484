use std::time::Duration;
use tokio::time::Instant;

/// Per-worker rate limiting against an absolute schedule.
///
/// Iteration `n + 1` may not start before `began + n * interval`, so time spent inside the
/// scenario is absorbed by the next wait instead of accumulating as drift. A worker that falls
/// behind runs its next iterations back to back until it is on schedule again.
#[derive(Debug)]
pub(crate) struct Pacer {
    interval_nanos: Option<u64>,
    began: Instant,
    completed: u64,
}

impl Pacer {
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval_nanos: interval.map(|interval| interval.as_nanos() as u64),
            began: Instant::now(),
            completed: 0,
        }
    }

    /// Records one finished iteration and returns when the next one is due.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        let interval = self.interval_nanos?;
        self.completed += 1;
        Some(self.began + Duration::from_nanos(interval.saturating_mul(self.completed)))
    }

    /// Waits until the next iteration is due.
    pub async fn wait(&mut self) {
        match self.next_deadline() {
            Some(deadline) if deadline > Instant::now() => {
                tokio::time::sleep_until(deadline).await;
            }
            // Unlimited, or behind schedule: no pacing, but yield so a worker whose scenario
            // never suspends cannot starve the rest of the runtime.
            _ => tokio::task::yield_now().await,
        }
    }
}
