use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Fixed-interval limiter shared by every worker of a run.
///
/// Successive `acquire` calls return at least `interval` apart. The lock
/// only guards slot bookkeeping; waiting happens after it is released.
pub struct Pacer {
    name: &'static str,
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn from_millis(name: &'static str, millis: u64) -> Self {
        Self::new(name, Duration::from_millis(millis))
    }

    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }

        let wait_until = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(slot) if slot > now => slot,
                _ => now,
            };
            *next_slot = Some(slot + self.interval);
            slot
        };

        let now = Instant::now();
        if wait_until > now {
            debug!("Pacing {}: waiting {:?}", self.name, wait_until - now);
            tokio::time::sleep_until(wait_until).await;
        }
    }
}
