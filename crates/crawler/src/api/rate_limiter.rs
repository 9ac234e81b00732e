//! Request pacing shared by all fetch workers.
//!
//! Reservation-based minimum-interval limiter: each acquire claims the next
//! free slot and sleeps until it. The lock is only held to compute the slot,
//! never across the sleep.

use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Rate limiter enforcing a maximum request rate across tasks
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum spacing between requests; zero disables pacing
    min_interval: Duration,
    /// Start of the next free slot
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter allowing `max_per_second` requests
    pub fn new(max_per_second: f64) -> Self {
        let min_interval = if max_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / max_per_second)
        } else {
            Duration::ZERO
        };

        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait until a request can be made
    pub async fn acquire(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        let wait = {
            let mut next_slot = self.next_slot.lock().unwrap();
            let now = Instant::now();
            let slot = match *next_slot {
                Some(at) if at > now => at,
                _ => now,
            };
            *next_slot = Some(slot + self.min_interval);
            slot.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            tracing::trace!(wait_ms = wait.as_millis() as u64, "Pacing request");
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sequential_acquires_are_spaced() {
        let limiter = RateLimiter::new(20.0); // 50ms interval

        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }

        // Three requests need at least two intervals
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn test_concurrent_acquires_share_the_budget() {
        let limiter = Arc::new(RateLimiter::new(20.0));

        let start = Instant::now();
        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn test_zero_rate_disables_pacing() {
        let limiter = RateLimiter::new(0.0);

        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }

        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
