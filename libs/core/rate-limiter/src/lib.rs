// [libs/core/rate-limiter/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SLIDING WINDOW RATE LIMITER
 * CLASIFICACIÓN: CORE RELIABILITY (ESTRATO L1)
 * RESPONSABILIDAD: ADMISIÓN ACOTADA POR VENTANA DESLIZANTE
 *
 * Tracks timestamps of the last `capacity` admitted calls in a deque.
 * `acquire()` prunes anything older than `window`, then either admits
 * immediately or sleeps until the oldest timestamp falls out of the
 * window. No token bucket, no background refill task — the deque is
 * the whole state machine.
 * =================================================================
 */

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<VecDeque<Instant>>>,
    capacity: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
            window,
        }
    }

    /// Blocks until a slot opens, then records the admission. Safe to
    /// call from multiple tasks concurrently; admission order is not
    /// guaranteed under contention but the window invariant always holds.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut timestamps = self.inner.lock().await;
                let now = Instant::now();
                prune_expired(&mut timestamps, now, self.window);

                if timestamps.len() < self.capacity {
                    timestamps.push_back(now);
                    trace!(in_window = timestamps.len(), capacity = self.capacity, "rate limiter admitted call");
                    return;
                }

                let oldest = *timestamps.front().expect("len >= capacity > 0");
                (oldest + self.window).saturating_duration_since(now)
            };

            debug!(wait_ms = wait.as_millis() as u64, "rate limiter window full, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Non-blocking variant used by callers that would rather back off
    /// themselves than await inline (e.g. to respect an external
    /// cancellation flag between attempts).
    pub async fn try_acquire(&self) -> bool {
        let mut timestamps = self.inner.lock().await;
        let now = Instant::now();
        prune_expired(&mut timestamps, now, self.window);

        if timestamps.len() < self.capacity {
            timestamps.push_back(now);
            true
        } else {
            false
        }
    }

    pub async fn in_flight(&self) -> usize {
        let mut timestamps = self.inner.lock().await;
        let now = Instant::now();
        prune_expired(&mut timestamps, now, self.window);
        timestamps.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

fn prune_expired(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = timestamps.front() {
        if now.saturating_duration_since(*oldest) >= window {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_capacity_without_waiting() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));
        assert!(limiter.try_acquire().await);
        assert!(limiter.try_acquire().await);
        assert!(limiter.try_acquire().await);
        assert!(!limiter.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn window_expiry_frees_a_slot() {
        let limiter = RateLimiter::new(1, Duration::from_millis(100));
        assert!(limiter.try_acquire().await);
        assert!(!limiter.try_acquire().await);

        tokio::time::advance(Duration::from_millis(150)).await;

        assert!(limiter.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_blocks_until_window_slides() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));
        limiter.acquire().await;

        let limiter_clone = limiter.clone();
        let handle = tokio::spawn(async move {
            limiter_clone.acquire().await;
        });

        tokio::time::advance(Duration::from_millis(60)).await;
        handle.await.unwrap();

        assert_eq!(limiter.in_flight().await, 1);
    }
}
