//! Dispatch rate limiting for quota-sensitive remote calls.
//!
//! The Drive artifact calls (create, delete) share a per-user quota, and the
//! export pipeline fans out across every tab of every document at once. The
//! [`RateLimiter`] serialises *dispatch* so that across all concurrent
//! callers no two scheduled operations start less than the configured
//! interval apart. It deliberately does not bound how many operations are in
//! flight: a slow upload never delays the next caller's slot, only the slot
//! spacing is enforced.
//!
//! The limiter is always passed explicitly (`Arc<RateLimiter>`) into the
//! components that dispatch remote calls — never a process global — so tests
//! can substitute a zero-interval no-op or an instrumented instance.

use std::future::Future;
use std::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};

/// Enforces a minimum interval between dispatches of scheduled operations.
///
/// Internally a single monotonically advancing "next allowed start" instant
/// behind a mutex. A caller reserves the next free slot (a synchronous lock,
/// no await while held), releases the lock, sleeps until its slot arrives,
/// then runs the operation with no further restriction on its duration.
///
/// Uses [`tokio::time::Instant`] so tests under a paused clock
/// (`#[tokio::test(start_paused = true)]`) are deterministic and instant.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum dispatch interval.
    ///
    /// A zero interval is valid and makes `schedule` a plain pass-through,
    /// which is the usual choice in tests.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Convenience constructor from milliseconds (the reference configuration
    /// is 110 ms).
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// The configured minimum dispatch interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `op`, waiting first until this caller's dispatch slot arrives.
    ///
    /// The returned future resolves to whatever `op`'s future resolves to;
    /// errors are the operation's own concern. Slot reservation is atomic
    /// across callers, so even when many jobs call `schedule` simultaneously
    /// their start times are spaced by at least [`Self::interval`].
    pub async fn schedule<F, Fut, T>(&self, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let slot = self.reserve_slot();
        sleep_until(slot).await;
        op().await
    }

    /// Reserve the next free dispatch slot and advance the shared clock.
    ///
    /// No await happens while the lock is held, so the mutex cannot be held
    /// across a suspension point.
    fn reserve_slot(&self) -> Instant {
        let mut next = self
            .next_slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = Instant::now();
        let slot = match *next {
            Some(reserved) if reserved > now => reserved,
            _ => now,
        };
        *next = Some(slot + self.interval);
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const INTERVAL_MS: u64 = 110;

    async fn record_dispatches(limiter: Arc<RateLimiter>, n: usize) -> Vec<Instant> {
        let starts = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for _ in 0..n {
            let limiter = Arc::clone(&limiter);
            let starts = Arc::clone(&starts);
            handles.push(tokio::spawn(async move {
                limiter
                    .schedule(|| async {
                        starts.lock().unwrap().push(Instant::now());
                    })
                    .await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let mut v = starts.lock().unwrap().clone();
        v.sort();
        v
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_dispatches_are_spaced_by_the_interval() {
        let limiter = Arc::new(RateLimiter::from_millis(INTERVAL_MS));
        let starts = record_dispatches(limiter, 6).await;

        assert_eq!(starts.len(), 6);
        for pair in starts.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(
                gap >= Duration::from_millis(INTERVAL_MS),
                "dispatch gap {gap:?} below the configured interval"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_operations_do_not_delay_the_next_dispatch() {
        // Rate limiting bounds dispatch, not in-flight concurrency: a 5 s
        // operation must not push the next slot 5 s out.
        let limiter = Arc::new(RateLimiter::from_millis(INTERVAL_MS));
        let starts = Arc::new(Mutex::new(Vec::new()));

        let slow = {
            let limiter = Arc::clone(&limiter);
            let starts = Arc::clone(&starts);
            tokio::spawn(async move {
                limiter
                    .schedule(|| async {
                        starts.lock().unwrap().push(Instant::now());
                        sleep_until(Instant::now() + Duration::from_secs(5)).await;
                    })
                    .await;
            })
        };
        let fast = {
            let limiter = Arc::clone(&limiter);
            let starts = Arc::clone(&starts);
            tokio::spawn(async move {
                limiter
                    .schedule(|| async {
                        starts.lock().unwrap().push(Instant::now());
                    })
                    .await;
            })
        };
        slow.await.unwrap();
        fast.await.unwrap();

        let mut v = starts.lock().unwrap().clone();
        v.sort();
        let gap = v[1] - v[0];
        assert!(gap >= Duration::from_millis(INTERVAL_MS));
        assert!(
            gap < Duration::from_secs(5),
            "second dispatch waited for the slow operation to finish"
        );
    }

    #[tokio::test]
    async fn zero_interval_is_a_pass_through() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let out = limiter.schedule(|| async { 41 + 1 }).await;
        assert_eq!(out, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_returns_the_operation_result() {
        let limiter = RateLimiter::from_millis(INTERVAL_MS);
        let first: Result<u32, &str> = limiter.schedule(|| async { Ok(7) }).await;
        let second: Result<u32, &str> = limiter.schedule(|| async { Err("boom") }).await;
        assert_eq!(first, Ok(7));
        assert_eq!(second, Err("boom"));
    }
}
