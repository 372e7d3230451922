//! Sliding-window rate limiter with an injected clock.
//!
//! At most `max_requests` acquisitions are granted in any window of length
//! `window`. The limiter never sleeps: a full window reports how long until
//! the oldest grant ages out and the caller decides what to do.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

#[cfg(test)]
impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *lock(&self.elapsed) += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *lock(&self.elapsed)
    }
}

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    granted: Mutex<VecDeque<Instant>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests,
            window,
            clock,
            granted: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_system_clock(max_requests: usize, window: Duration) -> Self {
        Self::new(max_requests, window, Arc::new(SystemClock))
    }

    /// Takes a slot if one is free; otherwise returns the wait until one frees up.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let now = self.clock.now();
        let mut granted = lock(&self.granted);

        while let Some(&oldest) = granted.front() {
            if now.duration_since(oldest) >= self.window {
                granted.pop_front();
            } else {
                break;
            }
        }

        if granted.len() < self.max_requests {
            granted.push_back(now);
            return Ok(());
        }

        let wait = granted
            .front()
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(self.window);
        Err(wait)
    }

    /// Grants currently inside the window.
    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        let now = self.clock.now();
        lock(&self.granted)
            .iter()
            .filter(|t| now.duration_since(**t) < self.window)
            .count()
    }
}

// The guarded data stays consistent even if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: usize, window_secs: u64) -> (Arc<ManualClock>, RateLimiter) {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::new(max, Duration::from_secs(window_secs), clock.clone());
        (clock, limiter)
    }

    #[test]
    fn test_grants_up_to_limit_then_refuses() {
        let (_clock, limiter) = limiter(3, 60);
        assert!(limiter.try_acquire().is_ok());
        assert!(limiter.try_acquire().is_ok());
        assert!(limiter.try_acquire().is_ok());
        assert_eq!(limiter.try_acquire(), Err(Duration::from_secs(60)));
        assert_eq!(limiter.in_flight(), 3);
    }

    #[test]
    fn test_wait_shrinks_as_time_passes() {
        let (clock, limiter) = limiter(1, 60);
        limiter.try_acquire().unwrap();
        clock.advance(Duration::from_secs(45));
        assert_eq!(limiter.try_acquire(), Err(Duration::from_secs(15)));
    }

    #[test]
    fn test_window_slides() {
        let (clock, limiter) = limiter(2, 60);
        limiter.try_acquire().unwrap();
        clock.advance(Duration::from_secs(30));
        limiter.try_acquire().unwrap();
        assert!(limiter.try_acquire().is_err());

        // The first grant ages out; the second is still inside the window.
        clock.advance(Duration::from_secs(30));
        assert!(limiter.try_acquire().is_ok());
        assert!(limiter.try_acquire().is_err());
        assert_eq!(limiter.in_flight(), 2);
    }

    #[test]
    fn test_refusal_does_not_consume_a_slot() {
        let (clock, limiter) = limiter(1, 10);
        limiter.try_acquire().unwrap();
        for _ in 0..5 {
            assert!(limiter.try_acquire().is_err());
        }
        clock.advance(Duration::from_secs(10));
        assert!(limiter.try_acquire().is_ok());
    }

    #[test]
    fn test_zero_capacity_always_refuses() {
        let (_clock, limiter) = limiter(0, 10);
        assert_eq!(limiter.try_acquire(), Err(Duration::from_secs(10)));
    }

    #[test]
    fn test_huge_limit_grants_without_preallocating() {
        let (_clock, limiter) = limiter(usize::MAX, 60);
        for _ in 0..100 {
            assert!(limiter.try_acquire().is_ok());
        }
        assert_eq!(limiter.in_flight(), 100);
    }
}
