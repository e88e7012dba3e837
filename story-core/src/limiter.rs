//! Call budget for backend requests.
//!
//! A [`RateLimiter`] hands out at most `max_requests` acquisitions and keeps
//! consecutive acquisitions at least `min_delay` apart. There is no release:
//! it counts calls, it does not bound concurrency.

use crate::config::GenerationConfig;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// The call budget is spent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Rate limit reached: all {max_requests} backend requests have been used")]
pub struct RateLimitExceeded {
    pub max_requests: u32,
}

/// Throttles backend calls to a maximum count and a minimum spacing.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    min_delay: Duration,
    attempts: AtomicU32,
    /// Time of the last successful acquisition. Holding the lock serializes
    /// acquisitions so the count check and the delay see a consistent state.
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, min_delay: Duration) -> Self {
        Self {
            max_requests,
            min_delay,
            attempts: AtomicU32::new(0),
            last_call: Mutex::new(None),
        }
    }

    /// Limiter sized from a generation config.
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.max_requests(), config.min_delay_between_requests())
    }

    /// Take one call from the budget, waiting out the minimum delay if needed.
    pub async fn acquire(&self) -> Result<(), RateLimitExceeded> {
        let mut last_call = self.last_call.lock().await;

        if self.attempts.load(Ordering::SeqCst) >= self.max_requests {
            return Err(RateLimitExceeded {
                max_requests: self.max_requests,
            });
        }

        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_delay {
                let wait = self.min_delay - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "waiting before next backend call");
                tokio::time::sleep(wait).await;
            }
        }

        self.attempts.fetch_add(1, Ordering::SeqCst);
        *last_call = Some(Instant::now());
        Ok(())
    }

    /// Successful acquisitions so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Acquisitions left before [`RateLimitExceeded`].
    pub fn remaining(&self) -> u32 {
        self.max_requests.saturating_sub(self.attempts())
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }
}
