//! Token-bucket gate for outbound polling.
//!
//! A long-poll normally parks on the remote side, but a store that errors
//! or answers instantly would otherwise be hammered. Each key watcher owns
//! one [`RateLimiter`] and waits on it before every request.

use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Errors from [`RateLimiter::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AcquireError {
    #[error("cancelled while waiting for a token")]
    Cancelled,
}

struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    /// Take a token, or report how long until one is available.
    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> Result<(), Duration> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - self.tokens;
            Err(Duration::try_from_secs_f64(deficit / refill_rate).unwrap_or(Duration::MAX))
        }
    }
}

/// Token bucket with a sustained rate and a burst capacity.
pub struct RateLimiter {
    rate: f64,
    burst: f64,
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    /// `rate` is tokens per second; the bucket starts full with `burst`
    /// tokens. A zero burst is raised to one so the limiter can always make
    /// progress.
    pub fn new(rate: f64, burst: u32) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            rate,
            burst,
            bucket: Mutex::new(TokenBucket::new(burst)),
        }
    }

    /// Wait until a token is available.
    ///
    /// Sleeps on the tokio timer rather than spinning. Fails only when
    /// `cancel` fires first.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), AcquireError> {
        loop {
            if cancel.is_cancelled() {
                return Err(AcquireError::Cancelled);
            }

            let wait = match self.bucket.lock().try_acquire(self.burst, self.rate) {
                Ok(()) => return Ok(()),
                Err(wait) => wait,
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AcquireError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("rate", &self.rate)
            .field("burst", &self.burst)
            .finish()
    }
}
