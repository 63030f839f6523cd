//! Global spacing between provider send cycles.
//!
//! The provider enforces an hourly ceiling shared by every token, and failed
//! sends are never retried, so the only protection against losing messages to
//! provider throttling is keeping the aggregate call rate low. Each dequeued
//! message waits until `interval` has passed since the last successful send.
//!
//! Uses `tokio::time::Instant` so tests can drive the clock with
//! `tokio::time::pause`.

use std::time::Duration;

use tokio::time::Instant;

/// Global send-cycle limiter, owned by the delivery worker.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_send: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_send: None,
        }
    }

    /// Time still to wait before the next send cycle may start.
    ///
    /// Returns `Duration::ZERO` when nothing has been sent yet or the interval
    /// has already elapsed.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_send {
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Sleep until the next send cycle is allowed.
    pub async fn wait(&self) {
        let remaining = self.remaining(Instant::now());
        if remaining.is_zero() {
            return;
        }

        tracing::debug!(
            wait_secs = remaining.as_secs_f64(),
            "Rate limit active — delaying send cycle"
        );
        tokio::time::sleep(remaining).await;
    }

    /// Record the time of a successful send.
    pub fn record_success(&mut self, at: Instant) {
        self.last_send = Some(at);
    }

    pub fn last_send(&self) -> Option<Instant> {
        self.last_send
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
