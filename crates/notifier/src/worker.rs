//! The single consumer of the message queue.
//!
//! ```text
//! Idle ──pop──► RateLimiting ──► Filtering ──► Dispatching ──► Idle
//!   │                │               │
//!   │ shutdown       │ shutdown      └─ channel-routed / disabled type ──► Idle
//!   ▼                ▼
//! Stopped ◄──────────┘
//! ```
//!
//! Shutdown is observed while waiting on the queue and during the rate-limit
//! wait. A fan-out that has already started always runs to completion.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use relay_common::config::RelayConfig;
use relay_common::types::Message;

use crate::client::NotificationClient;
use crate::fanout;
use crate::limiter::RateLimiter;
use crate::queue::QueueReceiver;

/// Observable state of the delivery worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for the next message.
    Idle,
    /// Waiting out the global send interval.
    RateLimiting,
    /// Checking channel routing and type policy.
    Filtering,
    /// Fanning the message out to recipients.
    Dispatching,
    /// Terminal.
    Stopped,
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerState::Idle => write!(f, "idle"),
            WorkerState::RateLimiting => write!(f, "rate_limiting"),
            WorkerState::Filtering => write!(f, "filtering"),
            WorkerState::Dispatching => write!(f, "dispatching"),
            WorkerState::Stopped => write!(f, "stopped"),
        }
    }
}

pub struct DeliveryWorker {
    config: RelayConfig,
    client: Arc<dyn NotificationClient>,
    queue: QueueReceiver,
    limiter: RateLimiter,
    shutdown: CancellationToken,
    state: watch::Sender<WorkerState>,
}

impl DeliveryWorker {
    pub fn new(
        config: RelayConfig,
        client: Arc<dyn NotificationClient>,
        queue: QueueReceiver,
        shutdown: CancellationToken,
        state: watch::Sender<WorkerState>,
    ) -> Self {
        let limiter = RateLimiter::new(config.send_interval);
        Self {
            config,
            client,
            queue,
            limiter,
            shutdown,
            state,
        }
    }

    /// Consume the queue until shutdown is requested or every producer is gone.
    pub async fn run(mut self) {
        tracing::info!(
            recipients = self.config.tokens.len(),
            send_interval_secs = self.limiter.interval().as_secs(),
            recipient_delay_secs = self.config.recipient_delay.as_secs(),
            "Delivery worker started"
        );

        loop {
            self.set_state(WorkerState::Idle);
            if self.shutdown.is_cancelled() {
                break;
            }

            let message = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                message = self.queue.pop() => match message {
                    Some(message) => message,
                    None => {
                        tracing::debug!("Message queue closed");
                        break;
                    }
                },
            };

            if let Err(panic_err) = AssertUnwindSafe(self.process(message))
                .catch_unwind()
                .await
            {
                let any = &*panic_err;
                let info = if let Some(msg) = any.downcast_ref::<&'static str>() {
                    (*msg).to_string()
                } else if let Some(msg) = any.downcast_ref::<String>() {
                    msg.clone()
                } else {
                    "unknown panic".to_string()
                };
                tracing::error!(error = %info, "Message processing panicked");
            }
        }

        self.set_state(WorkerState::Stopped);
        tracing::info!(pending = self.queue.len(), "Delivery worker stopped");
    }

    /// Run one dequeued message through rate limiting, filtering and fan-out.
    async fn process(&mut self, message: Message) {
        self.set_state(WorkerState::RateLimiting);
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                tracing::info!("Shutdown requested during rate-limit wait — message dropped");
                return;
            }
            _ = self.limiter.wait() => {}
        }

        self.set_state(WorkerState::Filtering);
        if message.is_channel_routed() {
            tracing::debug!(
                channel = message.channel.as_deref().unwrap_or_default(),
                "Channel-routed message ignored"
            );
            return;
        }
        if !self.config.allows(message.msg_type) {
            if let Some(msg_type) = message.msg_type {
                tracing::info!(
                    msg_type = %msg_type,
                    "Notification type not enabled — message skipped"
                );
            }
            return;
        }

        self.set_state(WorkerState::Dispatching);
        let report = fanout::dispatch_to_all(
            self.client.as_ref(),
            &message,
            &self.config.tokens,
            self.config.recipient_delay,
        )
        .await;

        if let Some(at) = report.last_success {
            self.limiter.record_success(at);
        }
    }

    fn set_state(&self, state: WorkerState) {
        self.state.send_replace(state);
    }
}
