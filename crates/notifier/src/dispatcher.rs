//! Host-facing entry point of the relay.
//!
//! `Dispatcher::initialize` spawns the delivery worker when the relay is
//! enabled and has recipients; `enqueue` is the host's event callback;
//! `shutdown` requests a cooperative stop without waiting for it.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use relay_common::config::RelayConfig;
use relay_common::error::RelayError;
use relay_common::types::Message;

use crate::client::{IyuuClient, NotificationClient};
use crate::queue::{self, MessageQueue};
use crate::worker::{DeliveryWorker, WorkerState};

/// Result of handing an event to [`Dispatcher::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Accepted and waiting for delivery.
    Queued,
    /// Relay disabled or without recipients; event ignored.
    Inactive,
    /// Both title and text empty; event dropped.
    Empty,
    /// Worker already stopped; event dropped.
    Closed,
}

pub struct Dispatcher {
    config: RelayConfig,
    queue: Option<MessageQueue>,
    shutdown: CancellationToken,
    state: watch::Receiver<WorkerState>,
    handle: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Start the relay with the IYUU HTTP client.
    ///
    /// Must be called from within a tokio runtime.
    pub fn initialize(config: RelayConfig) -> Result<Self, RelayError> {
        let client = IyuuClient::from_config(&config)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Start the relay with a caller-provided client.
    ///
    /// The worker is only spawned when [`RelayConfig::is_active`] holds.
    pub fn with_client(config: RelayConfig, client: Arc<dyn NotificationClient>) -> Self {
        let shutdown = CancellationToken::new();

        if !config.is_active() {
            tracing::info!(
                enabled = config.enabled,
                recipients = config.tokens.len(),
                "IYUU relay inactive — delivery worker not started"
            );
            let (_, state) = watch::channel(WorkerState::Stopped);
            return Self {
                config,
                queue: None,
                shutdown,
                state,
                handle: None,
            };
        }

        let (queue, receiver) = queue::channel();
        let (state_tx, state) = watch::channel(WorkerState::Idle);
        let worker = DeliveryWorker::new(
            config.clone(),
            client,
            receiver,
            shutdown.clone(),
            state_tx,
        );
        let handle = tokio::spawn(worker.run());

        Self {
            config,
            queue: Some(queue),
            shutdown,
            state,
            handle: Some(handle),
        }
    }

    /// True iff the relay is enabled and has at least one recipient token.
    pub fn is_active(&self) -> bool {
        self.config.is_active()
    }

    /// Queue a host event for delivery. Never blocks.
    pub fn enqueue(&self, message: Message) -> Admission {
        let Some(queue) = &self.queue else {
            return Admission::Inactive;
        };

        if !message.has_content() {
            tracing::warn!("Title and text cannot both be empty");
            return Admission::Empty;
        }

        match queue.push(message) {
            Ok(()) => {
                tracing::info!(pending = queue.len(), "Message queued for delivery");
                Admission::Queued
            }
            Err(e) => {
                tracing::warn!(error = %e, "Delivery worker stopped — message dropped");
                Admission::Closed
            }
        }
    }

    /// Messages accepted but not yet picked up by the worker.
    pub fn pending(&self) -> usize {
        self.queue.as_ref().map_or(0, MessageQueue::len)
    }

    /// Request a cooperative stop. Returns immediately.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::info!("IYUU relay shutting down");
        }
        self.shutdown.cancel();
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Wait until the worker has reached [`WorkerState::Stopped`].
    pub async fn stopped(&self) {
        let mut state = self.state.clone();
        // An error means the worker is gone, which only happens after `Stopped`.
        let _ = state.wait_for(|s| *s == WorkerState::Stopped).await;
    }

    /// Stop accepting events and wait until everything queued has been processed.
    pub async fn drain(mut self) {
        self.queue.take();
        self.wait_worker().await;
    }

    /// Request shutdown and wait for the worker task to finish.
    pub async fn join(mut self) {
        self.shutdown();
        self.wait_worker().await;
    }

    async fn wait_worker(&mut self) {
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            tracing::error!(error = %e, "Delivery worker task failed");
        }
    }
}
