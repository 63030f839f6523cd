//! Unbounded FIFO message queue between the host's event path and the worker.
//!
//! Pushing never blocks and never fails for capacity reasons, so a slow
//! provider can never stall the host. Any number of producers may hold a
//! [`MessageQueue`] clone; exactly one [`QueueReceiver`] consumes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc;

use relay_common::error::RelayError;
use relay_common::types::Message;

/// Producer half of the queue.
#[derive(Debug, Clone)]
pub struct MessageQueue {
    tx: mpsc::UnboundedSender<Message>,
    pending: Arc<AtomicUsize>,
}

/// Consumer half of the queue, owned by the delivery worker.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::UnboundedReceiver<Message>,
    pending: Arc<AtomicUsize>,
}

/// Create a connected producer/consumer pair.
pub fn channel() -> (MessageQueue, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pending = Arc::new(AtomicUsize::new(0));
    (
        MessageQueue {
            tx,
            pending: Arc::clone(&pending),
        },
        QueueReceiver { rx, pending },
    )
}

impl MessageQueue {
    /// Append a message to the tail.
    ///
    /// Fails only when the consumer is gone (worker stopped).
    pub fn push(&self, message: Message) -> Result<(), RelayError> {
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.tx.send(message).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            RelayError::QueueClosed
        })
    }

    /// Number of messages waiting to be dequeued.
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once the consumer has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl QueueReceiver {
    /// Wait for the next message.
    ///
    /// Returns `None` once every producer has been dropped and the buffer is drained.
    pub async fn pop(&mut self) -> Option<Message> {
        let message = self.rx.recv().await?;
        self.pending.fetch_sub(1, Ordering::AcqRel);
        Some(message)
    }

    pub fn len(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
