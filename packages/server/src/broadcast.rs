//! Ordered broadcast pipeline.
//!
//! Producers (per-client read loops and the connection lifecycle) enqueue
//! outbound messages without waiting on network I/O; a single consumer task
//! dequeues in FIFO order and fans each message out through the registry.
//! Because there is exactly one consumer, no two broadcasts interleave their
//! per-client sends and every client observes the same relative order.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tsudoi_shared::time::Clock;

use crate::domain::ChatMessage;
use crate::protocol::Frame;
use crate::registry::ClientRegistry;

/// One queued broadcast: a message plus the client excluded from delivery
#[derive(Debug, Clone)]
pub struct Outbound {
    pub message: ChatMessage,
    /// Display name of the client that must not receive this message
    /// (typically the sender); `None` delivers to everyone.
    pub exclude: Option<String>,
}

impl Outbound {
    pub fn new(message: ChatMessage, exclude: Option<String>) -> Self {
        Self { message, exclude }
    }

    /// A broadcast with no excluded client
    pub fn to_everyone(message: ChatMessage) -> Self {
        Self {
            message,
            exclude: None,
        }
    }
}

/// Delivery seam between the broadcast consumer and the client connections
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Deliver one frame to every registered client except `exclude`,
    /// returning the names of clients dropped after a failed send.
    async fn deliver(&self, frame: &Frame, exclude: Option<&str>) -> Vec<String>;
}

#[async_trait]
impl MessagePusher for ClientRegistry {
    async fn deliver(&self, frame: &Frame, exclude: Option<&str>) -> Vec<String> {
        self.broadcast(frame, exclude).await
    }
}

/// Run the single broadcast consumer until the queue closes.
///
/// A client dropped during delivery gets a leave notice re-enqueued on its
/// behalf; a delivery failure never terminates the consumer.
pub async fn run_broadcaster(
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    pusher: Arc<dyn MessagePusher>,
    outbound_tx: mpsc::UnboundedSender<Outbound>,
    clock: Arc<dyn Clock>,
) {
    while let Some(item) = outbound_rx.recv().await {
        let frame = item.message.to_frame();
        let dropped = pusher.deliver(&frame, item.exclude.as_deref()).await;
        for name in dropped {
            tracing::warn!("client '{}' dropped after failed send", name);
            let notice = ChatMessage::left(&name, clock.clock_time());
            let _ = outbound_tx.send(Outbound::to_everyone(notice));
        }
    }
    tracing::debug!("broadcast queue closed, consumer exiting");
}
