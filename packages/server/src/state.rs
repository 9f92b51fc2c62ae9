//! Shared server state.

use std::sync::Arc;

use tokio::sync::mpsc;
use tsudoi_shared::time::Clock;

use crate::broadcast::Outbound;
use crate::history::MessageHistory;
use crate::registry::ClientRegistry;

/// State shared by every connection task, the accept loop and the broadcast
/// consumer. Constructed once at server startup; there are no ambient
/// globals. Registry, history and queue each carry their own synchronization,
/// so no single lock serializes all three.
pub struct ServerState {
    /// Live client connections keyed by display name
    pub registry: Arc<ClientRegistry>,
    /// Bounded log of past chat messages
    pub history: Arc<MessageHistory>,
    /// Producer side of the broadcast queue
    pub outbound_tx: mpsc::UnboundedSender<Outbound>,
    /// Source of message timestamps
    pub clock: Arc<dyn Clock>,
}
