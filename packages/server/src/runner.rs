//! Server execution logic.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tsudoi_shared::time::SystemClock;

use crate::broadcast::{Outbound, run_broadcaster};
use crate::error::ServerError;
use crate::handler::handle_connection;
use crate::history::MessageHistory;
use crate::registry::ClientRegistry;
use crate::state::ServerState;

/// Server startup configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to (e.g. "127.0.0.1")
    pub host: String,
    /// Port to bind to; 0 picks an ephemeral port
    pub port: u16,
    /// Maximum number of chat messages kept in history
    pub history_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5555,
            history_capacity: MessageHistory::DEFAULT_CAPACITY,
        }
    }
}

/// The chat server: a bound listener plus the shared state of its tasks
pub struct ChatServer {
    listener: TcpListener,
    state: Arc<ServerState>,
    outbound_rx: mpsc::UnboundedReceiver<Outbound>,
}

impl ChatServer {
    /// Bind the listener and construct the shared state.
    ///
    /// A bind failure is fatal and aborts startup.
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: bind_addr,
                source,
            })?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let state = Arc::new(ServerState {
            registry: Arc::new(ClientRegistry::new()),
            history: Arc::new(MessageHistory::with_capacity(config.history_capacity)),
            outbound_tx,
            clock: Arc::new(SystemClock),
        });

        Ok(Self {
            listener,
            state,
            outbound_rx,
        })
    }

    /// Address the listener is actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop until `shutdown` resolves, then tear down every
    /// registered client and stop the broadcast consumer.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<(), ServerError> {
        let ChatServer {
            listener,
            state,
            outbound_rx,
        } = self;

        let broadcaster = tokio::spawn(run_broadcaster(
            outbound_rx,
            state.registry.clone(),
            state.outbound_tx.clone(),
            state.clock.clone(),
        ));

        tracing::info!("chat server listening on {}", listener.local_addr()?);
        tracing::info!("Type 'quit' or press Ctrl+C to shut down");

        tokio::pin!(shutdown);
        let mut result = Ok(());
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::info!("new connection from {}", peer);
                        tokio::spawn(handle_connection(stream, peer, state.clone()));
                    }
                    Err(e) => {
                        tracing::error!("accept failed: {}", e);
                        result = Err(ServerError::Accept(e));
                        break;
                    }
                },
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
            }
        }

        // Closing the listener stops new connections; draining the registry
        // closes every live connection, which unblocks their read loops.
        drop(listener);
        let names = state.registry.drain().await;
        if !names.is_empty() {
            tracing::info!("closed {} client connection(s)", names.len());
        }
        broadcaster.abort();

        tracing::info!("server shutdown complete");
        result
    }
}
