//! Client registry and per-client send synchronization.
//!
//! ## 責務
//!
//! - 表示名をキーとして接続中クライアントを管理する
//! - クライアントごとの送信ロックを保持する
//!
//! ## 設計ノート
//!
//! 送信ロックは `ClientRecord` 自身が所有します。ロックを別マップで管理すると
//! 削除後のロック参照という競合が生まれるため、レコードと一緒に生成・破棄
//! されます。`remove` はレコードをマップから取り出した後、そのロックを取得して
//! から接続を閉じるので、削除が進行中の送信と競合することはありません。

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::SinkExt;
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;
use tokio_util::codec::FramedWrite;

use crate::error::{RegistryError, SendError};
use crate::protocol::{Frame, FrameCodec};

/// Write half of a client connection, boxed so unit tests can substitute
/// in-memory streams for TCP sockets.
pub type BoxedWriteStream = Box<dyn AsyncWrite + Send + Unpin>;

/// Framed, frame-encoding writer for one client connection
pub type ClientWriter = FramedWrite<BoxedWriteStream, FrameCodec>;

/// Connection record for one registered client.
///
/// The writer mutex is the per-client send lock: every send to this client
/// goes through it, and removal closes the connection under it.
struct ClientRecord {
    writer: Arc<Mutex<ClientWriter>>,
    connected_at: i64,
    last_active: i64,
}

/// Snapshot of one client's registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientInfo {
    /// Unix timestamp when the client registered (milliseconds)
    pub connected_at: i64,
    /// Unix timestamp of the client's last received frame (milliseconds)
    pub last_active: i64,
}

/// Registry of live client connections keyed by display name
pub struct ClientRegistry {
    inner: Mutex<HashMap<String, ClientRecord>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Register a client under `name`.
    ///
    /// Fails with [`RegistryError::NameInUse`] if the name is already
    /// registered; the caller keeps its handle on the writer and can notify
    /// the rejected peer.
    pub async fn register(
        &self,
        name: &str,
        writer: Arc<Mutex<ClientWriter>>,
        connected_at: i64,
    ) -> Result<(), RegistryError> {
        let mut clients = self.inner.lock().await;
        if clients.contains_key(name) {
            return Err(RegistryError::NameInUse(name.to_string()));
        }
        clients.insert(
            name.to_string(),
            ClientRecord {
                writer,
                connected_at,
                last_active: connected_at,
            },
        );
        Ok(())
    }

    /// Non-blocking snapshot read of one client's entry
    pub async fn lookup(&self, name: &str) -> Option<ClientInfo> {
        let clients = self.inner.lock().await;
        clients.get(name).map(|record| ClientInfo {
            connected_at: record.connected_at,
            last_active: record.last_active,
        })
    }

    /// Update a client's last-active timestamp (informational only)
    pub async fn touch(&self, name: &str, at: i64) {
        let mut clients = self.inner.lock().await;
        if let Some(record) = clients.get_mut(name) {
            record.last_active = at;
        }
    }

    /// Remove a client, closing its connection under the per-client lock.
    ///
    /// Idempotent: returns `true` only for the call that actually removed
    /// the record, so concurrent disconnect detection cannot double-report.
    pub async fn remove(&self, name: &str) -> bool {
        let record = self.inner.lock().await.remove(name);
        match record {
            Some(record) => {
                let mut writer = record.writer.lock().await;
                if let Err(e) = writer.close().await {
                    tracing::debug!("error closing connection of '{}': {}", name, e);
                }
                true
            }
            None => false,
        }
    }

    /// Send one frame to a single client under its send lock
    pub async fn send_to(&self, name: &str, frame: &Frame) -> Result<(), SendError> {
        let writer = {
            let clients = self.inner.lock().await;
            clients
                .get(name)
                .map(|record| record.writer.clone())
                .ok_or_else(|| SendError::ClientNotFound(name.to_string()))?
        };
        let mut writer = writer.lock().await;
        writer
            .send(frame)
            .await
            .map_err(|e| SendError::SendFailed(name.to_string(), e))
    }

    /// Deliver one frame to every registered client except `exclude`.
    ///
    /// Iterates a point-in-time snapshot of the registry and sends under each
    /// client's own lock. A failed send removes that client but does not
    /// abort delivery to the rest; the removed names are returned so the
    /// caller can emit leave notices.
    pub async fn broadcast(&self, frame: &Frame, exclude: Option<&str>) -> Vec<String> {
        let targets: Vec<(String, Arc<Mutex<ClientWriter>>)> = {
            let clients = self.inner.lock().await;
            clients
                .iter()
                .filter(|(name, _)| exclude != Some(name.as_str()))
                .map(|(name, record)| (name.clone(), record.writer.clone()))
                .collect()
        };

        let mut dropped = Vec::new();
        for (name, writer) in targets {
            let mut writer = writer.lock().await;
            if let Err(e) = writer.send(frame).await {
                tracing::warn!("failed to send frame to '{}': {}", name, e);
                dropped.push(name);
            }
        }

        for name in &dropped {
            self.remove(name).await;
        }
        dropped
    }

    /// Display names of all registered clients
    pub async fn names(&self) -> Vec<String> {
        let clients = self.inner.lock().await;
        clients.keys().cloned().collect()
    }

    /// Number of registered clients
    pub async fn count(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Remove every client, closing each connection; returns their names.
    ///
    /// Used during shutdown to tear down all registered clients at once.
    pub async fn drain(&self) -> Vec<String> {
        let records: Vec<(String, ClientRecord)> = {
            let mut clients = self.inner.lock().await;
            clients.drain().collect()
        };
        let mut names = Vec::with_capacity(records.len());
        for (name, record) in records {
            let mut writer = record.writer.lock().await;
            if let Err(e) = writer.close().await {
                tracing::debug!("error closing connection of '{}': {}", name, e);
            }
            drop(writer);
            names.push(name);
        }
        names
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
