//! Per-connection lifecycle handling.
//!
//! Each accepted connection moves through
//! `Accepted -> Handshaking -> Active -> Closing -> Closed`: the first frame
//! must announce a display name, after which the client is registered, given
//! the history snapshot, announced to the room, and served by a read loop
//! until the connection goes away. Any error on the connection tears down
//! only that connection.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::broadcast::Outbound;
use crate::domain::{ChatMessage, history_frame, resolve_display_name};
use crate::protocol::{Frame, FrameCodec};
use crate::registry::{BoxedWriteStream, ClientWriter};
use crate::state::ServerState;

/// Drive one client connection from handshake to teardown
pub async fn handle_connection(stream: TcpStream, peer: SocketAddr, state: Arc<ServerState>) {
    let (read_half, write_half) = stream.into_split();
    let mut reader = FramedRead::new(read_half, FrameCodec::new());

    // Handshaking: the first frame must announce the display name.
    let requested = match reader.next().await {
        Some(Ok(Frame::Handshake { username })) => username,
        Some(Ok(frame)) => {
            tracing::warn!(
                "protocol violation from {}: expected handshake, got {:?}",
                peer,
                frame
            );
            return;
        }
        Some(Err(e)) => {
            tracing::warn!("handshake decode error from {}: {}", peer, e);
            return;
        }
        None => {
            tracing::debug!("{} closed before handshake", peer);
            return;
        }
    };
    let name = resolve_display_name(&requested, peer);

    let writer: Arc<Mutex<ClientWriter>> = Arc::new(Mutex::new(FramedWrite::new(
        Box::new(write_half) as BoxedWriteStream,
        FrameCodec::new(),
    )));

    // Duplicate names are rejected; the new connection gets an explanatory
    // notice and is closed without ever being registered.
    //
    // The send lock is held from before registration until the history frame
    // has been written. Registration makes this client visible to the
    // broadcast consumer, and only the lock keeps a queued broadcast from
    // reaching the connection ahead of its history snapshot.
    let connected_at = state.clock.now_millis();
    {
        let mut writer_guard = writer.lock().await;
        if let Err(e) = state
            .registry
            .register(&name, writer.clone(), connected_at)
            .await
        {
            tracing::warn!("rejecting connection from {}: {}", peer, e);
            let notice = ChatMessage::chat(
                crate::domain::SERVER_SENDER,
                format!("display name '{}' is already in use", name),
                state.clock.clock_time(),
            );
            let _ = writer_guard.send(&notice.to_frame()).await;
            let _ = writer_guard.close().await;
            return;
        }

        // Active: the history snapshot goes straight to this client, not
        // through the broadcast queue.
        let snapshot = state.history.snapshot().await;
        if let Err(e) = writer_guard.send(&history_frame(&snapshot)).await {
            tracing::warn!("failed to send history to '{}': {}", name, e);
            drop(writer_guard);
            state.registry.remove(&name).await;
            return;
        }
    }

    let joined = ChatMessage::joined(&name, state.clock.clock_time());
    let _ = state
        .outbound_tx
        .send(Outbound::new(joined, Some(name.clone())));
    tracing::info!("client '{}' connected from {} and registered", name, peer);

    // Read loop: decode frames until the connection goes away.
    loop {
        match reader.next().await {
            Some(Ok(Frame::Chat { message, .. })) => {
                state.registry.touch(&name, state.clock.now_millis()).await;
                // The registered name is authoritative; the client-claimed
                // sender field is ignored, and the server stamps the time.
                let chat = ChatMessage::chat(&name, message, state.clock.clock_time());
                state.history.append(chat.clone()).await;
                let _ = state
                    .outbound_tx
                    .send(Outbound::new(chat, Some(name.clone())));
            }
            Some(Ok(frame)) => {
                tracing::debug!("ignoring unexpected frame from '{}': {:?}", name, frame);
            }
            Some(Err(e)) => {
                // A malformed frame is treated as a disconnect.
                tracing::warn!("decode error from '{}': {}", name, e);
                break;
            }
            None => {
                tracing::info!("client '{}' disconnected", name);
                break;
            }
        }
    }

    // Closing: the leave notice is gated on remove() so that concurrent
    // disconnect detection (read loop vs. broadcast failure) emits it once.
    if state.registry.remove(&name).await {
        let left = ChatMessage::left(&name, state.clock.clock_time());
        let _ = state.outbound_tx.send(Outbound::to_everyone(left));
    }
}
