//! Domain model and pure helpers for the chat server.
//!
//! This module contains the chat message model and pure functions that
//! implement business rules without side effects, making them easy to test.

use std::net::SocketAddr;

use crate::protocol::{Frame, HistoryEntry};

/// Sender name used for system notices (joins, leaves, rejections)
pub const SERVER_SENDER: &str = "Server";

/// Classification of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Regular chat traffic from a client
    Chat,
    /// System notice that a client joined
    Joined,
    /// System notice that a client left
    Left,
}

/// One chat message as recorded and broadcast by the server.
///
/// Immutable once constructed. Only `Chat`-kind messages are persisted to
/// history; `Joined`/`Left` notices are broadcast-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub kind: MessageKind,
    pub sender: String,
    pub body: String,
    pub time: String,
}

impl ChatMessage {
    /// Create a chat message from a client
    pub fn chat(
        sender: impl Into<String>,
        body: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            kind: MessageKind::Chat,
            sender: sender.into(),
            body: body.into(),
            time: time.into(),
        }
    }

    /// Create a join notice for the given display name
    pub fn joined(name: &str, time: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Joined,
            sender: SERVER_SENDER.to_string(),
            body: format!("{} has joined the chat", name),
            time: time.into(),
        }
    }

    /// Create a leave notice for the given display name
    pub fn left(name: &str, time: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Left,
            sender: SERVER_SENDER.to_string(),
            body: format!("{} has left the chat", name),
            time: time.into(),
        }
    }

    /// Encode this message as a wire frame.
    ///
    /// All kinds go out as `message` frames; notices are distinguished only
    /// by their `Server` sender.
    pub fn to_frame(&self) -> Frame {
        Frame::Chat {
            sender: self.sender.clone(),
            message: self.body.clone(),
            time: self.time.clone(),
        }
    }
}

impl From<&ChatMessage> for HistoryEntry {
    fn from(message: &ChatMessage) -> Self {
        Self {
            sender: message.sender.clone(),
            message: message.body.clone(),
            time: message.time.clone(),
        }
    }
}

/// Build the history frame sent once to a newly joined client
pub fn history_frame(messages: &[ChatMessage]) -> Frame {
    Frame::History {
        messages: messages.iter().map(HistoryEntry::from).collect(),
    }
}

/// Resolve the display name for a connecting client.
///
/// An empty or whitespace-only requested name falls back to a name generated
/// from the peer's port, e.g. `User_51432`.
pub fn resolve_display_name(requested: &str, peer: SocketAddr) -> String {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        format!("User_{}", peer.port())
    } else {
        trimmed.to_string()
    }
}

/// Check whether an operator console line requests shutdown.
///
/// Matches the literal command `quit`, case-insensitively; everything else
/// is ignored by the console.
pub fn is_quit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("quit")
}
