//! Logical wire frames exchanged between client and server.

use serde::{Deserialize, Serialize};

/// One chat message as carried inside a history frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sender: String,
    pub message: String,
    pub time: String,
}

/// One logical message unit on the wire, tagged by its `type` field.
///
/// - `Handshake` (`"username"`): client→server, exactly once per connection.
/// - `History` (`"history"`): server→client, once after a successful
///   handshake.
/// - `Chat` (`"message"`): chat traffic in both directions; server notices
///   use the sender `"Server"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Frame {
    #[serde(rename = "username")]
    Handshake {
        // An absent name gets the same generated-name fallback as an
        // empty one.
        #[serde(default)]
        username: String,
    },

    #[serde(rename = "history")]
    History { messages: Vec<HistoryEntry> },

    #[serde(rename = "message")]
    Chat {
        sender: String,
        message: String,
        // The server stamps this field itself, so a missing stamp from a
        // client is not a protocol violation.
        #[serde(default)]
        time: String,
    },
}
