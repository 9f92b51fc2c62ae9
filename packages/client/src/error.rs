//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the requested display name
    #[error("Display name rejected: {0}")]
    NameRejected(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The server sent something the protocol does not allow here
    #[error("Protocol error: {0}")]
    Protocol(String),
}
