//! Error types for the chat server.

use thiserror::Error;

use crate::protocol::CodecError;

/// Fatal server errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound at startup
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accepting a new connection failed
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// Other I/O errors on the listener itself
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from client registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The requested display name is already registered
    #[error("display name '{0}' is already in use")]
    NameInUse(String),
}

/// Errors from sending a frame to a single client
#[derive(Debug, Error)]
pub enum SendError {
    /// No client with this display name is registered
    #[error("client '{0}' is not registered")]
    ClientNotFound(String),

    /// The write to the client's connection failed
    #[error("failed to send frame to '{0}': {1}")]
    SendFailed(String, CodecError),
}
