//! TCP chat relay server for the Tsudoi chat application.
//!
//! Clients connect over TCP, announce a display name, and exchange chat
//! messages that are broadcast to all other connected clients. A bounded
//! in-memory history is replayed to newly joined clients.

pub mod broadcast;
pub mod console;
pub mod domain;
pub mod error;
pub mod handler;
pub mod history;
pub mod protocol;
pub mod registry;
pub mod runner;
pub mod state;
