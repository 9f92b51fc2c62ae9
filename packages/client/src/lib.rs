//! Terminal client for the Tsudoi chat application.
//!
//! Connects to the chat server over TCP, announces a display name, replays
//! the recent history, and then exchanges chat messages interactively.

pub mod domain;
pub mod error;
pub mod formatter;
pub mod runner;
pub mod session;
pub mod ui;
