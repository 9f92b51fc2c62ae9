//! Shared utilities for the Tsudoi chat application.
//!
//! Both the server and the client binaries use this crate for logging setup
//! and time handling.

pub mod logger;
pub mod time;
