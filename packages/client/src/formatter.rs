//! Message formatting utilities for client display.

use tsudoi_server::protocol::HistoryEntry;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the history snapshot replayed to a newly joined client
    ///
    /// # Arguments
    ///
    /// * `entries` - Chat messages in the order they were originally sent
    ///
    /// # Returns
    ///
    /// A formatted string with the recent messages
    pub fn format_history(entries: &[HistoryEntry]) -> String {
        let mut output = String::new();
        output.push_str("\n============================================================\n");
        output.push_str("Recent messages:\n");

        if entries.is_empty() {
            output.push_str("(No messages yet)\n");
        } else {
            for entry in entries {
                output.push_str(&format!(
                    "[{}] {}: {}\n",
                    entry.time, entry.sender, entry.message
                ));
            }
        }

        output.push_str("============================================================\n");
        output
    }

    /// Format a chat message from another participant
    ///
    /// # Arguments
    ///
    /// * `sender` - The display name of the sender
    /// * `message` - The message text
    /// * `time` - Clock time stamped by the server (e.g. "10:30 AM")
    ///
    /// # Returns
    ///
    /// A formatted string with the chat message
    pub fn format_chat_message(sender: &str, message: &str, time: &str) -> String {
        if time.is_empty() {
            format!("\n{}: {}\n", sender, message)
        } else {
            format!("\n[{}] {}: {}\n", time, sender, message)
        }
    }

    /// Format a server notice (join/leave announcements and the like)
    ///
    /// # Arguments
    ///
    /// * `message` - The notice text
    /// * `time` - Clock time stamped by the server
    ///
    /// # Returns
    ///
    /// A formatted string with the notice
    pub fn format_server_notice(message: &str, time: &str) -> String {
        if time.is_empty() {
            format!("\n* {}\n", message)
        } else {
            format!("\n[{}] * {}\n", time, message)
        }
    }

    /// Format a confirmation message after sending
    ///
    /// # Arguments
    ///
    /// * `time` - Clock time at which the message was sent
    ///
    /// # Returns
    ///
    /// A formatted string with the sent confirmation
    pub fn format_sent_confirmation(time: &str) -> String {
        format!("sent at {}\n", time)
    }
}
