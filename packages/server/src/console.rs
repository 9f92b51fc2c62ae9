//! Operator console and shutdown signal.

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::domain::is_quit_command;

/// Resolve when the operator requests shutdown, either by typing `quit`
/// (case-insensitive) on the server console or by pressing Ctrl+C. Any other
/// console input is ignored.
pub async fn shutdown_signal() {
    let console = async {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if is_quit_command(&line) => break,
                Ok(Some(_)) => {}
                // stdin is closed or unreadable; only Ctrl+C can stop us now
                Ok(None) | Err(_) => std::future::pending::<()>().await,
            }
        }
    };

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = console => tracing::info!("operator requested shutdown via console"),
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
    }
}
