//! TCP client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};

use tsudoi_server::domain::SERVER_SENDER;
use tsudoi_server::protocol::{Frame, FrameCodec};
use tsudoi_shared::time::current_clock_time;

use crate::error::ClientError;
use crate::formatter::MessageFormatter;
use crate::ui::redisplay_prompt;

/// Run one client session: connect, handshake, then relay messages between
/// the terminal and the server until either side goes away
pub async fn run_client_session(
    addr: &str,
    username: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    let (read_half, write_half) = stream.into_split();
    let mut read = FramedRead::new(read_half, FrameCodec::new());
    let mut write = FramedWrite::new(write_half, FrameCodec::new());

    write
        .send(&Frame::Handshake {
            username: username.to_string(),
        })
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    // The server answers the handshake with the history snapshot. A Server
    // notice arriving before any history means the display name was rejected.
    match read.next().await {
        Some(Ok(Frame::History { messages })) => {
            print!("{}", MessageFormatter::format_history(&messages));
        }
        Some(Ok(Frame::Chat {
            sender, message, ..
        })) if sender == SERVER_SENDER => {
            return Err(Box::new(ClientError::NameRejected(message)));
        }
        Some(Ok(frame)) => {
            return Err(Box::new(ClientError::Protocol(format!(
                "unexpected frame during handshake: {:?}",
                frame
            ))));
        }
        Some(Err(e)) => {
            return Err(Box::new(ClientError::ConnectionError(e.to_string())));
        }
        None => {
            return Err(Box::new(ClientError::ConnectionError(
                "server closed the connection during handshake".to_string(),
            )));
        }
    }

    tracing::info!("Connected to chat server!");
    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Press Ctrl+C to exit.\n",
        username
    );

    // Clone username for read task
    let username_for_read = username.to_string();

    // Spawn a task to handle incoming frames
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        loop {
            match read.next().await {
                Some(Ok(Frame::Chat {
                    sender,
                    message,
                    time,
                })) => {
                    let formatted = if sender == SERVER_SENDER {
                        MessageFormatter::format_server_notice(&message, &time)
                    } else {
                        MessageFormatter::format_chat_message(&sender, &message, &time)
                    };
                    print!("{}", formatted);
                    redisplay_prompt(&username_for_read);
                }
                Some(Ok(frame)) => {
                    tracing::debug!("ignoring unexpected frame: {:?}", frame);
                }
                Some(Err(e)) => {
                    tracing::warn!("failed to read frame: {}", e);
                    connection_error = true;
                    break;
                }
                None => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
            }
        }

        connection_error
    });

    // Clone username for the input loop
    let username = username.to_string();
    let username_for_prompt = username.clone();

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", username_for_prompt);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to take console input and send it to the server
    let username_for_write = username.clone();
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let time = current_clock_time();
            let frame = Frame::Chat {
                sender: username.clone(),
                message: line,
                time: time.clone(),
            };

            if let Err(e) = write.send(&frame).await {
                tracing::warn!("Failed to send message: {}", e);
                write_error = true;
                break;
            }

            // Display sent timestamp and redisplay prompt
            let formatted = MessageFormatter::format_sent_confirmation(&time);
            print!("\n{}", formatted);
            redisplay_prompt(&username_for_write);
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            let connection_error = read_result.unwrap_or(false);
            if connection_error {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            let write_error = write_result.unwrap_or(false);
            if write_error {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
    }

    Ok(())
}
