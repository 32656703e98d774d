use quinn::{Connection, ConnectionError};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, trace, warn};

use common::net::{MessageStream, decode_message};
#[allow(clippy::wildcard_imports)]
use common::protocol::*;

// ============================================================================
// Network I/O Task
// ============================================================================

/// Message from the network I/O task to the frame loop
#[derive(Debug, Clone)]
pub enum ServerToGame {
    Message(ServerMessage),
    Disconnected,
}

/// Message from the frame loop to the network I/O task
#[derive(Debug, Clone)]
pub enum GameToServer {
    Send(ClientMessage),
    Close,
}

pub async fn network_io_task(
    connection: Connection,
    to_game: UnboundedSender<ServerToGame>,
    mut from_game: UnboundedReceiver<GameToServer>,
) {
    let stream = MessageStream::new(&connection);

    // Each direction runs as one future so that a message read half-way is never dropped by the
    // other direction becoming ready
    let receiving = async {
        loop {
            match stream.recv_bytes().await {
                Ok(data) => match decode_message::<ServerMessage>(&data) {
                    Ok(msg) => {
                        trace!(tag = msg.tag(), "received message");
                        if to_game.send(ServerToGame::Message(msg)).is_err() {
                            // Frame loop gone, exit
                            break;
                        }
                    }
                    Err(e) => warn!(len = data.len(), "discarding malformed message: {e:#}"),
                },
                Err(e) => {
                    if let Some(conn_err) = e.downcast_ref::<ConnectionError>() {
                        match conn_err {
                            ConnectionError::ApplicationClosed { .. } => info!("relay closed the connection"),
                            ConnectionError::TimedOut => warn!("relay connection timed out"),
                            ConnectionError::LocallyClosed => debug!("connection closed locally"),
                            _ => error!("connection error: {e}"),
                        }
                    } else {
                        error!("error receiving message: {e}");
                    }
                    break;
                }
            }
        }
    };

    let sending = async {
        // A `None` means the frame loop is gone
        while let Some(cmd) = from_game.recv().await {
            match cmd {
                GameToServer::Send(msg) => {
                    trace!(tag = msg.tag(), "sending message");
                    if let Err(e) = stream.send(&msg).await {
                        error!("error sending to relay: {e}");
                        break;
                    }
                }
                GameToServer::Close => {
                    connection.close(0u32.into(), b"client closing");
                    break;
                }
            }
        }
    };

    tokio::select! {
        () = receiving => {}
        () = sending => {}
    }

    // Tell the frame loop to continue offline
    let _ = to_game.send(ServerToGame::Disconnected);
}
