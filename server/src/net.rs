use anyhow::Error;
use quinn::{Connection, ConnectionError, Endpoint};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, error, info, instrument, trace, warn};

use common::net::{MessageStream, decode_message};
#[allow(clippy::wildcard_imports)]
use common::protocol::*;

// ============================================================================
// Accept Connections Task
// ============================================================================

// Task to accept incoming connections and spawn per-peer network I/O tasks
pub async fn accept_connections_task(endpoint: Endpoint, to_relay: UnboundedSender<(PlayerId, ClientToServer)>) {
    let mut next_player_id = 1u32;
    while let Some(incoming) = endpoint.accept().await {
        let id = PlayerId(next_player_id);
        let Some(next) = next_player_id.checked_add(1) else {
            error!("player ID space exhausted, refusing connection");
            incoming.refuse();
            continue;
        };
        next_player_id = next;

        let to_relay = to_relay.clone();
        tokio::spawn(async move {
            match incoming.await {
                Ok(connection) => {
                    info!(?id, remote = %connection.remote_address(), "connection established");
                    let (to_client, from_relay) = unbounded_channel();

                    // Same channel as the peer's messages, so the relay sees the registration first
                    if to_relay.send((id, ClientToServer::Registered(to_client))).is_err() {
                        error!(?id, "failed to register peer channel");
                        return;
                    }

                    per_client_network_io_task(id, connection, to_relay, from_relay).await;
                }
                Err(e) => {
                    error!("failed to establish connection: {e}");
                }
            }
        });
    }
}

// ============================================================================
// Per Client Network I/O Task
// ============================================================================

// Event from the accept task or a per-peer network I/O task to the relay
#[derive(Debug)]
pub enum ClientToServer {
    Registered(UnboundedSender<ServerToClient>),
    Message(ClientMessage),
    Disconnected,
}

// Message from the relay to a per-peer network I/O task
#[derive(Debug)]
pub enum ServerToClient {
    Send(ServerMessage),
    Close,
}

#[instrument(skip(connection, to_relay, from_relay))]
pub async fn per_client_network_io_task(
    id: PlayerId,
    connection: Connection,
    to_relay: UnboundedSender<(PlayerId, ClientToServer)>,
    mut from_relay: UnboundedReceiver<ServerToClient>,
) {
    let stream = MessageStream::new(&connection);

    // Each direction runs as one future so that a message read half-way is never dropped by the
    // other direction becoming ready
    let receiving = async {
        while handle_incoming(id, stream.recv_bytes().await, &to_relay) {}
    };
    let sending = async {
        while handle_relay_command(id, from_relay.recv().await, &connection, &stream).await {}
    };
    tokio::select! {
        () = receiving => {}
        () = sending => {}
    }

    // Ensure disconnect notification is sent before task exits
    debug!("network task exiting");
    let _ = to_relay.send((id, ClientToServer::Disconnected));
}

// Returns false when the connection is gone
fn handle_incoming(
    id: PlayerId,
    result: Result<Vec<u8>, Error>,
    to_relay: &UnboundedSender<(PlayerId, ClientToServer)>,
) -> bool {
    match result {
        Ok(data) => match decode_message::<ClientMessage>(&data) {
            Ok(msg) => {
                trace!(tag = msg.tag(), "received message");
                to_relay
                    .send((id, ClientToServer::Message(msg)))
                    .map_err(|e| error!("error sending to relay: {e}"))
                    .is_ok()
            }
            Err(e) => {
                warn!(len = data.len(), "discarding malformed message: {e:#}");
                true
            }
        },
        Err(err) => {
            if let Some(conn_err) = err.downcast_ref::<ConnectionError>() {
                match conn_err {
                    ConnectionError::ApplicationClosed { .. } => debug!("peer closed connection"),
                    ConnectionError::TimedOut => debug!("peer timed out"),
                    ConnectionError::LocallyClosed => debug!("connection closed locally"),
                    _ => error!("connection error: {err}"),
                }
            } else {
                error!("error receiving: {err}");
            }
            false
        }
    }
}

async fn handle_relay_command(
    id: PlayerId,
    cmd: Option<ServerToClient>,
    connection: &Connection,
    stream: &MessageStream<'_>,
) -> bool {
    match cmd {
        Some(ServerToClient::Send(msg)) => {
            trace!(tag = msg.tag(), "sending message");
            stream
                .send(&msg)
                .await
                .map_err(|e| warn!(?id, "error sending: {e}"))
                .is_ok()
        }
        Some(ServerToClient::Close) => {
            debug!("closing connection");
            connection.close(0u32.into(), b"relay closing");
            false
        }
        None => {
            debug!("relay channel closed");
            false
        }
    }
}
