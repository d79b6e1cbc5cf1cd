//! Connection handling logic for WebSocket clients.
//!
//! This module contains the core connection handling logic that manages
//! the lifecycle of individual client connections, including WebSocket
//! handshaking, message processing, and cleanup.

use crate::{
    connection::ConnectionManager,
    error::ServerError,
    messaging::{deliver, route_client_message},
    messaging::types::ServerEvent,
    session::SessionCoordinator,
};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, trace};

/// Handles a single client connection from establishment to cleanup.
///
/// Manages the complete lifecycle of a client connection: WebSocket
/// handshake, connection registration, the welcome frame, message routing,
/// and cleanup when the connection ends.
///
/// # Connection Flow
///
/// 1. Perform WebSocket handshake
/// 2. Register connection with the connection manager
/// 3. Subscribe to outgoing frames, then send `welcome` with the assigned ID
/// 4. Run message handling tasks (incoming and outgoing) until close
/// 5. Release presence and match state through the coordinator
///
/// The subscription happens before the welcome frame is queued so the
/// welcome is never lost to a race with the outgoing task startup.
///
/// # Message Handling
///
/// Two concurrent tasks run until the connection is closed or errors:
///
/// * **Incoming task**: parses client frames and routes them through the
///   coordinator
/// * **Outgoing task**: receives queued frames from the connection manager
///   and forwards those addressed to this connection
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    connection_manager: Arc<ConnectionManager>,
    coordinator: Arc<SessionCoordinator>,
) -> Result<(), ServerError> {
    // Perform WebSocket handshake
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| ServerError::Network(format!("WebSocket handshake failed: {e}")))?;

    let (ws_sender, mut ws_receiver) = ws_stream.split();
    let ws_sender = Arc::new(tokio::sync::Mutex::new(ws_sender));
    let connection_id = connection_manager.add_connection(addr).await;

    let mut message_receiver = connection_manager.subscribe();

    // Tell the client its own identity before anything else
    let welcome = ServerEvent::Welcome {
        socket_id: connection_id,
    };
    match serde_json::to_vec(&welcome) {
        Ok(bytes) => connection_manager.send_to_connection(connection_id, bytes).await,
        Err(e) => error!("Failed to serialize welcome frame: {}", e),
    }

    let ws_sender_incoming = ws_sender.clone();
    let ws_sender_outgoing = ws_sender.clone();

    // Incoming message task - routes client frames through the coordinator
    let incoming_task = {
        let connection_manager = connection_manager.clone();
        let coordinator = coordinator.clone();

        async move {
            while let Some(msg) = ws_receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if let Err(e) = route_client_message(
                            &text,
                            connection_id,
                            &connection_manager,
                            &coordinator,
                        )
                        .await
                        {
                            trace!("❌ Message routing error: {}", e);
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("🔌 Client {} requested close", connection_id);
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        let mut ws_sender = ws_sender_incoming.lock().await;
                        let _ = ws_sender.send(Message::Pong(data)).await;
                    }
                    Err(e) => {
                        error!("WebSocket error for connection {}: {}", connection_id, e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    };

    // Outgoing message task - forwards frames addressed to this connection
    let outgoing_task = {
        let ws_sender = ws_sender_outgoing;
        async move {
            while let Ok((target_connection_id, message)) = message_receiver.recv().await {
                if target_connection_id == connection_id {
                    let message_text = String::from_utf8_lossy(&message);
                    let mut ws_sender = ws_sender.lock().await;
                    if let Err(e) = ws_sender
                        .send(Message::Text(message_text.to_string().into()))
                        .await
                    {
                        error!("Failed to send message: {}", e);
                        break;
                    }
                }
            }
        }
    };

    // Run both tasks concurrently until one completes
    tokio::select! {
        _ = incoming_task => {},
        _ = outgoing_task => {},
    }

    // A disconnect mid-match counts as abandonment; the coordinator
    // produces the notifications for whoever is left.
    let batch = coordinator.disconnect(connection_id).await;
    deliver(batch, &connection_manager).await;

    connection_manager.remove_connection(connection_id).await;
    Ok(())
}
