//! Routing of incoming client frames into the session coordinator.
//!
//! Each text frame is parsed as a [`ClientEvent`], handed to the
//! coordinator as one atomic step, and the outbound batch the coordinator
//! returns is delivered through the connection manager. Sends are
//! fire-and-forget: a slow or gone recipient never stalls the sender's
//! handler.

use crate::connection::{ConnectionId, ConnectionManager};
use crate::error::ServerError;
use crate::messaging::types::ClientEvent;
use crate::session::coordinator::{Outbound, SessionCoordinator};
use tracing::{error, trace};

/// Parses and dispatches one client frame.
///
/// Returns an error only for frames that are not valid protocol JSON;
/// semantically invalid requests (out-of-turn moves, invites to busy
/// players) are silent no-ops inside the coordinator.
pub async fn route_client_message(
    text: &str,
    connection_id: ConnectionId,
    connection_manager: &ConnectionManager,
    coordinator: &SessionCoordinator,
) -> Result<(), ServerError> {
    let event: ClientEvent = serde_json::from_str(text)
        .map_err(|e| ServerError::Network(format!("Invalid JSON: {e}")))?;

    trace!("📨 Routing {:?} from connection {}", event, connection_id);
    let batch = coordinator.handle_event(connection_id, event).await;
    deliver(batch, connection_manager).await;
    Ok(())
}

/// Delivers an outbound batch produced by a coordinator operation.
///
/// Serialization failures are logged and the frame skipped; they cannot
/// occur for well-formed server events but must not take down the handler.
pub async fn deliver(batch: Vec<Outbound>, connection_manager: &ConnectionManager) {
    for outbound in batch {
        match outbound {
            Outbound::To(target, event) => match serde_json::to_vec(&event) {
                Ok(bytes) => {
                    connection_manager.send_to_connection(target, bytes).await;
                }
                Err(e) => error!("Failed to serialize event for connection {}: {}", target, e),
            },
            Outbound::Broadcast(event) => match serde_json::to_vec(&event) {
                Ok(bytes) => {
                    connection_manager.broadcast_to_all(bytes).await;
                }
                Err(e) => error!("Failed to serialize broadcast event: {}", e),
            },
        }
    }
}
