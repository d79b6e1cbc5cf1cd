//! Core session server implementation.
//!
//! This module contains the main `SessionServer` struct and its
//! implementation, providing the central orchestration of all server
//! components: the TCP accept loop, connection management, and the
//! session coordinator.

use crate::{
    config::ServerConfig,
    connection::ConnectionManager,
    error::ServerError,
    server::handlers::handle_connection,
    session::SessionCoordinator,
    shutdown::ShutdownState,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// The core session server structure.
///
/// `SessionServer` orchestrates networking and session state: it owns the
/// accept loop, the connection manager, and the session coordinator that
/// holds all matchmaking and game state. All session state is constructed
/// here and injected into connection handlers rather than living in
/// process-wide globals, so multiple servers can coexist in one process
/// (each test builds its own).
///
/// # Architecture
///
/// * **Connection Management**: WebSocket connection lifecycle and frame
///   delivery
/// * **Session Coordinator**: presence, matchmaking, game rules, history
/// * **Accept Loop**: single TCP listener with optional graceful shutdown
pub struct SessionServer {
    /// Server configuration settings
    config: ServerConfig,

    /// Manager for client connections and messaging
    connection_manager: Arc<ConnectionManager>,

    /// Coordinator for all session state
    coordinator: Arc<SessionCoordinator>,

    /// Channel for coordinating server shutdown
    shutdown_sender: broadcast::Sender<()>,
}

impl SessionServer {
    /// Creates a new session server with the specified configuration.
    ///
    /// Initializes the connection manager and an empty session coordinator.
    /// The server is ready to start after construction.
    pub fn new(config: ServerConfig) -> Self {
        let connection_manager = Arc::new(ConnectionManager::new());
        let coordinator = Arc::new(SessionCoordinator::new(config.history_capacity));
        let (shutdown_sender, _) = broadcast::channel(1);

        Self {
            config,
            connection_manager,
            coordinator,
            shutdown_sender,
        }
    }

    /// Starts the server and begins accepting connections with graceful
    /// shutdown support.
    ///
    /// Runs until the provided shutdown state is initiated (typically by a
    /// signal handler) or [`SessionServer::shutdown`] is called.
    pub async fn start_with_shutdown_state(
        &self,
        shutdown_state: ShutdownState,
    ) -> Result<(), ServerError> {
        self.start_internal(Some(shutdown_state)).await
    }

    /// Starts the server and begins accepting connections.
    ///
    /// Runs until [`SessionServer::shutdown`] is called or the listener
    /// fails.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_internal(None).await
    }

    /// Internal method for starting the server with optional shutdown state.
    async fn start_internal(&self, shutdown_state: Option<ShutdownState>) -> Result<(), ServerError> {
        info!("🚀 Starting session server on {}", self.config.bind_address);

        let listener = tokio::net::TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| {
                ServerError::Network(format!(
                    "Failed to bind {}: {e}",
                    self.config.bind_address
                ))
            })?;
        info!("✅ Listening on {}", self.config.bind_address);

        let mut shutdown_receiver = self.shutdown_sender.subscribe();

        let accept_loop = {
            let connection_manager = self.connection_manager.clone();
            let coordinator = self.coordinator.clone();
            let max_connections = self.config.max_connections;
            let shutdown_state = shutdown_state.clone();

            async move {
                loop {
                    if let Some(ref shutdown_state) = shutdown_state {
                        if shutdown_state.is_shutdown_initiated() {
                            info!("🛑 Accept loop stopping - shutdown initiated");
                            break;
                        }
                    }

                    match listener.accept().await {
                        Ok((stream, addr)) => {
                            if connection_manager.connection_count().await >= max_connections {
                                warn!(
                                    "🚫 Connection limit {} reached, refusing {}",
                                    max_connections, addr
                                );
                                drop(stream);
                                continue;
                            }

                            let connection_manager = connection_manager.clone();
                            let coordinator = coordinator.clone();

                            // Spawn individual connection handler
                            tokio::spawn(async move {
                                if let Err(e) =
                                    handle_connection(stream, addr, connection_manager, coordinator)
                                        .await
                                {
                                    error!("Connection error: {:?}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            break;
                        }
                    }
                }
            }
        };

        // Run until shutdown is initiated or internal shutdown signal
        tokio::select! {
            _ = accept_loop => {}
            _ = shutdown_receiver.recv() => {
                info!("Internal shutdown signal received");
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Initiates server shutdown.
    ///
    /// Signals the accept loop to stop. Existing connections drain as their
    /// handlers observe the closed sockets.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        info!("🛑 Shutting down server...");
        let _ = self.shutdown_sender.send(());
        Ok(())
    }

    /// Gets the connection manager for this server.
    pub fn connection_manager(&self) -> Arc<ConnectionManager> {
        self.connection_manager.clone()
    }

    /// Gets the session coordinator for this server.
    pub fn coordinator(&self) -> Arc<SessionCoordinator> {
        self.coordinator.clone()
    }
}
