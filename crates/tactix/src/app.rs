//! Main application logic and lifecycle management.
//!
//! This module contains the core `Application` struct that orchestrates
//! server startup, monitoring, and shutdown.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    logging::display_banner,
    signals::{setup_signal_handlers, setup_signal_handlers_silent},
};
use session_server::{SessionServer, ShutdownState};
use tracing::{error, info, warn};

/// Main application struct with monitoring capabilities.
///
/// The `Application` struct manages the complete lifecycle of the Tactix
/// server, including configuration loading, server initialization, health
/// monitoring, and graceful shutdown handling.
///
/// # Architecture
///
/// * **Configuration Management**: Loads and validates configuration from
///   files and CLI
/// * **Server Orchestration**: Initializes and manages the session server
///   instance
/// * **Health Monitoring**: Periodic statistics about connections and
///   matches
/// * **Graceful Shutdown**: Handles termination signals and cleanup
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// Session server instance
    server: SessionServer,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// Loads configuration, applies CLI overrides, validates settings, and
    /// initializes the session server.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Initialize session server with configuration
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        // Apply CLI overrides
        if let Some(bind_address) = args.bind_address {
            config.server.bind_address = bind_address;
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        // Validate configuration
        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        } else {
            info!("✅ Configuration loaded and validated successfully");
        }

        // Display banner after logging is setup
        display_banner();

        let server_config = config.to_server_config()?;
        let server = SessionServer::new(server_config);

        info!(
            "📂 Config: {} | History capacity: {}",
            args.config_path.display(),
            config.game.history_capacity
        );

        Ok(Self { config, server })
    }

    /// Runs the application until a shutdown signal arrives.
    ///
    /// Starts the server, sets up a monitoring task, waits for shutdown
    /// signals, and performs graceful cleanup.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Tactix Session Server Application");

        self.log_configuration_summary();

        // Get references for monitoring before moving the server
        let connection_manager = self.server.connection_manager();
        let coordinator = self.server.coordinator();
        let config = self.config.clone();

        // Create shutdown state for coordinated shutdown
        let shutdown_state = ShutdownState::new();
        let shutdown_state_for_server = shutdown_state.clone();

        // Start server in background
        let server_handle = {
            let server = self.server;
            tokio::spawn(async move {
                match server.start_with_shutdown_state(shutdown_state_for_server).await {
                    Ok(()) => {
                        info!("✅ Server completed successfully");
                    }
                    Err(e) => {
                        error!("❌ Server error: {:?}", e);
                        std::process::exit(1);
                    }
                }
            })
        };

        // Start monitoring task for real-time statistics
        let monitoring_handle = {
            let connection_manager = connection_manager.clone();
            let coordinator = coordinator.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(60));

                loop {
                    interval.tick().await;

                    info!(
                        "📊 System Health - {} connections | {} registered players | {} active matches",
                        connection_manager.connection_count().await,
                        coordinator.roster().await.len(),
                        coordinator.active_matches().await
                    );
                }
            })
        };

        // Display ready message
        info!("✅ Tactix Server is now running!");
        info!(
            "🎮 Ready to accept connections on {}",
            config.server.bind_address
        );
        info!("🔍 Health monitoring active - stats every 60 seconds");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        // Wait for shutdown signal - this will update the shared shutdown state
        let signal_shutdown_state = setup_signal_handlers().await?;

        // merciless shutdown
        tokio::spawn(async move {
            if let Err(e) = setup_signal_handlers_silent().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        // Transfer shutdown state to our server's shutdown state
        if signal_shutdown_state.is_shutdown_initiated() {
            shutdown_state.initiate_shutdown();
        }

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");

        // Stop the monitoring first, then the accept loop
        monitoring_handle.abort();

        server_handle.abort();
        info!("⏳ Waiting for server task to complete gracefully...");
        if let Err(e) =
            tokio::time::timeout(tokio::time::Duration::from_secs(8), server_handle).await
        {
            warn!(
                "⏰ Server task did not complete within timeout, proceeding with cleanup: {:?}",
                e
            );
        } else {
            info!("✅ Server task completed gracefully");
        }

        // Give time for connection cleanup
        info!("⏳ Waiting for connections to close...");
        tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;

        // Display final statistics
        info!("📊 Final Statistics:");
        info!("  - Matches in history: {}", coordinator.history().await.len());
        info!("  - Registered players: {}", coordinator.roster().await.len());

        info!("✅ Tactix Session Server shutdown complete");
        info!("👋 Thank you for using Tactix!");

        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!("  👥 Max connections: {}", self.config.server.max_connections);
        info!("  📜 History capacity: {}", self.config.game.history_capacity);
    }
}
