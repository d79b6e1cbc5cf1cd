//! Connection management for client connections.
//!
//! This module handles the lifecycle of client connections, including
//! connection tracking and outgoing message routing.

pub mod client;
pub mod manager;

pub use manager::ConnectionManager;

/// Type alias for connection identifiers.
///
/// Connection IDs are used to uniquely identify client connections
/// throughout their lifecycle on the server. They double as the player
/// identity everywhere in the session coordinator.
pub type ConnectionId = usize;
