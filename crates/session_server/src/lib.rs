//! # Session Server - Real-Time Matchmaking and Game Sessions
//!
//! A WebSocket session server for two-player turn-based matches. The server
//! handles presence, invitations, authoritative game state, rematches, and
//! a bounded match history, all over a simple JSON frame protocol.
//!
//! ## Design Philosophy
//!
//! The server is the single source of truth for every outcome. Clients
//! propose actions (register, invite, move, abandon); the server validates
//! each one against its own state machine and either applies it and
//! notifies the affected connections, or silently ignores it. A
//! client-reported result is never trusted.
//!
//! ## Architecture Overview
//!
//! ### Core Components
//!
//! * **Connection Manager** - WebSocket lifecycle and frame delivery
//! * **Session Coordinator** - presence registry, match store, game rules,
//!   and the history ledger behind one state lock
//! * **Message Router** - parses client frames and delivers outbound batches
//!
//! ### Message Flow
//!
//! 1. Client sends a WebSocket text frame `{"event": ..., "data": ...}`
//! 2. The router parses it into a typed [`messaging::ClientEvent`]
//! 3. The coordinator applies it as one atomic step against session state
//! 4. The resulting outbound batch is delivered: targeted frames through
//!    the connection manager, roster and history updates as broadcasts
//!
//! ## Error Handling
//!
//! The server uses structured error types ([`ServerError`]) to categorize
//! failures:
//!
//! * **Network errors** - Connection, binding, and protocol issues
//! * **Internal errors** - State handling problems
//!
//! Semantically invalid client requests (out-of-turn moves, invites to
//! busy players) are not errors; they are dropped without closing the
//! connection.
//!
//! ## Thread Safety
//!
//! * Connection management uses `Arc<RwLock<HashMap>>` for thread-safe state
//! * All session state lives behind a single `RwLock` in the coordinator,
//!   making each client event an atomic step

// Re-export core types and functions for easy access
pub use config::ServerConfig;
pub use error::ServerError;
pub use server::SessionServer;
pub use shutdown::ShutdownState;
pub use utils::{create_server, create_server_with_config};

// Public module declarations
pub mod config;
pub mod connection;
pub mod error;
pub mod messaging;
pub mod server;
pub mod session;
pub mod shutdown;
pub mod utils;

mod tests;
