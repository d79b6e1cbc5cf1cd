//! Game session logic: presence, matchmaking, board rules, and history.

pub mod board;
pub mod coordinator;
pub mod history;
pub mod match_store;
pub mod presence;

pub use board::{Board, Mark};
pub use coordinator::{Outbound, SessionCoordinator};
pub use history::{HistoryEntry, HistoryLedger, DEFAULT_HISTORY_CAPACITY};
pub use match_store::{GameMatch, MatchId, MatchStore};
pub use presence::{Player, PresenceRegistry};
