//! Message type definitions for client-server communication.
//!
//! Every frame on the wire is one JSON object of the shape
//! `{"event": <name>, "data": <payload>}`. Unit events omit `data`.
//! Unknown fields in payloads are ignored so older clients that send
//! extra context (e.g. a redundant sender ID) keep working.

use crate::connection::ConnectionId;
use crate::session::board::{Mark, BOARD_CELLS};
use crate::session::history::HistoryEntry;
use serde::{Deserialize, Serialize};

/// A message sent from a client to the server.
///
/// # Examples
///
/// ```json
/// {"event": "register", "data": {"name": "Alice"}}
/// {"event": "gameInvite", "data": {"to": 3}}
/// {"event": "move", "data": {"index": 4}}
/// {"event": "abandonGame"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Creates or updates the player record for this connection
    Register { name: String },
    /// Invites another idle player into a match
    GameInvite { to: ConnectionId },
    /// Accepts a previously received invitation
    #[serde(rename_all = "camelCase")]
    AcceptInvite { from_id: ConnectionId },
    /// Attempts a move at the given cell index
    Move { index: usize },
    /// Legacy client-reported outcome; accepted for compatibility but
    /// ignored, the server derives outcomes from its own state machine
    GameEnded {
        #[serde(default)]
        winner: Option<String>,
        #[serde(default)]
        players: Option<serde_json::Value>,
    },
    /// Requests the current history ledger
    GetHistory,
    /// Abandons the caller's active match
    AbandonGame,
    /// Asks the opponent of an ended match for a rematch
    RequestRematch,
    /// Accepts a pending rematch, resetting the match to active
    AcceptRematch,
}

/// A message sent from the server to one or all clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Sent once after the handshake so the client learns its own
    /// connection identity (used to filter itself out of the roster)
    #[serde(rename_all = "camelCase")]
    Welcome { socket_id: ConnectionId },
    /// Full roster snapshot, broadcast on every registry mutation
    PlayersList(Vec<RosterEntry>),
    /// Invitation prompt, sent only to the invited player
    #[serde(rename_all = "camelCase")]
    GameInvitation { from: String, from_id: ConnectionId },
    /// Match created; sent to both participants with their own symbol
    GameStart {
        opponent: String,
        symbol: Mark,
        #[serde(rename = "match")]
        snapshot: MatchSnapshot,
    },
    /// A validated move, relayed to both participants
    #[serde(rename_all = "camelCase")]
    MoveMade {
        index: usize,
        symbol: Mark,
        current_turn: ConnectionId,
    },
    /// Server-derived terminal outcome; `winner` is `None` for a draw
    GameOver { winner: Option<String> },
    /// History ledger broadcast to all connections on any change
    HistoryUpdated(Vec<HistoryEntry>),
    /// On-demand history fetch response, sent to the requester only
    HistoryReceived(Vec<HistoryEntry>),
    /// Sent to the remaining player when the opponent abandons
    OpponentAbandoned { quitter: String },
    /// Sent to the player who abandoned
    YouAbandoned { other: String },
    /// Rematch prompt relayed to the other participant
    RematchRequested { from: String },
    /// Rematch accepted; both participants receive the fresh match state
    RematchAccepted {
        #[serde(rename = "match")]
        snapshot: MatchSnapshot,
    },
}

/// One roster line in a `playersList` broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub name: String,
    pub socket_id: ConnectionId,
    pub in_game: bool,
}

/// One participant in a match snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatSnapshot {
    pub name: String,
    pub socket_id: ConnectionId,
    pub symbol: Mark,
}

/// Wire representation of a match, carried by `gameStart` and
/// `rematchAccepted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub players: Vec<SeatSnapshot>,
    pub board: [Option<Mark>; BOARD_CELLS],
    pub current_turn: ConnectionId,
}
