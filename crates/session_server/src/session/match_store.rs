//! Active match state: participants, board, turn pointer, lifecycle phase.

use crate::connection::ConnectionId;
use crate::messaging::types::{MatchSnapshot, SeatSnapshot};
use crate::session::board::{Board, Mark};
use std::collections::HashMap;

/// Unique identifier for a match within this process.
pub type MatchId = u64;

/// One participant's seat in a match.
///
/// The name is captured at match creation so abandonment and history
/// records survive the player disconnecting mid-match.
#[derive(Debug, Clone)]
pub struct Seat {
    pub conn: ConnectionId,
    pub name: String,
    pub mark: Mark,
}

/// Terminal outcome of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A winning triple was completed by this mark
    Won(Mark),
    /// All 9 cells filled with no winner
    Draw,
    /// One side left an active match
    Abandoned,
}

/// Lifecycle phase of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    Active,
    Ended(Outcome),
}

/// A two-player match.
///
/// Seat 0 is always the inviter and holds `Mark::X`; the turn pointer
/// starts there and a rematch resets it there (stable identity, not
/// renegotiated).
#[derive(Debug, Clone)]
pub struct GameMatch {
    pub id: MatchId,
    pub seats: [Seat; 2],
    pub board: Board,
    /// Connection permitted to move next; always one of the two seats
    pub turn: ConnectionId,
    pub phase: MatchPhase,
}

impl GameMatch {
    fn new(id: MatchId, inviter: (ConnectionId, String), accepter: (ConnectionId, String)) -> Self {
        let seats = [
            Seat {
                conn: inviter.0,
                name: inviter.1,
                mark: Mark::X,
            },
            Seat {
                conn: accepter.0,
                name: accepter.1,
                mark: Mark::O,
            },
        ];
        Self {
            id,
            turn: seats[0].conn,
            seats,
            board: Board::new(),
            phase: MatchPhase::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == MatchPhase::Active
    }

    /// Returns the seat occupied by `conn`, if it is a participant.
    pub fn seat_of(&self, conn: ConnectionId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.conn == conn)
    }

    /// Returns the other participant's seat.
    pub fn opponent_of(&self, conn: ConnectionId) -> Option<&Seat> {
        self.seat_of(conn)?;
        self.seats.iter().find(|s| s.conn != conn)
    }

    /// Resets the board and turn pointer for a rematch and reactivates
    /// the match. The original first-mover keeps the first turn.
    pub fn reset_for_rematch(&mut self) {
        self.board.reset();
        self.turn = self.seats[0].conn;
        self.phase = MatchPhase::Active;
    }

    /// Builds the wire snapshot sent in `gameStart` and `rematchAccepted`.
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            players: self
                .seats
                .iter()
                .map(|s| SeatSnapshot {
                    name: s.name.clone(),
                    socket_id: s.conn,
                    symbol: s.mark,
                })
                .collect(),
            board: self.board.cells(),
            current_turn: self.turn,
        }
    }
}

/// Store of all matches, active and ended-awaiting-rematch.
///
/// Keeps a `ConnectionId -> MatchId` index so per-move lookups are O(1)
/// instead of scanning the match list.
#[derive(Debug, Default)]
pub struct MatchStore {
    matches: HashMap<MatchId, GameMatch>,
    by_conn: HashMap<ConnectionId, MatchId>,
    next_id: MatchId,
}

impl MatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new active match between `inviter` and `accepter`.
    ///
    /// Both connections must not already be indexed; the coordinator
    /// enforces the no-double-booking invariant before calling this.
    pub fn create(
        &mut self,
        inviter: (ConnectionId, String),
        accepter: (ConnectionId, String),
    ) -> &GameMatch {
        let id = self.next_id;
        self.next_id += 1;
        self.by_conn.insert(inviter.0, id);
        self.by_conn.insert(accepter.0, id);
        self.matches
            .entry(id)
            .or_insert_with(|| GameMatch::new(id, inviter, accepter))
    }

    /// Looks up the match `conn` participates in.
    pub fn get_by_conn(&self, conn: ConnectionId) -> Option<&GameMatch> {
        let id = self.by_conn.get(&conn)?;
        self.matches.get(id)
    }

    /// Mutable variant of [`MatchStore::get_by_conn`].
    pub fn get_by_conn_mut(&mut self, conn: ConnectionId) -> Option<&mut GameMatch> {
        let id = self.by_conn.get(&conn)?;
        self.matches.get_mut(id)
    }

    /// Removes the match `conn` participates in, clearing both index
    /// entries. Returns the removed match.
    pub fn remove_for(&mut self, conn: ConnectionId) -> Option<GameMatch> {
        let id = self.by_conn.remove(&conn)?;
        let game = self.matches.remove(&id)?;
        for seat in &game.seats {
            self.by_conn.remove(&seat.conn);
        }
        Some(game)
    }

    /// Returns the number of currently active matches.
    pub fn active_count(&self) -> usize {
        self.matches.values().filter(|m| m.is_active()).count()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
