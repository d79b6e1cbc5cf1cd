//! Session coordinator: the single owner of all shared session state.
//!
//! The presence registry, match store, and history ledger are constructed
//! once and injected here rather than living in process-wide globals, so
//! unit tests can build isolated instances. Every operation takes the
//! state write lock for the full duration of its mutation, making each
//! handler step atomic; the returned outbound batch is delivered after the
//! guard drops, as fire-and-forget sends.
//!
//! No timeouts are enforced anywhere: invitations, pending rematch
//! requests, and turns stay open until acted on or until a participant
//! disconnects. Under heavy churn that means stale ended matches can
//! linger until a disconnect or a new invite sweeps them out.

use crate::connection::ConnectionId;
use crate::messaging::types::{ClientEvent, RosterEntry, ServerEvent};
use crate::session::history::{HistoryEntry, HistoryLedger};
use crate::session::match_store::{MatchPhase, MatchStore, Outcome};
use crate::session::presence::{Player, PresenceRegistry};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, trace};

/// An outbound message produced by a coordinator operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Targeted send to a single connection
    To(ConnectionId, ServerEvent),
    /// Fan-out to every connected client
    Broadcast(ServerEvent),
}

/// Coordinates presence, matchmaking, game state, and history for every
/// connection on this server.
#[derive(Debug)]
pub struct SessionCoordinator {
    state: RwLock<CoordinatorState>,
}

#[derive(Debug)]
struct CoordinatorState {
    registry: PresenceRegistry,
    matches: MatchStore,
    history: HistoryLedger,
}

impl SessionCoordinator {
    /// Creates a coordinator with an empty registry and match store and a
    /// history ledger retaining `history_capacity` entries.
    pub fn new(history_capacity: usize) -> Self {
        Self {
            state: RwLock::new(CoordinatorState {
                registry: PresenceRegistry::new(),
                matches: MatchStore::new(),
                history: HistoryLedger::new(history_capacity),
            }),
        }
    }

    /// Dispatches a parsed client event to the matching operation.
    pub async fn handle_event(&self, conn: ConnectionId, event: ClientEvent) -> Vec<Outbound> {
        match event {
            ClientEvent::Register { name } => self.register(conn, name).await,
            ClientEvent::GameInvite { to } => self.invite(conn, to).await,
            ClientEvent::AcceptInvite { from_id } => self.accept_invite(conn, from_id).await,
            ClientEvent::Move { index } => self.apply_move(conn, index).await,
            ClientEvent::GameEnded { .. } => {
                // The server derives outcomes from its own state machine;
                // the client-reported outcome is not trusted.
                debug!("Ignoring client-reported gameEnded from connection {}", conn);
                Vec::new()
            }
            ClientEvent::GetHistory => self.get_history(conn).await,
            ClientEvent::AbandonGame => self.abandon(conn).await,
            ClientEvent::RequestRematch => self.request_rematch(conn).await,
            ClientEvent::AcceptRematch => self.accept_rematch(conn).await,
        }
    }

    /// Creates or overwrites the player record for `conn` and broadcasts
    /// the roster.
    pub async fn register(&self, conn: ConnectionId, name: String) -> Vec<Outbound> {
        let mut state = self.state.write().await;
        state.register(conn, name)
    }

    /// Forwards an invitation to an idle target player.
    pub async fn invite(&self, from: ConnectionId, to: ConnectionId) -> Vec<Outbound> {
        let mut state = self.state.write().await;
        state.invite(from, to)
    }

    /// Accepts an invitation, pairing both players into a fresh match.
    pub async fn accept_invite(&self, conn: ConnectionId, from_id: ConnectionId) -> Vec<Outbound> {
        let mut state = self.state.write().await;
        state.accept_invite(conn, from_id)
    }

    /// Validates and applies a move, relaying it to both participants.
    pub async fn apply_move(&self, conn: ConnectionId, index: usize) -> Vec<Outbound> {
        let mut state = self.state.write().await;
        state.apply_move(conn, index)
    }

    /// Terminates the caller's active match, declaring the opponent winner.
    pub async fn abandon(&self, conn: ConnectionId) -> Vec<Outbound> {
        let mut state = self.state.write().await;
        state.abandon(conn)
    }

    /// Relays a rematch prompt for an ended match to the other seat.
    pub async fn request_rematch(&self, conn: ConnectionId) -> Vec<Outbound> {
        let mut state = self.state.write().await;
        state.request_rematch(conn)
    }

    /// Resets an ended match back to active for a rematch.
    pub async fn accept_rematch(&self, conn: ConnectionId) -> Vec<Outbound> {
        let mut state = self.state.write().await;
        state.accept_rematch(conn)
    }

    /// Answers an on-demand history fetch.
    pub async fn get_history(&self, conn: ConnectionId) -> Vec<Outbound> {
        let state = self.state.read().await;
        vec![Outbound::To(
            conn,
            ServerEvent::HistoryReceived(state.history.entries()),
        )]
    }

    /// Releases the presence entry for a closed connection.
    ///
    /// A disconnect while in an active match is treated as an implicit
    /// abandonment: the remaining player wins and the match is recorded
    /// as abandoned. A disconnect while a match is merely ended (awaiting
    /// rematch) discards the match silently.
    pub async fn disconnect(&self, conn: ConnectionId) -> Vec<Outbound> {
        let mut state = self.state.write().await;
        state.disconnect(conn)
    }

    /// Returns the player registered under `conn`, if any.
    pub async fn player(&self, conn: ConnectionId) -> Option<Player> {
        let state = self.state.read().await;
        state.registry.get(conn).cloned()
    }

    /// Returns the current roster snapshot.
    pub async fn roster(&self) -> Vec<RosterEntry> {
        let state = self.state.read().await;
        state.registry.roster()
    }

    /// Returns the current history entries, newest first.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        let state = self.state.read().await;
        state.history.entries()
    }

    /// Returns the number of currently active matches.
    pub async fn active_matches(&self) -> usize {
        let state = self.state.read().await;
        state.matches.active_count()
    }
}

impl CoordinatorState {
    fn register(&mut self, conn: ConnectionId, name: String) -> Vec<Outbound> {
        self.registry.register(conn, name);
        // Re-registration must not clear the busy flag of a player who is
        // still seated in an active match.
        if let Some(game) = self.matches.get_by_conn(conn) {
            if game.is_active() {
                self.registry.set_busy(conn, true);
            }
        }
        info!("👋 Player registered on connection {}", conn);
        vec![self.roster_broadcast()]
    }

    fn invite(&mut self, from: ConnectionId, to: ConnectionId) -> Vec<Outbound> {
        let Some(inviter) = self.registry.get(from) else {
            trace!("Invite from unregistered connection {} dropped", from);
            return Vec::new();
        };
        match self.registry.get(to) {
            Some(target) if !target.busy => vec![Outbound::To(
                to,
                ServerEvent::GameInvitation {
                    from: inviter.name.clone(),
                    from_id: from,
                },
            )],
            _ => {
                trace!("Invite from {} to absent or busy target {} dropped", from, to);
                Vec::new()
            }
        }
    }

    fn accept_invite(&mut self, conn: ConnectionId, from_id: ConnectionId) -> Vec<Outbound> {
        if conn == from_id {
            return Vec::new();
        }
        // The inviter may have disconnected between invite and accept;
        // acceptance must fail gracefully in that case.
        let (inviter_name, accepter_name) = match (self.registry.get(from_id), self.registry.get(conn)) {
            (Some(inviter), Some(accepter)) if !inviter.busy && !accepter.busy => {
                (inviter.name.clone(), accepter.name.clone())
            }
            _ => {
                trace!(
                    "Accept from {} for vanished or busy inviter {} dropped",
                    conn,
                    from_id
                );
                return Vec::new();
            }
        };

        // Any lingering ended matches (pending rematch) are voided once
        // either player enters a new pairing.
        self.matches.remove_for(conn);
        self.matches.remove_for(from_id);

        self.registry.set_busy(from_id, true);
        self.registry.set_busy(conn, true);

        let game = self
            .matches
            .create((from_id, inviter_name.clone()), (conn, accepter_name.clone()));
        let snapshot = game.snapshot();
        let (inviter_mark, accepter_mark) = (game.seats[0].mark, game.seats[1].mark);
        info!(
            "🎮 Match {} started: {} (X) vs {} (O)",
            game.id, inviter_name, accepter_name
        );

        vec![
            Outbound::To(
                from_id,
                ServerEvent::GameStart {
                    opponent: accepter_name,
                    symbol: inviter_mark,
                    snapshot: snapshot.clone(),
                },
            ),
            Outbound::To(
                conn,
                ServerEvent::GameStart {
                    opponent: inviter_name,
                    symbol: accepter_mark,
                    snapshot,
                },
            ),
            self.roster_broadcast(),
        ]
    }

    fn apply_move(&mut self, conn: ConnectionId, index: usize) -> Vec<Outbound> {
        let Some(game) = self.matches.get_by_conn_mut(conn) else {
            trace!("Move from {} with no associated match dropped", conn);
            return Vec::new();
        };
        if !game.is_active() || game.turn != conn {
            trace!("Out-of-turn or post-game move from {} dropped", conn);
            return Vec::new();
        }
        let Some(seat) = game.seat_of(conn) else {
            return Vec::new();
        };
        let mark = seat.mark;
        let mover_name = seat.name.clone();
        let Some(opponent) = game.opponent_of(conn) else {
            return Vec::new();
        };
        let opponent_conn = opponent.conn;

        if !game.board.place(index, mark) {
            trace!("Move from {} on occupied or out-of-range cell {} dropped", conn, index);
            return Vec::new();
        }
        game.turn = opponent_conn;

        let relay = ServerEvent::MoveMade {
            index,
            symbol: mark,
            current_turn: game.turn,
        };
        let mut out = vec![
            Outbound::To(conn, relay.clone()),
            Outbound::To(opponent_conn, relay),
        ];

        // Only the side that just moved can have completed a line.
        let outcome = if game.board.has_won(mark) {
            Some(Outcome::Won(mark))
        } else if game.board.is_full() {
            Some(Outcome::Draw)
        } else {
            None
        };

        if let Some(outcome) = outcome {
            game.phase = MatchPhase::Ended(outcome);
            let match_id = game.id;
            let player1 = game.seats[0].name.clone();
            let player2 = game.seats[1].name.clone();
            let winner = match outcome {
                Outcome::Won(_) => Some(mover_name),
                _ => None,
            };

            self.registry.set_busy(conn, false);
            self.registry.set_busy(opponent_conn, false);
            self.history.push(HistoryEntry {
                player1,
                player2,
                winner: winner.clone(),
                date: Utc::now(),
                abandoned: false,
            });
            match &winner {
                Some(name) => info!("🏁 Match {} won by {}", match_id, name),
                None => info!("🏁 Match {} ended in a draw", match_id),
            }

            out.push(Outbound::To(conn, ServerEvent::GameOver { winner: winner.clone() }));
            out.push(Outbound::To(opponent_conn, ServerEvent::GameOver { winner }));
            out.push(self.history_broadcast());
            out.push(self.roster_broadcast());
        }

        out
    }

    fn abandon(&mut self, conn: ConnectionId) -> Vec<Outbound> {
        let is_active = self
            .matches
            .get_by_conn(conn)
            .map(|g| g.is_active())
            .unwrap_or(false);
        if !is_active {
            trace!("Abandon from {} with no active match dropped", conn);
            return Vec::new();
        }
        let Some(game) = self.matches.remove_for(conn) else {
            return Vec::new();
        };

        let Some(quitter) = game.seat_of(conn) else {
            return Vec::new();
        };
        let Some(other) = game.opponent_of(conn) else {
            return Vec::new();
        };

        self.registry.set_busy(conn, false);
        self.registry.set_busy(other.conn, false);
        self.history.push(HistoryEntry {
            player1: game.seats[0].name.clone(),
            player2: game.seats[1].name.clone(),
            winner: Some(other.name.clone()),
            date: Utc::now(),
            abandoned: true,
        });
        info!(
            "🏳️ Match {} abandoned by {}; {} wins",
            game.id, quitter.name, other.name
        );

        vec![
            Outbound::To(
                other.conn,
                ServerEvent::OpponentAbandoned {
                    quitter: quitter.name.clone(),
                },
            ),
            Outbound::To(
                conn,
                ServerEvent::YouAbandoned {
                    other: other.name.clone(),
                },
            ),
            self.history_broadcast(),
            self.roster_broadcast(),
        ]
    }

    fn request_rematch(&mut self, conn: ConnectionId) -> Vec<Outbound> {
        let Some(game) = self.matches.get_by_conn(conn) else {
            trace!("Rematch request from {} with no associated match dropped", conn);
            return Vec::new();
        };
        if game.is_active() {
            trace!("Rematch request from {} for a still-active match dropped", conn);
            return Vec::new();
        }
        let Some(requester) = game.seat_of(conn) else {
            return Vec::new();
        };
        let Some(other) = game.opponent_of(conn) else {
            return Vec::new();
        };
        // Current registry name wins over the name captured at match start.
        let from = self
            .registry
            .get(conn)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| requester.name.clone());
        vec![Outbound::To(
            other.conn,
            ServerEvent::RematchRequested { from },
        )]
    }

    fn accept_rematch(&mut self, conn: ConnectionId) -> Vec<Outbound> {
        let Some(game) = self.matches.get_by_conn_mut(conn) else {
            trace!("Rematch accept from {} with no associated match dropped", conn);
            return Vec::new();
        };
        if game.is_active() {
            return Vec::new();
        }

        game.reset_for_rematch();
        let snapshot = game.snapshot();
        let participants = [game.seats[0].conn, game.seats[1].conn];
        info!("🔄 Match {} restarted by rematch", game.id);

        let mut out = Vec::with_capacity(3);
        for participant in participants {
            self.registry.set_busy(participant, true);
            out.push(Outbound::To(
                participant,
                ServerEvent::RematchAccepted {
                    snapshot: snapshot.clone(),
                },
            ));
        }
        out.push(self.roster_broadcast());
        out
    }

    fn disconnect(&mut self, conn: ConnectionId) -> Vec<Outbound> {
        let removed = self.registry.remove(conn);
        let mut out = Vec::new();

        if let Some(game) = self.matches.remove_for(conn) {
            if game.is_active() {
                // Implicit abandonment: the remaining player wins.
                let quitter_name = game
                    .seat_of(conn)
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                if let Some(other) = game.opponent_of(conn) {
                    self.registry.set_busy(other.conn, false);
                    self.history.push(HistoryEntry {
                        player1: game.seats[0].name.clone(),
                        player2: game.seats[1].name.clone(),
                        winner: Some(other.name.clone()),
                        date: Utc::now(),
                        abandoned: true,
                    });
                    info!(
                        "🏳️ Match {} abandoned by disconnect of {}; {} wins",
                        game.id, quitter_name, other.name
                    );
                    out.push(Outbound::To(
                        other.conn,
                        ServerEvent::OpponentAbandoned {
                            quitter: quitter_name,
                        },
                    ));
                    out.push(self.history_broadcast());
                }
            } else {
                debug!("Discarded ended match {} after disconnect of {}", game.id, conn);
            }
        }

        if removed.is_some() || !out.is_empty() {
            out.push(self.roster_broadcast());
        }
        out
    }

    fn roster_broadcast(&self) -> Outbound {
        Outbound::Broadcast(ServerEvent::PlayersList(self.registry.roster()))
    }

    fn history_broadcast(&self) -> Outbound {
        Outbound::Broadcast(ServerEvent::HistoryUpdated(self.history.entries()))
    }
}
