//! Presence registry: connection identity to player identity mapping.
//!
//! Owns every `Player` record. Matches refer to players by connection ID
//! only; all busy-flag mutations flow through this registry so the busy
//! state has a single underlying record per player.

use crate::connection::ConnectionId;
use crate::messaging::types::RosterEntry;
use std::collections::HashMap;

/// A registered player.
///
/// Created on registration, destroyed on disconnect. The display name is
/// user-supplied and not required to be unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// User-supplied display name
    pub name: String,
    /// Connection identity this player is bound to
    pub conn: ConnectionId,
    /// Whether the player is a participant in an active match
    pub busy: bool,
}

/// Registry of all currently connected, registered players.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    players: HashMap<ConnectionId, Player>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or overwrites the player record for `conn` with `busy = false`.
    ///
    /// Registration is idempotent per connection: re-registering under the
    /// same connection identity overwrites the existing record, never
    /// duplicates it.
    pub fn register(&mut self, conn: ConnectionId, name: String) {
        self.players.insert(
            conn,
            Player {
                name,
                conn,
                busy: false,
            },
        );
    }

    /// Deletes the record for `conn`, returning it if one existed.
    pub fn remove(&mut self, conn: ConnectionId) -> Option<Player> {
        self.players.remove(&conn)
    }

    /// Looks up the player registered under `conn`.
    pub fn get(&self, conn: ConnectionId) -> Option<&Player> {
        self.players.get(&conn)
    }

    /// Sets the busy flag for `conn`.
    ///
    /// Returns `false` if no player is registered under that connection
    /// (e.g. the player disconnected mid-match); callers treat that as a
    /// no-op rather than an error.
    pub fn set_busy(&mut self, conn: ConnectionId, busy: bool) -> bool {
        match self.players.get_mut(&conn) {
            Some(player) => {
                player.busy = busy;
                true
            }
            None => false,
        }
    }

    /// Returns the number of registered players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Returns the full roster snapshot, ordered by connection ID.
    ///
    /// Every registry mutation broadcasts this snapshot to all connections;
    /// clients filter it locally (e.g. the inviting client excludes itself).
    pub fn roster(&self) -> Vec<RosterEntry> {
        let mut entries: Vec<RosterEntry> = self
            .players
            .values()
            .map(|p| RosterEntry {
                name: p.name.clone(),
                socket_id: p.conn,
                in_game: p.busy,
            })
            .collect();
        entries.sort_by_key(|e| e.socket_id);
        entries
    }
}
