
// Include tests
#[cfg(test)]
mod tests {
    use crate::messaging::types::ServerEvent;
    use crate::session::coordinator::{Outbound, SessionCoordinator};
    use crate::session::{Mark, DEFAULT_HISTORY_CAPACITY};
    use crate::*;

    const ALICE: usize = 1;
    const BOB: usize = 2;

    fn coordinator() -> SessionCoordinator {
        SessionCoordinator::new(DEFAULT_HISTORY_CAPACITY)
    }

    async fn registered_pair(coord: &SessionCoordinator) {
        coord.register(ALICE, "Alice".to_string()).await;
        coord.register(BOB, "Bob".to_string()).await;
    }

    /// Registers both players and pairs them, Alice inviting.
    async fn active_match(coord: &SessionCoordinator) {
        registered_pair(coord).await;
        coord.invite(ALICE, BOB).await;
        coord.accept_invite(BOB, ALICE).await;
    }

    fn sent_to(batch: &[Outbound], target: usize) -> Vec<&ServerEvent> {
        batch
            .iter()
            .filter_map(|o| match o {
                Outbound::To(conn, event) if *conn == target => Some(event),
                _ => None,
            })
            .collect()
    }

    fn broadcasts(batch: &[Outbound]) -> Vec<&ServerEvent> {
        batch
            .iter()
            .filter_map(|o| match o {
                Outbound::Broadcast(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_core_server_creation() {
        let server = create_server();
        let coordinator = server.coordinator();

        assert!(coordinator.roster().await.is_empty());
        assert!(coordinator.history().await.is_empty());
        assert_eq!(server.connection_manager().connection_count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_registration_broadcasts_roster() {
        let coord = coordinator();
        let batch = coord.register(ALICE, "Alice".to_string()).await;

        let roster_update = broadcasts(&batch)
            .into_iter()
            .find_map(|e| match e {
                ServerEvent::PlayersList(entries) => Some(entries.clone()),
                _ => None,
            })
            .expect("roster broadcast");
        assert_eq!(roster_update.len(), 1);
        assert_eq!(roster_update[0].name, "Alice");
        assert_eq!(roster_update[0].socket_id, ALICE);
        assert!(!roster_update[0].in_game);

        coord.register(BOB, "Bob".to_string()).await;
        assert_eq!(coord.roster().await.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invite_reaches_idle_target_only() {
        let coord = coordinator();
        registered_pair(&coord).await;

        let batch = coord.invite(ALICE, BOB).await;
        assert_eq!(
            batch,
            vec![Outbound::To(
                BOB,
                ServerEvent::GameInvitation {
                    from: "Alice".to_string(),
                    from_id: ALICE,
                }
            )]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invite_to_busy_or_missing_target_is_dropped() {
        let coord = coordinator();
        active_match(&coord).await;
        coord.register(3, "Carol".to_string()).await;

        assert!(coord.invite(3, ALICE).await.is_empty());
        assert!(coord.invite(3, 99).await.is_empty());
        assert!(coord.invite(99, 3).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_accept_pairs_players_and_inviter_moves_first() {
        let coord = coordinator();
        registered_pair(&coord).await;
        coord.invite(ALICE, BOB).await;

        let batch = coord.accept_invite(BOB, ALICE).await;

        let to_alice = sent_to(&batch, ALICE);
        let to_bob = sent_to(&batch, BOB);
        let ServerEvent::GameStart {
            opponent, symbol, snapshot,
        } = to_alice[0]
        else {
            panic!("expected gameStart for the inviter");
        };
        assert_eq!(opponent, "Bob");
        assert_eq!(*symbol, Mark::X);
        assert_eq!(snapshot.current_turn, ALICE);
        assert!(snapshot.board.iter().all(|c| c.is_none()));

        let ServerEvent::GameStart { symbol, .. } = to_bob[0] else {
            panic!("expected gameStart for the accepter");
        };
        assert_eq!(*symbol, Mark::O);

        assert!(coord.player(ALICE).await.expect("alice").busy);
        assert!(coord.player(BOB).await.expect("bob").busy);
        assert_eq!(coord.active_matches().await, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_accept_after_inviter_disconnect_is_noop() {
        let coord = coordinator();
        registered_pair(&coord).await;
        coord.invite(ALICE, BOB).await;
        coord.disconnect(ALICE).await;

        assert!(coord.accept_invite(BOB, ALICE).await.is_empty());
        assert_eq!(coord.active_matches().await, 0);
        assert!(!coord.player(BOB).await.expect("bob").busy);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_self_accept_is_noop() {
        let coord = coordinator();
        registered_pair(&coord).await;
        assert!(coord.accept_invite(ALICE, ALICE).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_column_win_ends_match_and_records_history() {
        let coord = coordinator();
        active_match(&coord).await;

        // Alice completes the left column while Bob fills elsewhere
        coord.apply_move(ALICE, 0).await;
        coord.apply_move(BOB, 1).await;
        coord.apply_move(ALICE, 3).await;
        coord.apply_move(BOB, 2).await;
        let batch = coord.apply_move(ALICE, 6).await;

        let to_bob = sent_to(&batch, BOB);
        assert!(to_bob.iter().any(|e| matches!(
            e,
            ServerEvent::GameOver { winner: Some(name) } if name == "Alice"
        )));
        assert!(broadcasts(&batch)
            .iter()
            .any(|e| matches!(e, ServerEvent::HistoryUpdated(_))));

        let history = coord.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].winner.as_deref(), Some("Alice"));
        assert!(!history[0].abandoned);

        assert!(!coord.player(ALICE).await.expect("alice").busy);
        assert!(!coord.player(BOB).await.expect("bob").busy);
        assert_eq!(coord.active_matches().await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_full_board_without_winner_is_a_draw() {
        let coord = coordinator();
        active_match(&coord).await;

        for (conn, index) in [
            (ALICE, 0),
            (BOB, 1),
            (ALICE, 2),
            (BOB, 4),
            (ALICE, 3),
            (BOB, 5),
            (ALICE, 7),
            (BOB, 6),
        ] {
            assert!(!coord.apply_move(conn, index).await.is_empty());
        }
        let batch = coord.apply_move(ALICE, 8).await;

        assert!(sent_to(&batch, ALICE)
            .iter()
            .any(|e| matches!(e, ServerEvent::GameOver { winner: None })));

        let history = coord.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].winner, None);
        assert!(!history[0].abandoned);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_moves_are_silent_noops() {
        let coord = coordinator();
        active_match(&coord).await;

        // Out of turn
        assert!(coord.apply_move(BOB, 0).await.is_empty());
        // Out of range
        assert!(coord.apply_move(ALICE, 9).await.is_empty());

        coord.apply_move(ALICE, 4).await;
        // Occupied cell
        assert!(coord.apply_move(BOB, 4).await.is_empty());
        // Not a participant
        assert!(coord.apply_move(99, 0).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_moves_after_game_end_are_dropped() {
        let coord = coordinator();
        active_match(&coord).await;

        coord.apply_move(ALICE, 0).await;
        coord.apply_move(BOB, 1).await;
        coord.apply_move(ALICE, 3).await;
        coord.apply_move(BOB, 2).await;
        coord.apply_move(ALICE, 6).await;

        // The end is idempotent: further moves change nothing
        assert!(coord.apply_move(BOB, 5).await.is_empty());
        assert!(coord.apply_move(ALICE, 5).await.is_empty());
        assert_eq!(coord.history().await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_abandon_declares_opponent_winner() {
        let coord = coordinator();
        active_match(&coord).await;

        let batch = coord.abandon(BOB).await;

        assert!(sent_to(&batch, ALICE).iter().any(|e| matches!(
            e,
            ServerEvent::OpponentAbandoned { quitter } if quitter == "Bob"
        )));
        assert!(sent_to(&batch, BOB).iter().any(|e| matches!(
            e,
            ServerEvent::YouAbandoned { other } if other == "Alice"
        )));

        let history = coord.history().await;
        assert_eq!(history[0].winner.as_deref(), Some("Alice"));
        assert!(history[0].abandoned);

        assert!(!coord.player(ALICE).await.expect("alice").busy);
        assert!(!coord.player(BOB).await.expect("bob").busy);
        assert_eq!(coord.active_matches().await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_abandon_without_active_match_is_noop() {
        let coord = coordinator();
        registered_pair(&coord).await;
        assert!(coord.abandon(ALICE).await.is_empty());

        active_match(&coord).await;
        coord.apply_move(ALICE, 0).await;
        coord.apply_move(BOB, 1).await;
        coord.apply_move(ALICE, 3).await;
        coord.apply_move(BOB, 2).await;
        coord.apply_move(ALICE, 6).await;

        // Ended matches cannot be abandoned
        assert!(coord.abandon(BOB).await.is_empty());
        assert_eq!(coord.history().await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_disconnect_mid_match_is_implicit_abandonment() {
        let coord = coordinator();
        active_match(&coord).await;

        let batch = coord.disconnect(BOB).await;

        assert!(sent_to(&batch, ALICE).iter().any(|e| matches!(
            e,
            ServerEvent::OpponentAbandoned { quitter } if quitter == "Bob"
        )));
        // The quitter is gone; nothing is addressed to them
        assert!(sent_to(&batch, BOB).is_empty());

        let history = coord.history().await;
        assert_eq!(history[0].winner.as_deref(), Some("Alice"));
        assert!(history[0].abandoned);

        assert!(!coord.player(ALICE).await.expect("alice").busy);
        assert!(coord.player(BOB).await.is_none());
        assert_eq!(coord.roster().await.len(), 1);
        assert_eq!(coord.active_matches().await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_disconnect_after_game_end_discards_match_silently() {
        let coord = coordinator();
        active_match(&coord).await;
        coord.apply_move(ALICE, 0).await;
        coord.apply_move(BOB, 1).await;
        coord.apply_move(ALICE, 3).await;
        coord.apply_move(BOB, 2).await;
        coord.apply_move(ALICE, 6).await;

        let batch = coord.disconnect(BOB).await;
        assert!(sent_to(&batch, ALICE)
            .iter()
            .all(|e| !matches!(e, ServerEvent::OpponentAbandoned { .. })));
        assert_eq!(coord.history().await.len(), 1);

        // The survivor can no longer rematch against the gone player
        assert!(coord.request_rematch(ALICE).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rematch_resets_board_and_first_turn() {
        let coord = coordinator();
        active_match(&coord).await;
        coord.apply_move(ALICE, 0).await;
        coord.apply_move(BOB, 1).await;
        coord.apply_move(ALICE, 3).await;
        coord.apply_move(BOB, 2).await;
        coord.apply_move(ALICE, 6).await;

        let batch = coord.request_rematch(BOB).await;
        assert_eq!(
            batch,
            vec![Outbound::To(
                ALICE,
                ServerEvent::RematchRequested {
                    from: "Bob".to_string()
                }
            )]
        );

        let batch = coord.accept_rematch(ALICE).await;
        let to_bob = sent_to(&batch, BOB);
        let ServerEvent::RematchAccepted { snapshot } = to_bob[0] else {
            panic!("expected rematchAccepted");
        };
        assert!(snapshot.board.iter().all(|c| c.is_none()));
        // The original first-mover keeps the first turn
        assert_eq!(snapshot.current_turn, ALICE);

        assert!(coord.player(ALICE).await.expect("alice").busy);
        assert!(coord.player(BOB).await.expect("bob").busy);
        assert_eq!(coord.active_matches().await, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rematch_on_active_match_is_noop() {
        let coord = coordinator();
        active_match(&coord).await;

        assert!(coord.request_rematch(ALICE).await.is_empty());
        assert!(coord.accept_rematch(ALICE).await.is_empty());
        assert_eq!(coord.active_matches().await, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_new_invite_voids_pending_rematch() {
        let coord = coordinator();
        active_match(&coord).await;
        coord.abandon(BOB).await;

        // Abandonment removed the match entirely; a fresh pairing works
        coord.invite(ALICE, BOB).await;
        coord.accept_invite(BOB, ALICE).await;
        assert_eq!(coord.active_matches().await, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_history_is_bounded_and_newest_first() {
        let coord = coordinator();
        registered_pair(&coord).await;

        for round in 0..10 {
            coord.invite(ALICE, BOB).await;
            coord.accept_invite(BOB, ALICE).await;
            if round % 2 == 0 {
                coord.abandon(BOB).await;
            } else {
                coord.abandon(ALICE).await;
            }
        }

        let history = coord.history().await;
        assert_eq!(history.len(), DEFAULT_HISTORY_CAPACITY);
        // Round 9: Alice quit, so Bob won the most recent entry
        assert_eq!(history[0].winner.as_deref(), Some("Bob"));
        assert_eq!(history[1].winner.as_deref(), Some("Alice"));
        assert!(history.iter().all(|e| e.abandoned));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_history_targets_requester_only() {
        let coord = coordinator();
        active_match(&coord).await;
        coord.abandon(BOB).await;

        let batch = coord.get_history(ALICE).await;
        assert_eq!(batch.len(), 1);
        assert!(matches!(
            &batch[0],
            Outbound::To(conn, ServerEvent::HistoryReceived(entries))
                if *conn == ALICE && entries.len() == 1
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_client_reported_outcome_is_ignored() {
        use crate::messaging::types::ClientEvent;

        let coord = coordinator();
        active_match(&coord).await;

        let event = ClientEvent::GameEnded {
            winner: Some("Bob".to_string()),
            players: None,
        };
        assert!(coord.handle_event(BOB, event).await.is_empty());

        // The match is untouched and Alice still moves first
        assert_eq!(coord.active_matches().await, 1);
        assert!(coord.history().await.is_empty());
        assert!(!coord.apply_move(ALICE, 4).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reregistration_keeps_busy_flag_mid_match() {
        let coord = coordinator();
        active_match(&coord).await;

        coord.register(ALICE, "Alicia".to_string()).await;
        let alice = coord.player(ALICE).await.expect("alice");
        assert_eq!(alice.name, "Alicia");
        assert!(alice.busy);
    }
}
