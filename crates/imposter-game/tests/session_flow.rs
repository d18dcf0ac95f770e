//! Whole-game tests driven through the public `Session` API.

use imposter_game::{
    Command, EliminationCause, GameEvent, Phase, Reply, Session, Side, View, Viewer,
};
use imposter_protocol::{Audience, ConnectionId, ParticipantId, RoomCode};

fn session_with(names: &[&str], seed: u64) -> Session {
    let mut session = Session::new(RoomCode::parse("QXKM").unwrap()).with_seed(seed);
    for (i, name) in names.iter().enumerate() {
        session
            .apply(Command::Join {
                name: name.to_string(),
                token: None,
                connection: ConnectionId::new(i as u64 + 1),
            })
            .unwrap();
    }
    session
}

fn run(session: &mut Session, commands: &[Command]) {
    for command in commands {
        session
            .apply(command.clone())
            .unwrap_or_else(|e| panic!("{} failed: {e}", command.name()));
    }
}

fn open_vote(session: &mut Session) {
    run(
        session,
        &[
            Command::StartRound,
            Command::StartClueCircle,
            Command::StartDiscussion,
            Command::StartVoting,
        ],
    );
}

fn imposter(session: &Session) -> ParticipantId {
    session
        .roster()
        .alive()
        .find(|p| p.is_imposter())
        .map(|p| p.id())
        .expect("a round is in progress")
}

/// Every alive player votes for `target`, and `target` votes for someone
/// else.
fn everyone_votes_for(session: &mut Session, target: ParticipantId) {
    let alive: Vec<ParticipantId> = session.roster().alive().map(|p| p.id()).collect();
    let fallback = alive.iter().copied().find(|id| *id != target).unwrap();
    for voter in alive {
        let target = if voter == target { fallback } else { target };
        session.apply(Command::CastVote { voter, target }).unwrap();
    }
}

#[test]
fn test_full_game_majority_catches_imposter_in_final_round() {
    let mut session = session_with(&["Ana", "Ben", "Cy", "Dee"], 1);

    // Round 1: vote out someone innocent.
    open_vote(&mut session);
    let innocent = session
        .roster()
        .alive()
        .find(|p| !p.is_imposter())
        .unwrap()
        .id();
    everyone_votes_for(&mut session, innocent);
    run(&mut session, &[Command::CloseVoting]);
    let Reply::EliminationsExecuted { result } =
        session.apply(Command::ExecuteEliminations).unwrap()
    else {
        panic!("unexpected reply");
    };
    assert_eq!(result.eliminated.len(), 1);
    assert_eq!(result.eliminated[0].id, innocent);
    assert!(!result.eliminated[0].was_imposter);
    assert!(result.outcome.is_none());
    assert_eq!(session.phase(), Phase::Elimination);

    // Round 2 is decisive: three left.
    let Reply::RoundStarted { setup } = session.apply(Command::StartRound).unwrap() else {
        panic!("unexpected reply");
    };
    assert!(setup.is_final_round);
    assert_eq!(setup.round, 2);
    run(
        &mut session,
        &[
            Command::StartClueCircle,
            Command::StartDiscussion,
            Command::StartVoting,
        ],
    );
    let caught_now = imposter(&session);
    everyone_votes_for(&mut session, caught_now);
    run(&mut session, &[Command::CloseVoting]);
    let result = session.execute_eliminations().unwrap();

    let outcome = result.outcome.expect("two left ends the game");
    assert_eq!(outcome.winner, Side::Majority);
    assert_eq!(outcome.imposter.unwrap().id, caught_now);
    assert_eq!(outcome.survivors.len(), 2);
    assert_eq!(session.phase(), Phase::GameOver);
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.used_pairs().len(), 2);

    assert!(session.apply(Command::StartRound).is_err());
    let events = session.take_events();
    assert!(
        events
            .iter()
            .any(|(a, e)| *a == Audience::Everyone && matches!(e, GameEvent::GameOver { .. }))
    );
}

#[test]
fn test_full_game_imposter_survives_final_round() {
    let mut session = session_with(&["Ana", "Ben", "Cy"], 2);
    open_vote(&mut session);

    let innocent = session
        .roster()
        .alive()
        .find(|p| !p.is_imposter())
        .unwrap()
        .id();
    everyone_votes_for(&mut session, innocent);
    run(&mut session, &[Command::CloseVoting]);
    let result = session.execute_eliminations().unwrap();

    let outcome = result.outcome.unwrap();
    assert_eq!(outcome.winner, Side::Imposter);
    assert_eq!(outcome.message, "The imposter survived! Imposter wins!");
    assert_eq!(outcome.imposter.unwrap().id, imposter(&session));
}

#[test]
fn test_eliminated_player_cannot_vote_next_round() {
    let mut session = session_with(&["A", "B", "C", "D", "E"], 3);
    open_vote(&mut session);
    everyone_votes_for(&mut session, ParticipantId(5));
    run(
        &mut session,
        &[Command::CloseVoting, Command::ExecuteEliminations],
    );

    open_vote(&mut session);
    let err = session
        .apply(Command::CastVote {
            voter: ParticipantId(5),
            target: ParticipantId(1),
        })
        .unwrap_err();
    assert_eq!(err.reason(), "voter_eliminated");

    let err = session
        .apply(Command::CastVote {
            voter: ParticipantId(1),
            target: ParticipantId(5),
        })
        .unwrap_err();
    assert_eq!(err.reason(), "target_eliminated");
    assert!(session.ballot().is_empty());
}

#[test]
fn test_eliminated_players_told_their_side_privately() {
    let mut session = session_with(&["A", "B", "C", "D"], 4);
    open_vote(&mut session);
    let target = imposter(&session);
    everyone_votes_for(&mut session, target);
    run(&mut session, &[Command::CloseVoting]);
    session.take_events();

    session.apply(Command::ExecuteEliminations).unwrap();
    let events = session.take_events();

    let private = events.iter().find(|(audience, _)| *audience == Audience::Participant(target));
    assert!(matches!(
        private,
        Some((
            _,
            GameEvent::YouWereEliminated {
                kicked: false,
                side: Some(Side::Imposter),
                ..
            }
        ))
    ));
    // The display learns the pair once it's over.
    assert!(events.iter().any(|(audience, event)| {
        *audience == Audience::Display
            && matches!(
                event,
                GameEvent::EliminationsExecuted {
                    word_pair: Some(_),
                    ..
                }
            )
    }));
}

#[test]
fn test_views_keep_secrets_from_display_and_players() {
    let mut session = session_with(&["Ana", "Ben", "Cy", "Dee"], 5);
    session.apply(Command::StartRound).unwrap();
    let pair = session.word_pair().unwrap().clone();

    let display = serde_json::to_string(&session.view_for(Viewer::Display)).unwrap();
    assert!(!display.contains(&pair.main_word));
    assert!(!display.contains(&pair.imposter_word));
    assert!(!display.contains("IMPOSTER"));

    let player = serde_json::to_string(&session.view_for(Viewer::Participant(ParticipantId(1))))
        .unwrap();
    assert!(!player.contains(&pair.main_word));
    assert!(!player.contains(&pair.imposter_word));

    let Some(View::Operator(operator)) = session.view_for(Viewer::Operator) else {
        panic!("operator view missing");
    };
    assert_eq!(operator.word_pair.as_ref(), Some(&pair));
    assert_eq!(
        operator
            .secrets
            .iter()
            .filter(|s| s.side == Some(Side::Imposter))
            .count(),
        1
    );
    assert_eq!(operator.spectator.elimination_slots, 1);
}

#[test]
fn test_participant_view_unknown_id_is_none() {
    let session = session_with(&["Ana"], 6);
    assert!(session.view_for(Viewer::Participant(ParticipantId(42))).is_none());
    let Some(View::Spectator(view)) = session.view_for(Viewer::Display) else {
        panic!("spectator view missing");
    };
    assert_eq!(view.imposters_this_round, 0);
    assert_eq!(view.total_count, 1);
}

#[test]
fn test_kick_during_round_records_history() {
    let mut session = session_with(&["A", "B", "C", "D"], 7);
    session.apply(Command::StartRound).unwrap();
    session
        .apply(Command::Kick {
            participant_id: ParticipantId(3),
        })
        .unwrap();

    let record = &session.history()[0];
    assert_eq!(record.cause, EliminationCause::Kick);
    assert_eq!(record.round, 1);
    assert!(record.word.is_some());
    assert_eq!(session.roster().alive_count(), 3);
    assert_eq!(session.phase(), Phase::WordReveal);
}

#[test]
fn test_twelve_players_two_slots() {
    let names: Vec<String> = (1..=12).map(|i| format!("P{i}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut session = session_with(&names, 8);

    let Reply::RoundStarted { setup } = session.apply(Command::StartRound).unwrap() else {
        panic!("unexpected reply");
    };
    assert_eq!(setup.imposter_count, 2);
    run(
        &mut session,
        &[
            Command::StartClueCircle,
            Command::StartDiscussion,
            Command::StartVoting,
        ],
    );
    // P1 gets 6, P2 and P3 get 3 each: P1 out, P2/P3 tie for the last slot.
    #[rustfmt::skip]
    let votes = [
        (2, 1), (3, 1), (4, 1), (5, 1), (6, 1), (7, 1),
        (8, 2), (9, 2), (10, 2),
        (11, 3), (12, 3), (1, 3),
    ];
    for (voter, target) in votes {
        session
            .apply(Command::CastVote {
                voter: ParticipantId(voter),
                target: ParticipantId(target),
            })
            .unwrap();
    }
    let result = session.close_voting().unwrap();
    assert_eq!(result.eliminated.len(), 1);
    assert_eq!(result.tie_break_candidates.len(), 2);
    assert_eq!(result.slots_needed, 1);

    session.resolve_tie_break().unwrap();
    let confirmed = session.confirmed();
    assert_eq!(confirmed.len(), 2);
    assert_eq!(confirmed[0], ParticipantId(1));
    assert!(confirmed[1] == ParticipantId(2) || confirmed[1] == ParticipantId(3));

    let result = session.execute_eliminations().unwrap();
    assert_eq!(result.alive_count, 10);
    assert_eq!(result.eliminated[1].cause, EliminationCause::TieBreak);
}
