//! Integration tests for room actors and the registry.

use std::collections::HashSet;
use std::time::Duration;

use imposter_game::{Command, GameEvent, Phase, Reply, View, Viewer};
use imposter_protocol::{ConnectionId, ParticipantId, RoomCode};
use imposter_room::{RoomConfig, RoomError, RoomHandle, RoomOutbound, RoomRegistry};
use tokio::sync::mpsc;

type Inbox = mpsc::UnboundedReceiver<RoomOutbound>;

async fn next(inbox: &mut Inbox) -> RoomOutbound {
    tokio::time::timeout(Duration::from_secs(1), inbox.recv())
        .await
        .expect("timed out waiting for room output")
        .expect("room closed the channel")
}

/// Skips views until the next event arrives.
async fn next_event(inbox: &mut Inbox) -> GameEvent {
    loop {
        if let RoomOutbound::Event(event) = next(inbox).await {
            return event;
        }
    }
}

async fn subscribe(room: &RoomHandle, connection: u64, viewer: Viewer) -> Inbox {
    let (tx, rx) = mpsc::unbounded_channel();
    room.subscribe(ConnectionId::new(connection), viewer, tx)
        .await
        .expect("subscribe");
    rx
}

async fn join(room: &RoomHandle, name: &str, connection: u64) -> ParticipantId {
    let reply = room
        .apply(Command::Join {
            name: name.to_string(),
            token: None,
            connection: ConnectionId::new(connection),
        })
        .await
        .expect("join");
    match reply {
        Reply::Joined { receipt } => receipt.participant.id,
        other => panic!("unexpected reply {other:?}"),
    }
}

#[tokio::test]
async fn test_registry_codes_unique() {
    let mut registry = RoomRegistry::default();
    let mut codes = HashSet::new();
    for _ in 0..50 {
        let handle = registry.create_room().expect("create");
        assert!(codes.insert(handle.code()), "duplicate {}", handle.code());
    }
    assert_eq!(registry.room_count(), 50);
    assert_eq!(registry.room_codes().len(), 50);
}

#[tokio::test]
async fn test_registry_collision_exhausts_attempts() {
    let config = RoomConfig {
        create_attempts: 1,
        ..RoomConfig::default()
    };
    let mut registry = RoomRegistry::new(config).with_seed(5);
    registry.create_room().expect("first room");

    // Same seed, same first code.
    let mut registry = registry.with_seed(5);
    let err = registry.create_room().err().expect("should collide");
    assert!(matches!(err, RoomError::CodesExhausted(1)));
    assert_eq!(err.reason(), "codes_exhausted");
    assert_eq!(registry.room_count(), 1);
}

#[tokio::test]
async fn test_registry_unknown_code_not_found() {
    let registry = RoomRegistry::default();
    let code = RoomCode::parse("ZZZZ").unwrap();
    let err = registry.get(code).err().expect("no such room");
    assert!(matches!(err, RoomError::NotFound(c) if c == code));
    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn test_destroyed_room_no_longer_resolves() {
    let mut registry = RoomRegistry::default();
    let handle = registry.create_room().unwrap();
    let code = handle.code();

    registry.destroy_room(code).await.expect("destroy");

    assert!(matches!(registry.get(code), Err(RoomError::NotFound(_))));
    assert!(matches!(
        registry.destroy_room(code).await,
        Err(RoomError::NotFound(_))
    ));
    let err = handle.apply(Command::StartRound).await.unwrap_err();
    assert!(matches!(err, RoomError::Unavailable(c) if c == code));
}

#[tokio::test]
async fn test_removed_room_unregistered_but_live_until_shutdown() {
    let registry = tokio::sync::Mutex::new(RoomRegistry::default());
    let handle = registry.lock().await.create_room().unwrap();
    let code = handle.code();

    let removed = registry.lock().await.remove(code).expect("remove");

    // The registry is free again while the actor is still running.
    assert!(matches!(
        registry.lock().await.get(code),
        Err(RoomError::NotFound(_))
    ));
    assert_eq!(registry.lock().await.room_count(), 0);
    assert_eq!(removed.info().await.expect("still live").code, code);

    removed.shutdown().await.expect("shutdown");
    let err = handle.apply(Command::StartRound).await.unwrap_err();
    assert!(matches!(err, RoomError::Unavailable(c) if c == code));
    assert!(matches!(
        registry.lock().await.remove(code),
        Err(RoomError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_room_settings_from_config() {
    let mut config = RoomConfig::default();
    config.settings.voting_secs = 15;
    let mut registry = RoomRegistry::new(config);
    let room = registry.create_room().unwrap();

    let Some(View::Spectator(view)) = room.view(Viewer::Display).await.unwrap() else {
        panic!("expected spectator view");
    };
    assert_eq!(view.settings.voting_secs, 15);
    assert_eq!(view.phase, Phase::Lobby);
}

#[tokio::test]
async fn test_subscribe_sends_snapshot_then_events() {
    let mut registry = RoomRegistry::default();
    let room = registry.create_room().unwrap();
    let mut display = subscribe(&room, 100, Viewer::Display).await;

    match next(&mut display).await {
        RoomOutbound::View(View::Spectator(view)) => assert_eq!(view.total_count, 0),
        other => panic!("expected snapshot, got {other:?}"),
    }

    join(&room, "Ana", 1).await;
    match next_event(&mut display).await {
        GameEvent::PlayerJoined { participant, total } => {
            assert_eq!(participant.name, "Ana");
            assert_eq!(total, 1);
        }
        other => panic!("unexpected event {other:?}"),
    }
    match next(&mut display).await {
        RoomOutbound::View(View::Spectator(view)) => assert_eq!(view.total_count, 1),
        other => panic!("expected refreshed view, got {other:?}"),
    }
}

#[tokio::test]
async fn test_words_reach_only_their_owner() {
    let mut registry = RoomRegistry::default();
    let room = registry.create_room().unwrap();

    let mut inboxes = Vec::new();
    for (i, name) in ["Ana", "Ben", "Cy"].iter().enumerate() {
        let connection = i as u64 + 1;
        let id = join(&room, name, connection).await;
        inboxes.push((id, subscribe(&room, connection, Viewer::Participant(id)).await));
    }
    let mut display = subscribe(&room, 100, Viewer::Display).await;

    room.apply(Command::StartRound).await.expect("start");

    let Some(View::Operator(operator)) = room.view(Viewer::Operator).await.unwrap() else {
        panic!("expected operator view");
    };
    for (id, inbox) in &mut inboxes {
        let event = next_event(inbox).await;
        let GameEvent::WordAssigned { word, round, .. } = event else {
            panic!("expected a word, got {event:?}");
        };
        assert_eq!(round, 1);
        let secret = operator
            .secrets
            .iter()
            .find(|s| s.public.id == *id)
            .expect("listed");
        assert_eq!(secret.word.as_deref(), Some(word.as_str()));
    }

    // The display hears the round start, never a word.
    assert!(matches!(
        next_event(&mut display).await,
        GameEvent::RoundStarted { .. }
    ));
    while let Ok(outbound) = display.try_recv() {
        assert!(
            !matches!(outbound, RoomOutbound::Event(GameEvent::WordAssigned { .. })),
            "display saw a word"
        );
    }
}

#[tokio::test]
async fn test_rejected_command_surfaces_game_error() {
    let mut registry = RoomRegistry::default();
    let room = registry.create_room().unwrap();
    join(&room, "Ana", 1).await;

    let err = room.apply(Command::StartRound).await.unwrap_err();
    assert!(matches!(err, RoomError::Game(_)));
    assert_eq!(err.reason(), "not_enough_players");
    assert_eq!(err.status(), 409);

    let info = room.info().await.unwrap();
    assert_eq!(info.phase, Phase::Lobby);
    assert_eq!(info.participants, 1);
}

#[tokio::test]
async fn test_unsubscribed_connection_gets_nothing() {
    let mut registry = RoomRegistry::default();
    let room = registry.create_room().unwrap();
    let mut display = subscribe(&room, 100, Viewer::Display).await;
    let _snapshot = next(&mut display).await;

    room.unsubscribe(ConnectionId::new(100)).await.unwrap();
    join(&room, "Ana", 1).await;

    let info = room.info().await.unwrap();
    assert_eq!(info.subscribers, 0);
    assert!(display.try_recv().is_err());
}

#[tokio::test]
async fn test_list_rooms_reports_each_room() {
    let mut registry = RoomRegistry::default();
    let a = registry.create_room().unwrap();
    let b = registry.create_room().unwrap();
    join(&a, "Ana", 1).await;

    let infos = registry.list_rooms().await;
    assert_eq!(infos.len(), 2);
    let info_a = infos.iter().find(|i| i.code == a.code()).unwrap();
    let info_b = infos.iter().find(|i| i.code == b.code()).unwrap();
    assert_eq!(info_a.participants, 1);
    assert_eq!(info_b.participants, 0);
}
