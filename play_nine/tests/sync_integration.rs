/// Integration tests for live table synchronization
///
/// These tests wire a table manager, the session registry, and the sweep
/// coordinator together over an in-memory store, and check what connected
/// viewers actually receive.
use play_nine::{
    Action, PlayerId, TableName, TableView,
    game::{DrawOrigin, GameError, Phase, ViewPhase},
    session::{SessionConfig, SessionRegistry},
    store::{MemoryStore, TableStore},
    sync::{Coordinator, CoordinatorConfig},
    table::{TableConfig, TableError, TableManager},
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

struct Harness {
    store: Arc<MemoryStore>,
    registry: Arc<SessionRegistry>,
    tables: Arc<TableManager>,
    coordinator: Coordinator,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(SessionRegistry::new(SessionConfig::default()));
    let tables = Arc::new(TableManager::new(
        store.clone(),
        registry.clone(),
        TableConfig::default(),
    ));
    let coordinator = Coordinator::new(tables.clone(), CoordinatorConfig::default());
    Harness {
        store,
        registry,
        tables,
        coordinator,
    }
}

fn drain(rx: &mut mpsc::Receiver<Arc<str>>) {
    while rx.try_recv().is_ok() {}
}

async fn next_view(rx: &mut mpsc::Receiver<Arc<str>>) -> TableView {
    let raw = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("no broadcast arrived")
        .expect("channel closed");
    serde_json::from_str(&raw).unwrap()
}

/// Two players seated, game started, everyone revealed.
async fn table_in_play(h: &Harness, name: &str) -> (TableName, PlayerId, PlayerId) {
    let alice = h.tables.join(name, Some("alice")).await.unwrap();
    let bob = h.tables.join(name, Some("bob")).await.unwrap();
    let table = alice.table_name.clone();
    let (a, b) = (alice.player_id.unwrap(), bob.player_id.unwrap());

    h.tables.act(&table, Some(a.clone()), Action::Start).await.unwrap();
    for id in [&a, &b] {
        for card_index in [0, 1] {
            h.tables
                .act(&table, Some(id.clone()), Action::Reveal { card_index })
                .await
                .unwrap();
        }
    }
    (table, a, b)
}

// === Concurrency Tests ===

#[tokio::test]
async fn test_concurrent_draws_only_one_succeeds() {
    let h = harness();
    let (table, alice, _) = table_in_play(&h, "race").await;

    let (first, second) = tokio::join!(
        h.tables.act(&table, Some(alice.clone()), Action::DrawFromDraw),
        h.tables.act(&table, Some(alice.clone()), Action::DrawFromDraw),
    );

    let results = [first, second];
    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(TableError::Game(GameError::AlreadyDrew))
    )));

    let view = h.tables.view(&table).await.unwrap();
    assert!(view.drawn_card.is_some());
}

#[tokio::test]
async fn test_many_tables_in_parallel() {
    let h = harness();
    let mut tasks = Vec::new();
    for i in 0..8 {
        let tables = h.tables.clone();
        tasks.push(tokio::spawn(async move {
            let name = format!("table-{i}");
            tables.join(&name, Some("alice")).await.unwrap();
            tables.join(&name, Some("bob")).await.unwrap()
        }));
    }
    for task in tasks {
        let outcome = task.await.unwrap();
        assert!(outcome.player_id.is_some());
    }
    assert_eq!(h.tables.active_table_count().await, 8);
}

// === View Tests ===

#[tokio::test]
async fn test_view_is_read_only() {
    let h = harness();
    let (table, _, _) = table_in_play(&h, "steady").await;
    let saves = h.store.save_count();

    let first = h.tables.view(&table).await.unwrap();
    let second = h.tables.view(&table).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(h.store.save_count(), saves);
}

#[tokio::test]
async fn test_actions_broadcast_to_spectators() {
    let h = harness();
    let (table, alice, _) = table_in_play(&h, "watched").await;

    let (tx, mut rx) = h.registry.channel();
    h.registry.connect(&table, None, tx).await.unwrap();

    h.tables
        .act(&table, Some(alice), Action::DrawFromDraw)
        .await
        .unwrap();
    let view = next_view(&mut rx).await;
    assert!(view.drawn_card.is_some());
    assert_eq!(view.drawn_from, Some(DrawOrigin::Draw));
}

// === Liveness Tests ===

#[tokio::test]
async fn test_stale_connection_rebroadcasts_presence() {
    let h = harness();
    let (table, alice, _) = table_in_play(&h, "stale").await;

    let (player_tx, _player_rx) = h.registry.channel();
    h.registry
        .connect(&table, Some(alice.clone()), player_tx)
        .await
        .unwrap();
    let (spectator_tx, mut spectator_rx) = h.registry.channel();
    let spectator = h.registry.connect(&table, None, spectator_tx).await.unwrap();

    let start = Instant::now();
    h.registry
        .record_heartbeat_at(spectator, start + Duration::from_secs(15))
        .await
        .unwrap();
    h.tables.rebroadcast(&table).await.unwrap();
    let before = next_view(&mut spectator_rx).await;
    assert!(before.active_player_ids.contains(&alice));

    let affected = h
        .coordinator
        .sweep_stale_connections_at(start + Duration::from_secs(21))
        .await;
    assert_eq!(affected, 1);

    let after = next_view(&mut spectator_rx).await;
    assert!(after.active_player_ids.is_empty());
    assert_eq!(h.registry.connection_count(&table).await, 1);
}

#[tokio::test]
async fn test_inactive_player_is_removed() {
    let h = harness();
    let alice = h.tables.join("idle", Some("alice")).await.unwrap();
    let bob = h.tables.join("idle", Some("bob")).await.unwrap();
    let carol = h.tables.join("idle", Some("carol")).await.unwrap();
    let table = alice.table_name.clone();
    let bob_id = bob.player_id.unwrap();

    let (tx, _rx) = h.registry.channel();
    let conn = h
        .registry
        .connect(&table, Some(bob_id.clone()), tx)
        .await
        .unwrap();
    let start = Instant::now();
    h.registry.disconnect(conn, &table).await;

    let (spectator_tx, mut spectator_rx) = h.registry.channel();
    let spectator = h.registry.connect(&table, None, spectator_tx).await.unwrap();
    h.registry
        .record_heartbeat_at(spectator, start + Duration::from_secs(120))
        .await
        .unwrap();
    drain(&mut spectator_rx);

    assert_eq!(
        h.coordinator
            .sweep_inactive_players_at(start + Duration::from_secs(30))
            .await,
        0
    );
    assert_eq!(
        h.coordinator
            .sweep_inactive_players_at(start + Duration::from_secs(61))
            .await,
        1
    );

    let view = next_view(&mut spectator_rx).await;
    assert_eq!(view.players.len(), 2);
    assert!(view.players.iter().all(|p| p.id != bob_id));
    assert!(view.players.iter().any(|p| Some(&p.id) == carol.player_id.as_ref()));

    // Already handled; the next sweep finds nothing.
    assert_eq!(
        h.coordinator
            .sweep_inactive_players_at(start + Duration::from_secs(90))
            .await,
        0
    );
}

#[tokio::test]
async fn test_last_inactive_player_removal_empties_table() {
    let h = harness();
    let alice = h.tables.join("abandoned", Some("alice")).await.unwrap();
    let table = alice.table_name.clone();
    let alice_id = alice.player_id.unwrap();

    let (tx, _rx) = h.registry.channel();
    let conn = h
        .registry
        .connect(&table, Some(alice_id.clone()), tx)
        .await
        .unwrap();
    let start = Instant::now();
    h.registry.disconnect(conn, &table).await;

    assert_eq!(
        h.coordinator
            .sweep_inactive_players_at(start + Duration::from_secs(61))
            .await,
        1
    );

    let stored = h.store.load(&table).await.unwrap().unwrap();
    assert!(stored.players.is_empty());
    assert_eq!(stored.phase, Phase::Waiting);
    assert!(stored.scores.is_empty());

    let view = h.tables.view(&table).await.unwrap();
    assert_eq!(view.phase, ViewPhase::Empty);
    assert!(view.players.is_empty());
    assert_eq!(view.draw_pile_count, 108);
}

#[tokio::test]
async fn test_last_player_leaving_empties_table() {
    let h = harness();
    let outcome = h.tables.join("lonely", Some("alice")).await.unwrap();
    let table = outcome.table_name.clone();

    let view = h
        .tables
        .act(&table, outcome.player_id, Action::Leave)
        .await
        .unwrap();
    assert_eq!(view.phase, ViewPhase::Empty);
    assert!(view.players.is_empty());

    let later = h.tables.view(&table).await.unwrap();
    assert_eq!(later.phase, ViewPhase::Empty);
}

#[tokio::test]
async fn test_reconnect_before_timeout_keeps_seat() {
    let h = harness();
    let alice = h.tables.join("flaky", Some("alice")).await.unwrap();
    h.tables.join("flaky", Some("bob")).await.unwrap();
    let table = alice.table_name.clone();
    let alice_id = alice.player_id.unwrap();

    let (tx, _rx) = h.registry.channel();
    let conn = h
        .registry
        .connect(&table, Some(alice_id.clone()), tx)
        .await
        .unwrap();
    let start = Instant::now();
    h.registry.disconnect(conn, &table).await;

    let (tx, _rx) = h.registry.channel();
    h.registry
        .connect(&table, Some(alice_id.clone()), tx)
        .await
        .unwrap();

    assert_eq!(
        h.coordinator
            .sweep_inactive_players_at(start + Duration::from_secs(61))
            .await,
        0
    );
    let view = h.tables.view(&table).await.unwrap();
    assert!(view.players.iter().any(|p| p.id == alice_id));
}
