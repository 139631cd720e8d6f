//! Tests for ordered, best-effort event recording.

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::{play_clicks, pos, temp_store, winning_clicks, winning_game};
use knight_swap::{
    ApiClient, Board, ClientError, Completion, DbError, DbErrorKind, GameEvent, Move, PuzzleGame, Replay, Session,
    SessionId, SessionRecorder, SessionStatus, SessionStore, SessionSummary, Stats, StoreError,
    server,
};

/// In-memory store that logs calls and fails on request.
#[derive(Default)]
struct FakeStore {
    calls: Mutex<Vec<String>>,
    fail_create: bool,
    fail_append_at: Option<usize>,
}

impl FakeStore {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: String) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls.len()
    }

    fn failure() -> StoreError {
        StoreError::Database(DbError::new(DbErrorKind::Query, "disk on fire"))
    }
}

#[async_trait]
impl SessionStore for FakeStore {
    async fn create_session(&self) -> Result<SessionId, StoreError> {
        self.log("create".to_string());
        if self.fail_create {
            return Err(Self::failure());
        }
        Ok("s1".to_string())
    }

    async fn append_move(&self, id: &str, mv: Move) -> Result<(), StoreError> {
        let appends = self.calls().iter().filter(|c| c.starts_with("append")).count();
        self.log(format!("append {} {}", id, mv.timestamp));
        if self.fail_append_at == Some(appends) {
            return Err(Self::failure());
        }
        Ok(())
    }

    async fn complete_session(
        &self,
        id: &str,
        is_won: bool,
        duration_seconds: u32,
    ) -> Result<(), StoreError> {
        self.log(format!("complete {} {} {}", id, is_won, duration_seconds));
        Ok(())
    }

    async fn get_session(&self, id: &str) -> Result<Session, StoreError> {
        Err(StoreError::NotFound(id.to_string()))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, StoreError> {
        Ok(Vec::new())
    }

    async fn get_stats(&self) -> Result<Stats, StoreError> {
        Ok(Stats::compute(0, &[]))
    }
}

fn move_at(timestamp: u64) -> GameEvent {
    GameEvent::MoveRecorded(Move::new(
        pos(2, 0),
        pos(0, 1),
        knight_swap::Side::White,
        timestamp,
    ))
}

fn completion(is_won: bool) -> GameEvent {
    GameEvent::SessionCompleted(Completion {
        is_won,
        total_moves: 3,
        duration_seconds: 9,
    })
}

#[tokio::test]
async fn test_events_are_written_in_order() {
    let store = Arc::new(FakeStore::default());
    let recorder = SessionRecorder::spawn(store.clone());

    recorder.record(GameEvent::SessionStarted);
    recorder.record_all([move_at(0), move_at(10), move_at(20), completion(true)]);
    recorder.flush().await;

    assert_eq!(
        store.calls(),
        [
            "create",
            "append s1 0",
            "append s1 10",
            "append s1 20",
            "complete s1 true 9"
        ]
    );
    let status = recorder.status();
    assert_eq!(status.session_id().as_deref(), Some("s1"));
    assert_eq!(*status.persisted_moves(), 3);
    assert_eq!(*status.failures(), 0);
    assert!(status.last_error().is_none());
}

#[tokio::test]
async fn test_failed_create_drops_the_game() {
    let store = Arc::new(FakeStore {
        fail_create: true,
        ..FakeStore::default()
    });
    let recorder = SessionRecorder::spawn(store.clone());

    recorder.record_all([
        GameEvent::SessionStarted,
        move_at(0),
        move_at(10),
        completion(false),
    ]);
    let status = recorder.shutdown().await;

    assert_eq!(store.calls(), ["create"]);
    assert_eq!(*status.failures(), 1);
    assert!(status.last_error().as_deref().unwrap().contains("disk on fire"));
    assert!(status.session_id().is_none());
    assert_eq!(*status.persisted_moves(), 0);
}

#[tokio::test]
async fn test_failed_append_does_not_stop_later_writes() {
    let store = Arc::new(FakeStore {
        fail_append_at: Some(1),
        ..FakeStore::default()
    });
    let recorder = SessionRecorder::spawn(store.clone());

    recorder.record_all([
        GameEvent::SessionStarted,
        move_at(0),
        move_at(10),
        move_at(20),
        completion(false),
    ]);
    let status = recorder.shutdown().await;

    assert_eq!(store.calls().len(), 5);
    assert_eq!(store.calls()[4], "complete s1 false 9");
    assert_eq!(*status.failures(), 1);
    assert_eq!(*status.persisted_moves(), 2);
}

#[tokio::test]
async fn test_next_game_opens_a_new_session() {
    let store = Arc::new(FakeStore::default());
    let recorder = SessionRecorder::spawn(store.clone());

    recorder.record_all([GameEvent::SessionStarted, move_at(0), completion(false)]);
    // Moves after a completion need a new SessionStarted.
    recorder.record(move_at(5));
    recorder.record_all([GameEvent::SessionStarted, move_at(7)]);
    recorder.shutdown().await;

    assert_eq!(
        store.calls(),
        [
            "create",
            "append s1 0",
            "complete s1 false 9",
            "create",
            "append s1 7"
        ]
    );
}

#[tokio::test]
async fn test_abandon_after_two_moves_is_stored() {
    let (_db, store) = temp_store(100).await;
    let store = Arc::new(store);
    let recorder = SessionRecorder::spawn(store.clone());

    let mut game = PuzzleGame::new();
    let clicks = winning_clicks();
    recorder.record_all(play_clicks(&mut game, &clicks[..2]));
    recorder.record_all(game.abandon());
    let status = recorder.shutdown().await;
    assert_eq!(*status.failures(), 0);

    let sessions = store.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(*sessions[0].total_moves(), 2);
    assert!(!*sessions[0].is_won());
    assert_eq!(*sessions[0].status(), SessionStatus::Abandoned);
}

#[tokio::test]
async fn test_won_game_over_http() {
    let (_db, store) = temp_store(100).await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(
        listener,
        Arc::new(store),
        std::future::pending::<()>(),
    ));

    let client = ApiClient::new(format!("http://{}", addr));
    client.health().await.expect("Server not healthy");

    let recorder = SessionRecorder::spawn(Arc::new(client.clone()));
    let mut game = PuzzleGame::new();
    recorder.record_all(play_clicks(&mut game, &winning_clicks()));
    let status = recorder.shutdown().await;
    assert_eq!(*status.failures(), 0);
    assert_eq!(*status.persisted_moves(), 16);

    let id = status.session_id().clone().expect("session created");
    let session = client.get_session(&id).await.unwrap();
    let (expected_moves, expected) = winning_game();
    assert!(*session.is_won());
    assert_eq!(*session.total_moves(), 16);
    assert_eq!(*session.duration_seconds(), Some(expected.duration_seconds));
    assert_eq!(session.moves().len(), expected_moves.len());
    assert_eq!(Replay::new(session.into_moves()).validate().unwrap(), Board::winning());

    let frame = client.replay_frame(&id, 100).await.unwrap();
    assert_eq!(frame.index, 15);
    assert_eq!(frame.board, Board::winning());

    let stats = client.get_stats().await.unwrap();
    assert_eq!(*stats.wins(), 1);
    assert_eq!(*stats.best_moves(), Some(16));
    assert_eq!(client.list_sessions().await.unwrap().len(), 1);

    assert!(matches!(
        client.get_session("missing").await,
        Err(ClientError::NotFound(_))
    ));
    assert!(matches!(
        client.complete_session(&id, false, 1).await,
        Err(ClientError::AlreadyCompleted(done)) if done == id
    ));
    assert!(matches!(
        SessionStore::append_move(&client, &id, expected_moves[0]).await,
        Err(StoreError::AlreadyCompleted(_))
    ));
}
