//! Tests for the SQLite session store.

mod common;

use common::{bogus_move, temp_store, winning_game};
use diesel::prelude::*;
use diesel::sql_types::Text;
use knight_swap::{
    Board, Replay, SessionStatus, SessionStore, SqliteSessionStore, StoreError, board_at_index,
};

#[tokio::test]
async fn test_new_session_is_empty_and_in_progress() {
    let (_db, store) = temp_store(100).await;
    let id = store.create_session().await.expect("Create failed");

    let session = store.get_session(&id).await.expect("Get failed");
    assert_eq!(session.id(), &id);
    assert_eq!(*session.total_moves(), 0);
    assert!(session.moves().is_empty());
    assert!(!*session.is_won());
    assert_eq!(session.status(), SessionStatus::InProgress);
}

#[tokio::test]
async fn test_session_ids_are_unique() {
    let (_db, store) = temp_store(100).await;
    let a = store.create_session().await.unwrap();
    let b = store.create_session().await.unwrap();
    assert_ne!(a, b);
}

#[tokio::test]
async fn test_appends_preserve_order_and_count() {
    let (_db, store) = temp_store(100).await;
    let id = store.create_session().await.unwrap();
    let (moves, _) = winning_game();

    for mv in &moves[..5] {
        store.append_move(&id, *mv).await.expect("Append failed");
    }

    let session = store.get_session(&id).await.unwrap();
    assert_eq!(*session.total_moves(), 5);
    assert_eq!(session.moves().len(), 5);
    assert_eq!(session.moves(), &moves[..5]);
}

#[tokio::test]
async fn test_abandon_after_two_moves_keeps_count() {
    let (_db, store) = temp_store(100).await;
    let id = store.create_session().await.unwrap();
    let (moves, _) = winning_game();
    store.append_move(&id, moves[0]).await.unwrap();
    store.append_move(&id, moves[1]).await.unwrap();

    store.complete_session(&id, false, 7).await.expect("Complete failed");

    let session = store.get_session(&id).await.unwrap();
    assert!(!*session.is_won());
    assert_eq!(*session.total_moves(), 2);
    assert_eq!(*session.duration_seconds(), Some(7));
    assert!(session.completed_at().is_some());
    assert_eq!(session.status(), SessionStatus::Abandoned);
}

#[tokio::test]
async fn test_stored_winning_log_replays_to_winning_board() {
    let (_db, store) = temp_store(100).await;
    let id = store.create_session().await.unwrap();
    let (moves, completion) = winning_game();
    for mv in &moves {
        store.append_move(&id, *mv).await.unwrap();
    }
    store
        .complete_session(&id, true, completion.duration_seconds)
        .await
        .unwrap();

    let session = store.get_session(&id).await.unwrap();
    assert_eq!(*session.total_moves(), 16);
    assert_eq!(session.status(), SessionStatus::Won);
    assert_eq!(board_at_index(session.moves(), 15).unwrap(), Board::winning());
    assert_eq!(board_at_index(session.moves(), -1).unwrap(), Board::initial());
    assert_eq!(
        Replay::new(session.into_moves()).validate().unwrap(),
        Board::winning()
    );
}

#[tokio::test]
async fn test_completion_is_terminal() {
    let (_db, store) = temp_store(100).await;
    let id = store.create_session().await.unwrap();
    let (moves, _) = winning_game();
    for mv in &moves {
        store.append_move(&id, *mv).await.unwrap();
    }
    store.complete_session(&id, true, 30).await.unwrap();

    assert!(matches!(
        store.complete_session(&id, false, 99).await,
        Err(StoreError::AlreadyCompleted(done)) if done == id
    ));
    assert!(matches!(
        store.append_move(&id, moves[0]).await,
        Err(StoreError::AlreadyCompleted(_))
    ));

    let session = store.get_session(&id).await.unwrap();
    assert!(*session.is_won());
    assert_eq!(*session.duration_seconds(), Some(30));
    assert_eq!(*session.total_moves(), 16);
    assert_eq!(session.status(), SessionStatus::Won);
}

#[tokio::test]
async fn test_missing_session_is_not_found() {
    let (_db, store) = temp_store(100).await;
    let (moves, _) = winning_game();

    assert!(matches!(
        store.get_session("missing").await,
        Err(StoreError::NotFound(id)) if id == "missing"
    ));
    assert!(matches!(
        store.append_move("missing", moves[0]).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.complete_session("missing", true, 1).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_is_newest_first_and_bounded() {
    let (_db, store) = temp_store(2).await;
    let first = store.create_session().await.unwrap();
    let second = store.create_session().await.unwrap();
    let third = store.create_session().await.unwrap();

    let listed: Vec<String> = store
        .list_sessions()
        .await
        .unwrap()
        .iter()
        .map(|s| s.id().clone())
        .collect();
    assert_eq!(listed, vec![third, second]);
    assert!(!listed.contains(&first));
}

#[tokio::test]
async fn test_stats_cover_won_sessions_only() {
    let (_db, store) = temp_store(100).await;
    let (moves, _) = winning_game();

    let stats = store.get_stats().await.unwrap();
    assert_eq!(*stats.total_games(), 0);
    assert_eq!(*stats.best_moves(), None);

    for (count, seconds) in [(16usize, 40u32), (4, 90)] {
        let id = store.create_session().await.unwrap();
        for mv in &moves[..count] {
            store.append_move(&id, *mv).await.unwrap();
        }
        store.complete_session(&id, true, seconds).await.unwrap();
    }
    let abandoned = store.create_session().await.unwrap();
    store.append_move(&abandoned, moves[0]).await.unwrap();
    store.complete_session(&abandoned, false, 3).await.unwrap();
    store.create_session().await.unwrap();

    let stats = store.get_stats().await.unwrap();
    assert_eq!(*stats.total_games(), 4);
    assert_eq!(*stats.wins(), 2);
    assert_eq!(*stats.avg_moves_to_win(), Some(10.0));
    assert_eq!(*stats.best_moves(), Some(4));
    assert_eq!(*stats.avg_time_to_win(), Some(65.0));
    assert_eq!(*stats.best_time(), Some(40));
    assert!((stats.win_rate() - 50.0).abs() < 0.001);
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let (db, store) = temp_store(100).await;
    let id = store.create_session().await.unwrap();
    store.append_move(&id, winning_game().0[0]).await.unwrap();
    drop(store);

    let reopened = SqliteSessionStore::open(db.path().to_str().unwrap(), 100)
        .await
        .expect("Reopen failed");
    assert_eq!(*reopened.get_session(&id).await.unwrap().total_moves(), 1);
}

#[tokio::test]
async fn test_store_accepts_moves_it_cannot_replay() {
    let (_db, store) = temp_store(100).await;
    let id = store.create_session().await.unwrap();
    store.append_move(&id, bogus_move()).await.unwrap();

    let session = store.get_session(&id).await.unwrap();
    assert!(Replay::new(session.into_moves()).validate().is_err());
}

#[tokio::test]
async fn test_undecodable_log_is_corrupt() {
    let (db, store) = temp_store(100).await;
    let id = store.create_session().await.unwrap();

    let mut conn = SqliteConnection::establish(db.path().to_str().unwrap()).unwrap();
    diesel::sql_query("UPDATE game_sessions SET moves = 'not json' WHERE id = ?")
        .bind::<Text, _>(id.clone())
        .execute(&mut conn)
        .unwrap();

    assert!(matches!(
        store.get_session(&id).await,
        Err(StoreError::Corrupt { id: bad, .. }) if bad == id
    ));
    // Listing does not decode logs.
    assert_eq!(store.list_sessions().await.unwrap().len(), 1);
}
