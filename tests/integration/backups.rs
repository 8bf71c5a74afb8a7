//! Integration tests for the public undo/redo subsystem and cleanup

use std::fs;

use byc::store::{BackupContents, BackupLabel, MAX_LISTED_BACKUPS};
use byc::{ReplayError, Scope, TopicUpdate};

use super::common::TestGame;

/// Test that a bare undo lists the recent backups, newest last
#[tokio::test]
async fn test_undo_lists_recent_backups() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    game.end_turn("adama").await;
    game.end_turn("adama").await;

    let outcome = game.public("roslin", "undo").await.unwrap();
    assert!(outcome.state.is_none());
    assert_eq!(outcome.topic, TopicUpdate::Keep);

    let reply = &outcome.replies[0];
    let lines: Vec<&str> = reply.lines().collect();
    assert_eq!(lines[0], "Pick a state to undo to with **!undo <number>**:");
    assert_eq!(lines.len(), 5);
    // Each line names the state its step brings back
    assert!(lines[1].starts_with("3. Game setup replaced at "));
    assert!(lines[2].starts_with("2. Turn 1.1 at "));
    assert!(lines[3].starts_with("1. Turn 1.2 at "));
    assert!(lines[3].ends_with("posted by adama"));
    assert_eq!(lines[4], "Current game state: Turn 1.3 posted by adama");
}

/// Test that undo and redo restore the exact bytes of earlier states
#[tokio::test]
async fn test_undo_then_redo_restores_bytes() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    let first = game.end_turn("adama").await;
    let second = game.end_turn("adama").await;
    let published = game.publisher.count();

    let outcome = game.public("roslin", "undo 1").await.unwrap();
    assert!(outcome.replies[0].starts_with("Going back 1 game states to: Turn 1.2 at "));
    assert_eq!(game.current_blob(), first.blob);

    let state = outcome.state.unwrap();
    assert_eq!(state.seed.turn(), 1);
    assert_eq!(state.old_seed.turn(), 2);
    let undo = state.backup.unwrap();
    assert_eq!(undo.label, BackupLabel::Undo { depth: 1 });
    assert_eq!(undo.user, "roslin");
    assert_eq!(fs::read_to_string(&undo.path).unwrap(), second.blob);

    let outcome = game.public("roslin", "redo").await.unwrap();
    assert!(outcome.replies[0].starts_with("Going back to the latest undone game state: "));
    assert_eq!(game.current_blob(), second.blob);
    assert_eq!(game.publisher.count(), published + 2);
}

/// Test that every listing line matches the state its step restores
#[tokio::test]
async fn test_listing_labels_match_restored_states() {
    for step in 1..=3 {
        let game = TestGame::new();
        game.quick_start("adama").await;
        game.end_turn("adama").await;
        game.end_turn("adama").await;

        let listing = game.public("roslin", "undo").await.unwrap();
        let marker = format!("{step}. ");
        let label = listing.replies[0]
            .lines()
            .find_map(|line| line.strip_prefix(&marker))
            .unwrap()
            .to_string();

        let outcome = game.public("roslin", &format!("undo {step}")).await.unwrap();
        let restored = BackupContents::from_blob(&game.current_blob());
        match restored.turn_label() {
            Some(turn) => assert!(label.starts_with(&format!("{turn} at ")), "{label}"),
            None => assert!(label.starts_with("Game setup replaced at "), "{label}"),
        }
        assert_eq!(
            outcome.replies[0],
            format!("Going back {step} game states to: {label}...")
        );
    }
}

/// Test that `undo 0` behaves like redo
#[tokio::test]
async fn test_undo_zero_is_redo() {
    let game = TestGame::new();
    let started = game.quick_start("adama").await;
    game.end_turn("adama").await;
    let latest = game.end_turn("adama").await;

    game.public("adama", "undo 2").await.unwrap();
    assert_eq!(game.current_blob(), started.blob);

    game.public("adama", "undo 0").await.unwrap();
    assert_eq!(game.current_blob(), latest.blob);
}

/// Test that steps with nothing behind them fail and change nothing
#[tokio::test]
async fn test_unavailable_steps_are_rejected() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    let latest = game.end_turn("adama").await;

    // The newest backup was taken by a turn, not by an undo
    let err = game.public("adama", "redo").await.unwrap_err();
    assert!(matches!(err, ReplayError::NoBackupAvailable));

    let err = game.public("adama", "undo 9").await.unwrap_err();
    assert!(matches!(err, ReplayError::NoBackupAvailable));
    assert!(err.user_message("!").contains("**!undo**"));

    assert_eq!(game.current_blob(), latest.blob);
    assert_eq!(game.store().backups().unwrap().len(), 2);
}

/// Test that only the most recent backups can be picked
#[tokio::test]
async fn test_listing_is_bounded() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    for _ in 0..MAX_LISTED_BACKUPS + 1 {
        game.end_turn("adama").await;
    }
    assert_eq!(game.store().backups().unwrap().len(), MAX_LISTED_BACKUPS + 2);

    let listing = game.store().listing().unwrap();
    assert_eq!(listing.len(), MAX_LISTED_BACKUPS + 1);
    assert!(listing[0].starts_with(&format!("{MAX_LISTED_BACKUPS}. ")));

    let err = game
        .public("adama", &format!("undo {}", MAX_LISTED_BACKUPS + 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ReplayError::NoBackupAvailable));
    game.public("adama", &format!("undo {MAX_LISTED_BACKUPS}"))
        .await
        .unwrap();
}

/// Test that private undo works on the chain, not on backups
#[tokio::test]
async fn test_private_undo_leaves_backups_alone() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    game.private("adama", "byc").await.unwrap();
    game.private("adama", "choose 3").await.unwrap();

    game.private("adama", "undo").await.unwrap();
    assert_eq!(game.store().backups().unwrap().len(), 1);
    assert!(game.topic("adama", Scope::Private).unwrap().log.is_empty());
}

/// Test that cleanup needs the confirmation token and removes every file
#[tokio::test]
async fn test_cleanup_removes_game() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    game.end_turn("adama").await;

    let err = game.private("adama", "cleanup #1").await.unwrap_err();
    assert!(err.user_message("!").contains("public BYC game channel"));

    let err = game.public("adama", "cleanup").await.unwrap_err();
    assert!(err.user_message("!").contains("**!cleanup #1**"));
    assert!(game.store().exists());

    let outcome = game.public("adama", "cleanup #1").await.unwrap();
    assert_eq!(
        outcome.replies,
        vec!["All items related to the BYC game deleted.".to_string()]
    );
    assert_eq!(outcome.topic, TopicUpdate::Clear);
    assert!(!game.store().exists());

    let leftovers: Vec<String> = fs::read_dir(game.games_dir())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("game-1"))
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");

    let err = game.private("adama", "hand").await.unwrap_err();
    assert!(matches!(err, ReplayError::NoActiveGame));
}

/// Test that the public context can delete a game that is still in setup
#[tokio::test]
async fn test_cleanup_during_setup() {
    let game = TestGame::new();
    game.public("adama", "byc").await.unwrap();
    assert!(game.topic("adama", Scope::Public).is_some());

    let err = game.public("roslin", "cleanup").await.unwrap_err();
    assert!(err.user_message("!").contains("**!cleanup #1**"));

    let outcome = game.public("roslin", "cleanup #1").await.unwrap();
    assert_eq!(outcome.topic, TopicUpdate::Clear);
    assert!(!game.store().exists());
}
