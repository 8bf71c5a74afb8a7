//! Integration tests for driving dialog chains
//!
//! Tests the flow: command -> ChoiceCompiler -> SessionDriver -> scripted
//! program -> persisted state, topic and replies.

use std::fs;

use serde_json::json;

use byc::choice::ChoiceEntry;
use byc::core::NEW_GAME_BLOB;
use byc::driver::{MockConfig, ScriptedGame, SurfaceCall};
use byc::session::SessionKey;
use byc::store::BackupLabel;
use byc::{ChoiceTopic, CommandContext, ReplayError, Scope};

use super::common::{TestGame, GAME_ID};

fn opens(calls: &[SurfaceCall]) -> usize {
    calls
        .iter()
        .filter(|call| matches!(call, SurfaceCall::Open { .. }))
        .count()
}

/// Test that starting a game and choosing the quick setup writes round one
#[tokio::test]
async fn test_quick_start_persists_first_round() {
    let game = TestGame::new();

    let first = game.private("adama", "byc").await.unwrap();
    assert_eq!(first.replies.len(), 2);
    assert!(first.replies[0].starts_with(NEW_GAME_BLOB));
    assert!(first.replies[0].contains("Only adama will be able to answer"));
    assert!(first.replies[1].contains("Quick start"));
    assert!(first.state.is_none());

    let topic = game.topic("adama", Scope::Private).unwrap();
    assert_eq!(topic.log.setup_owner.as_deref(), Some("adama"));

    let outcome = game.private("adama", "choose start").await.unwrap();
    let state = outcome.state.expect("setup ends in a game state");
    assert!(state.initial_setup);
    assert_eq!(state.seed.round(), Some(1));
    assert_eq!(state.seed.turn(), 0);
    assert!(state.old_seed.is_empty());
    // The program's prompt style is forced to the plain one
    assert_eq!(state.seed.get("promptStyle"), Some(&json!([1, 1, 1])));
    assert_eq!(game.current_blob(), state.blob);

    let backup = state.backup.expect("the new-game state is backed up");
    assert_eq!(backup.label, BackupLabel::Advance { round: 1, turn: 0 });
    assert_eq!(backup.user, "adama");
    assert_eq!(fs::read_to_string(&backup.path).unwrap(), NEW_GAME_BLOB);

    assert_eq!(game.publisher.count(), 1);
    let topic = game.topic("adama", Scope::Private).unwrap();
    assert!(topic.log.is_empty());
    assert!(topic.log.setup_owner.is_none());
}

/// Test that setup dialogs in the public context belong to the starter
#[tokio::test]
async fn test_setup_is_owned_by_starter() {
    let game = TestGame::new();
    game.public("adama", "byc").await.unwrap();

    let err = game.public("roslin", "choose start").await.unwrap_err();
    assert!(matches!(err, ReplayError::SetupInProgress { ref owner } if owner == "adama"));
    assert!(err.user_message("!").contains("Only adama is able"));

    let outcome = game.public("adama", "choose start").await.unwrap();
    assert!(outcome.state.is_some());
    // Setup is over, the public context is idle again
    assert!(game.topic("adama", Scope::Public).is_none());

    let err = game.public("roslin", "hand").await.unwrap_err();
    assert!(matches!(err, ReplayError::NotPublic));
}

/// Test that custom setup takes mentioned players by their canonical name
#[tokio::test]
async fn test_custom_setup_with_mentions() {
    let game = TestGame::with_game(ScriptedGame::new().with_players(2));
    game.private("adama", "byc").await.unwrap();

    let outcome = game.private("adama", "cancel").await.unwrap();
    let reply = outcome.replies.last().unwrap();
    assert!(reply.contains("Enter the name of player 1 of 2"));
    assert!(reply.contains("**!choose** <input>"));

    let ctx = CommandContext::new(GAME_ID, "adama", Scope::Private)
        .with_mentions(vec!["adama".to_string()]);
    game.send(ctx, "choose @Adama").await.unwrap();
    game.private("adama", "choose roslin").await.unwrap();

    let topic = game.topic("adama", Scope::Private).unwrap();
    assert_eq!(
        topic.log.entries,
        vec![
            ChoiceEntry::Button(2),
            ChoiceEntry::Input("adama".into()),
            ChoiceEntry::Input("roslin".into()),
        ]
    );

    let outcome = game.private("adama", "ok").await.unwrap();
    let state = outcome.state.unwrap();
    assert_eq!(state.seed.players(), vec!["adama", "roslin"]);
}

/// Test that a chain continues in the live program without reloading
#[tokio::test]
async fn test_private_chain_resumes_live_session() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    game.game.reset_calls();
    let key = SessionKey::new(GAME_ID, "adama");

    game.private("adama", "byc").await.unwrap();
    let outcome = game.private("adama", "choose 3").await.unwrap();
    assert!(outcome.replies[0].starts_with("End your turn?"));
    assert!(outcome.replies[0].contains("**!ok**: Yes"));
    assert!(game.core.sessions().contains(&key));

    let outcome = game.private("adama", "ok").await.unwrap();
    let state = outcome.state.unwrap();
    assert_eq!(state.seed.turn(), 1);
    assert_eq!(
        state.backup.unwrap().label,
        BackupLabel::Advance { round: 1, turn: 1 }
    );

    let calls = game.game.calls();
    assert_eq!(opens(&calls), 1);
    assert!(calls.contains(&SurfaceCall::EnterText("3".into())));
    assert!(calls.contains(&SurfaceCall::Press(2)));
    // Finished sessions are not kept around
    assert!(!game.core.sessions().contains(&key));
}

/// Test that a program that switched to another player is reloaded
#[tokio::test]
async fn test_identity_switch_forces_reload() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    game.private("adama", "byc").await.unwrap();
    game.game.reset_calls();

    game.game.set_identity_override(Some("roslin".to_string()));
    game.private("adama", "choose 3").await.unwrap();
    game.game.set_identity_override(None);

    let calls = game.game.calls();
    assert_eq!(
        calls,
        vec![
            SurfaceCall::Open {
                user: "adama".into()
            },
            SurfaceCall::EnterText("3".into()),
        ]
    );
}

/// Test that single-button dialogs are answered on the player's behalf
#[tokio::test]
async fn test_hand_report_answers_option_less_dialogs() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    game.private("adama", "byc").await.unwrap();

    let outcome = game.private("adama", "hand").await.unwrap();
    assert_eq!(
        outcome.replies[0],
        "Your hand: Politics 2, Leadership 3, Tactics 1"
    );
    assert!(outcome.replies[1].contains("Show Hand Report (**!hand**)"));
    assert!(outcome.state.is_none());

    let topic = game.topic("adama", Scope::Private).unwrap();
    assert_eq!(
        topic.log.entries,
        vec![
            ChoiceEntry::Input("1".into()),
            ChoiceEntry::Button(1),
            ChoiceEntry::Button(1),
        ]
    );
    assert!(topic.dialog.is_main_menu());
}

/// Test that undo rebuilds the program from the saved state
#[tokio::test]
async fn test_undo_replays_truncated_log() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    game.private("adama", "byc").await.unwrap();
    game.private("adama", "hand").await.unwrap();
    game.game.reset_calls();

    let outcome = game.private("adama", "undo").await.unwrap();
    assert_eq!(outcome.replies[0], "Undoing last 1 choice(s)...");
    assert!(outcome.replies[1].starts_with("Your hand:"));
    assert!(outcome.replies[1].ends_with(", **!undo**"));

    assert_eq!(
        game.game.calls(),
        vec![
            SurfaceCall::Open {
                user: "adama".into()
            },
            SurfaceCall::EnterText("1".into()),
            SurfaceCall::Press(1),
        ]
    );
    let topic = game.topic("adama", Scope::Private).unwrap();
    assert_eq!(topic.log.len(), 2);
}

/// Test that reset brings back exactly the dialog of a fresh start
#[tokio::test]
async fn test_reset_matches_fresh_start() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    let fresh = game.private("adama", "byc").await.unwrap();
    game.private("adama", "hand").await.unwrap();

    let outcome = game.private("adama", "reset").await.unwrap();
    assert!(outcome.replies[0].starts_with("Reverting to the state when you last used **!byc**"));
    assert_eq!(outcome.replies[1], fresh.replies[0]);
    assert!(game.topic("adama", Scope::Private).unwrap().log.is_empty());
}

/// Test that an unknown option leaves the chain where it was
#[tokio::test]
async fn test_unknown_option_keeps_session() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    game.private("adama", "byc").await.unwrap();
    game.private("adama", "choose 3").await.unwrap();

    let err = game.private("adama", "choose 7").await.unwrap_err();
    assert!(matches!(err, ReplayError::UnknownOption(ref value) if value == "7"));
    assert!(game
        .core
        .sessions()
        .contains(&SessionKey::new(GAME_ID, "adama")));
    let topic = game.topic("adama", Scope::Private).unwrap();
    assert_eq!(topic.log.entries, vec![ChoiceEntry::Input("3".into())]);
}

/// Test that blank text is refused so the saved chain matches the applied one
#[tokio::test]
async fn test_blank_choice_is_refused() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    game.private("adama", "byc").await.unwrap();

    let err = game.private("adama", "choose").await.unwrap_err();
    assert!(matches!(err, ReplayError::UnknownOption(ref value) if value.is_empty()));

    game.private("adama", "choose 3").await.unwrap();
    let topic = game.topic("adama", Scope::Private).unwrap();
    let reloaded = ChoiceTopic::decode(&topic.encode()).unwrap();
    assert_eq!(reloaded.log, topic.log);
    assert_eq!(topic.log.entries, vec![ChoiceEntry::Input("3".into())]);
}

/// Test that the main-menu hint rejects cancel and suggests commit
#[tokio::test]
async fn test_cancel_in_main_menu_is_rejected() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    game.private("adama", "byc").await.unwrap();

    let err = game.private("adama", "cancel").await.unwrap_err();
    assert!(err.user_message("!").contains("**!commit**"));

    let outcome = game.private("adama", "commit").await.unwrap();
    let state = outcome.state.unwrap();
    // Saving without changes writes the same state back
    assert!(state.backup.is_none());
    assert_eq!(game.current_blob(), state.blob);
}

/// Test that a dialog that never closes drops the session
#[tokio::test]
async fn test_stuck_dialog_drops_session() {
    let game = TestGame::with_config(MockConfig::default().stuck_after(0));
    game.private("adama", "byc").await.unwrap();

    let err = game.private("adama", "choose start").await.unwrap_err();
    assert!(matches!(err, ReplayError::StuckDialog));
    assert!(err.is_infrastructure());
    assert!(!game
        .core
        .sessions()
        .contains(&SessionKey::new(GAME_ID, "adama")));
    assert_eq!(game.current_blob(), NEW_GAME_BLOB);
    assert_eq!(game.publisher.count(), 0);

    // The chain is still there for the next attempt
    let topic = game.topic("adama", Scope::Private).unwrap();
    assert_eq!(topic.log.setup_owner.as_deref(), Some("adama"));
}

/// Test that a hot script update unsticks the open dialog
#[tokio::test]
async fn test_script_update_unsticks_dialog() {
    let game = TestGame::with_config(MockConfig::default().stuck_after(0).with_script_update());
    let state = game.quick_start("adama").await;
    assert_eq!(state.seed.round(), Some(1));
    assert!(game.game.calls().contains(&SurfaceCall::ReloadScript));
}

/// Test that commands other than start need a game
#[tokio::test]
async fn test_commands_need_an_active_game() {
    let game = TestGame::new();
    let err = game.private("adama", "hand").await.unwrap_err();
    assert!(matches!(err, ReplayError::NoActiveGame));
    assert!(!game.store().exists());
}

/// Test that an empty state file is no game, and start sets one up
#[tokio::test]
async fn test_empty_state_file_is_no_game() {
    let game = TestGame::new();
    fs::create_dir_all(game.games_dir()).unwrap();
    fs::write(game.store().state_path(), "").unwrap();

    let err = game.private("adama", "hand").await.unwrap_err();
    assert!(matches!(err, ReplayError::NoActiveGame));
    assert_eq!(game.publisher.count(), 0);

    let outcome = game.private("adama", "byc").await.unwrap();
    assert!(outcome.replies[0].contains("Only adama will be able to answer"));
    assert_eq!(game.current_blob(), NEW_GAME_BLOB);
    let topic = game.topic("adama", Scope::Private).unwrap();
    assert_eq!(topic.log.setup_owner.as_deref(), Some("adama"));
}

/// Test that the public context only takes game-wide commands
#[tokio::test]
async fn test_public_context_rejects_private_commands() {
    let game = TestGame::new();
    game.quick_start("adama").await;

    for line in ["hand", "ok", "choose 1", "reset"] {
        let err = game.public("adama", line).await.unwrap_err();
        assert!(matches!(err, ReplayError::NotPublic), "{line}");
    }
}

/// Test that posting the state publicly leaves the game unchanged
#[tokio::test]
async fn test_public_state_posts_without_backup() {
    let game = TestGame::new();
    let started = game.quick_start("adama").await;

    let outcome = game.public("adama", "state").await.unwrap();
    let state = outcome.state.unwrap();
    assert!(state.backup.is_none());
    assert_eq!(state.blob, started.blob);
    assert_eq!(game.publisher.count(), 2);
    assert!(game.topic("adama", Scope::Public).is_none());
    assert_eq!(game.store().backups().unwrap().len(), 1);
}

/// Test that the private state command stops on the game state display
#[tokio::test]
async fn test_private_state_relays_spoiler_prompt() {
    let game = TestGame::new();
    game.quick_start("adama").await;
    game.private("adama", "byc").await.unwrap();

    let outcome = game.private("adama", "state").await.unwrap();
    assert_eq!(outcome.replies.len(), 2);
    assert!(outcome.replies[0].contains("may reveal hidden information"));
    assert_eq!(
        outcome.replies[1],
        "Options: **!commit**: Save and Quit, **!undo 2**, **!reset**"
    );
    let topic = game.topic("adama", Scope::Private).unwrap();
    assert_eq!(
        topic.log.entries,
        vec![ChoiceEntry::Input("2".into()), ChoiceEntry::Button(2)]
    );

    let outcome = game.private("adama", "commit").await.unwrap();
    assert!(outcome.state.is_some());
}

/// Test that different players never wait on each other
#[tokio::test]
async fn test_players_run_concurrently() {
    let game = TestGame::new();
    game.quick_start("adama").await;

    let (a, b) = tokio::join!(game.private("adama", "byc"), game.private("roslin", "byc"));
    assert!(a.unwrap().replies[0].contains("Choose an action"));
    assert!(b.unwrap().replies[0].contains("Choose an action"));
    assert_eq!(game.core.sessions().len(), 2);
}
