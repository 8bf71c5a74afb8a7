//! Shared test utilities for the replay engine
//!
//! Provides a [`TestGame`] that wires a [`ReplayCore`] to the scripted
//! game program inside a temporary directory and keeps every context's
//! topic between commands, the way a chat channel would.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use byc::core::StateUpdate;
use byc::driver::{MockConfig, ScriptedGame};
use byc::{
    ChoiceTopic, Command, CommandContext, CommandOutcome, Config, Publisher, ReplayCore,
    ReplayError, Scope, SnapshotStore, TopicUpdate,
};

pub const GAME_ID: u64 = 1;

/// Publisher that keeps every state update it receives
#[derive(Default)]
pub struct RecordingPublisher {
    updates: Mutex<Vec<StateUpdate>>,
}

impl RecordingPublisher {
    pub fn updates(&self) -> Vec<StateUpdate> {
        self.updates.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.updates.lock().len()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish_state(&self, update: &StateUpdate) -> anyhow::Result<()> {
        self.updates.lock().push(update.clone());
        Ok(())
    }
}

/// A game engine over the scripted program, with per-context topics
pub struct TestGame {
    pub dir: TempDir,
    pub game: ScriptedGame,
    pub publisher: Arc<RecordingPublisher>,
    pub core: ReplayCore,
    topics: Mutex<HashMap<(bool, String), ChoiceTopic>>,
}

impl TestGame {
    pub fn new() -> Self {
        Self::with_game(ScriptedGame::new())
    }

    pub fn with_config(config: MockConfig) -> Self {
        Self::with_game(ScriptedGame::new().with_config(config))
    }

    pub fn with_game(game: ScriptedGame) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = Config::default()
            .with_games_dir(dir.path().join("games"))
            .with_dialog_timeout(Duration::from_millis(50));
        let publisher = Arc::new(RecordingPublisher::default());
        let core = ReplayCore::new(
            config,
            Arc::new(game.clone()),
            Arc::clone(&publisher) as Arc<dyn Publisher>,
        );
        Self {
            dir,
            game,
            publisher,
            core,
            topics: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> SnapshotStore {
        self.core.store(GAME_ID)
    }

    pub fn games_dir(&self) -> PathBuf {
        self.dir.path().join("games")
    }

    pub fn current_blob(&self) -> String {
        self.store().read_current().expect("state file readable")
    }

    /// Topic currently attached to a context
    pub fn topic(&self, user: &str, scope: Scope) -> Option<ChoiceTopic> {
        self.topics.lock().get(&key(user, scope)).cloned()
    }

    pub async fn private(&self, user: &str, line: &str) -> Result<CommandOutcome, ReplayError> {
        self.send(CommandContext::new(GAME_ID, user, Scope::Private), line)
            .await
    }

    pub async fn public(&self, user: &str, line: &str) -> Result<CommandOutcome, ReplayError> {
        self.send(CommandContext::new(GAME_ID, user, Scope::Public), line)
            .await
    }

    /// Run `line` in `ctx`, with the context's stored topic attached.
    pub async fn send(
        &self,
        ctx: CommandContext,
        line: &str,
    ) -> Result<CommandOutcome, ReplayError> {
        let topic_key = key(&ctx.user, ctx.scope);
        let ctx = ctx.with_topic(self.topics.lock().get(&topic_key).cloned());
        let command = parse(line);

        let outcome = self.core.handle(&ctx, &command).await?;
        let mut topics = self.topics.lock();
        match &outcome.topic {
            TopicUpdate::Keep => {}
            TopicUpdate::Set(topic) => {
                topics.insert(topic_key, topic.clone());
            }
            TopicUpdate::Idle | TopicUpdate::Clear => {
                topics.remove(&topic_key);
            }
        }
        Ok(outcome)
    }

    /// Start a game with the quick setup; `user` becomes player 1.
    pub async fn quick_start(&self, user: &str) -> StateUpdate {
        self.private(user, "byc").await.expect("byc");
        let outcome = self.private(user, "choose start").await.expect("choose start");
        outcome.state.expect("setup writes a game state")
    }

    /// End the current turn from the main menu
    pub async fn end_turn(&self, user: &str) -> StateUpdate {
        self.private(user, "byc").await.expect("byc");
        self.private(user, "choose 3").await.expect("choose 3");
        let outcome = self.private(user, "ok").await.expect("ok");
        outcome.state.expect("ending the turn writes a game state")
    }
}

impl Default for TestGame {
    fn default() -> Self {
        Self::new()
    }
}

/// Players share the public topic; each has a private one
fn key(user: &str, scope: Scope) -> (bool, String) {
    match scope {
        Scope::Public => (true, String::new()),
        Scope::Private => (false, user.to_string()),
    }
}

/// Parse a command line such as `choose 3`
pub fn parse(line: &str) -> Command {
    let mut words = line.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<String> = words.map(str::to_string).collect();
    Command::parse(name, &args).unwrap_or_else(|| panic!("unknown command: {line}"))
}
