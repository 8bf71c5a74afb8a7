//! Who sent a command, from where, and what it produced

use std::path::PathBuf;

use crate::choice::{ChoiceLog, ChoiceTopic};
use crate::dialog::DialogMeta;
use crate::seed::Seed;
use crate::store::BackupRecord;

/// Where a command was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The game's own shared context
    Public,
    /// A player's private context
    Private,
}

/// Everything the engine needs to know about the sender of a command
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub game_id: u64,
    pub user: String,
    pub scope: Scope,
    /// Canonical names of entities mentioned in the command
    pub mentions: Vec<String>,
    /// Topic currently attached to the context, if it holds a chain
    pub topic: Option<ChoiceTopic>,
    /// Text `cleanup` must be given to delete the game
    pub confirmation_token: String,
}

impl CommandContext {
    pub fn new(game_id: u64, user: impl Into<String>, scope: Scope) -> Self {
        Self {
            game_id,
            user: user.into(),
            scope,
            mentions: Vec::new(),
            topic: None,
            confirmation_token: format!("#{game_id}"),
        }
    }

    pub fn with_topic(mut self, topic: Option<ChoiceTopic>) -> Self {
        self.topic = topic;
        self
    }

    pub fn with_mentions(mut self, mentions: Vec<String>) -> Self {
        self.mentions = mentions;
        self
    }

    pub fn with_confirmation_token(mut self, token: impl Into<String>) -> Self {
        self.confirmation_token = token.into();
        self
    }

    pub fn is_public(&self) -> bool {
        self.scope == Scope::Public
    }

    /// The chain recorded in the topic, or an empty one
    pub fn current_topic(&self) -> ChoiceTopic {
        self.topic
            .clone()
            .unwrap_or_else(|| ChoiceTopic::new(self.game_id, DialogMeta::default(), ChoiceLog::new()))
    }
}

/// How the context's topic changes after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicUpdate {
    Keep,
    Set(ChoiceTopic),
    /// The idle topic of a public game context
    Idle,
    /// No topic at all; the game is gone
    Clear,
}

/// A terminal game state that was persisted
#[derive(Debug, Clone)]
pub struct StateUpdate {
    pub game_id: u64,
    pub user: String,
    pub blob: String,
    pub old_seed: Seed,
    pub seed: Seed,
    pub initial_setup: bool,
    /// Backup taken of the replaced state
    pub backup: Option<BackupRecord>,
    pub screenshot: Option<PathBuf>,
}

/// Result of a handled command
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Messages for the sender, in order
    pub replies: Vec<String>,
    pub topic: TopicUpdate,
    pub state: Option<StateUpdate>,
}

impl CommandOutcome {
    pub fn reply(message: impl Into<String>) -> Self {
        Self {
            replies: vec![message.into()],
            topic: TopicUpdate::Keep,
            state: None,
        }
    }
}
