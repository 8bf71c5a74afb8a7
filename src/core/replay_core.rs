//! The command loop: compile, drive, persist, publish

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::choice::{ChoiceCompiler, ChoiceEntry, ChoiceLog, ChoiceTopic, Command, CompileInput};
use crate::config::Config;
use crate::core::collab::{NoScreenshots, Publisher, ScreenshotRenderer};
use crate::core::context::{CommandContext, CommandOutcome, StateUpdate, TopicUpdate};
use crate::core::hooks::HookSet;
use crate::dialog::{dialog_message, dialog_options, state_posted_options, DialogMeta};
use crate::driver::{DriverError, DriverOutcome, SessionDriver, SurfaceFactory};
use crate::error::ReplayError;
use crate::seed::StateCodec;
use crate::session::{GameLocks, SessionCache, SessionKey, SessionSlot};
use crate::store::{BackupContents, SnapshotStore};

/// State a new game starts from
pub const NEW_GAME_BLOB: &str = "Starting a new BYC game...\n";

/// Dialogs answered without the player before a command gives up
const MAX_AUTO_STEPS: usize = 64;

/// Drives every player's dialog chain against the game program.
///
/// One instance serves all games. Commands for the same game and player
/// run one at a time; the state file of a game is only touched under that
/// game's lock.
pub struct ReplayCore {
    config: Config,
    surfaces: Arc<dyn SurfaceFactory>,
    publisher: Arc<dyn Publisher>,
    renderer: Arc<dyn ScreenshotRenderer>,
    hooks: HookSet,
    sessions: SessionCache,
    game_locks: GameLocks,
}

impl ReplayCore {
    pub fn new(
        config: Config,
        surfaces: Arc<dyn SurfaceFactory>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            config,
            surfaces,
            publisher,
            renderer: Arc::new(NoScreenshots),
            hooks: HookSet::default(),
            sessions: SessionCache::new(),
            game_locks: GameLocks::new(),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ScreenshotRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    pub fn store(&self, game_id: u64) -> SnapshotStore {
        SnapshotStore::new(game_id, &self.config.games_dir)
    }

    /// Run one command for the sender described by `ctx`.
    ///
    /// Errors that come from the program, the disk or a corrupt state drop
    /// the sender's live session; any other error leaves it untouched.
    pub async fn handle(
        &self,
        ctx: &CommandContext,
        command: &Command,
    ) -> Result<CommandOutcome, ReplayError> {
        let trace_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "command",
            %trace_id,
            game_id = ctx.game_id,
            user = %ctx.user,
            command = command.name()
        );

        let result = self.dispatch(ctx, command).instrument(span).await;
        if let Err(e) = &result {
            if e.is_infrastructure() {
                tracing::error!(
                    %trace_id,
                    game_id = ctx.game_id,
                    user = %ctx.user,
                    command = command.name(),
                    error = %e,
                    "Command failed"
                );
                self.drop_session(&SessionKey::new(ctx.game_id, &ctx.user))
                    .await;
            } else {
                tracing::info!(%trace_id, error = %e, "Command rejected");
            }
        }
        result
    }

    async fn dispatch(
        &self,
        ctx: &CommandContext,
        command: &Command,
    ) -> Result<CommandOutcome, ReplayError> {
        let store = self.store(ctx.game_id);
        let topic = ctx.current_topic();
        let mut replies = Vec::new();
        let mut initial_setup = false;
        let exists = store.exists();

        // Deleting the game is open to everyone, setup or not
        if let (true, true, Command::Cleanup(token)) = (exists, ctx.is_public(), command) {
            return self.cleanup(ctx, token).await;
        }

        if !exists {
            if *command != Command::Start {
                return Err(ReplayError::NoActiveGame);
            }
            let lock = self.game_locks.lock_for(ctx.game_id);
            let _guard = lock.lock().await;
            store.create(NEW_GAME_BLOB)?;
            initial_setup = true;
            replies.push(format!(
                "{NEW_GAME_BLOB}Only {} will be able to answer the following dialogs.",
                ctx.user
            ));
        } else if let Some(owner) = &topic.log.setup_owner {
            if owner != &ctx.user {
                return Err(ReplayError::SetupInProgress {
                    owner: owner.clone(),
                });
            }
            initial_setup = true;
        }

        if ctx.is_public() && !initial_setup {
            match command {
                Command::Undo(step) => return self.go_back(ctx, step.as_deref()).await,
                Command::Redo => return self.go_back(ctx, Some("0")).await,
                Command::State => {}
                _ => return Err(ReplayError::NotPublic),
            }
        }

        let mut log = topic.log.clone();
        let input = CompileInput {
            dialog: &topic.dialog,
            mentions: &ctx.mentions,
            initial_setup,
            public_game_context: ctx.is_public(),
            user: &ctx.user,
            prefix: &self.config.prefix,
        };
        let compiled = ChoiceCompiler::compile(command, &mut log, &input)?;
        tracing::debug!(plan = ?compiled.plan, entries = log.len(), "Compiled command");
        replies.extend(compiled.notice);

        let outcome = self
            .drive(ctx, command, log, compiled.plan.forces_reload(), initial_setup)
            .await?;
        replies.extend(outcome.replies);
        Ok(CommandOutcome { replies, ..outcome })
    }

    /// Apply the log, answering option-less dialogs, until the player has
    /// a choice to make or the program writes its state.
    async fn drive(
        &self,
        ctx: &CommandContext,
        command: &Command,
        mut log: ChoiceLog,
        mut force: bool,
        initial_setup: bool,
    ) -> Result<CommandOutcome, ReplayError> {
        let store = self.store(ctx.game_id);
        let key = SessionKey::new(ctx.game_id, &ctx.user);
        let slot = self.sessions.slot(&key);
        let mut session = slot.lock().await;

        let starting_blob = {
            let lock = self.game_locks.lock_for(ctx.game_id);
            let _guard = lock.lock().await;
            store.read_current()?
        };

        let reusable = session
            .as_ref()
            .is_some_and(|driver| driver.starting_blob() == starting_blob);
        if !reusable {
            if let Some(mut stale) = session.take() {
                if let Err(e) = stale.close().await {
                    tracing::debug!(error = %e, "Failed to close stale session");
                }
            }
            let surface = self.surfaces.create(ctx.game_id)?;
            let mut driver = SessionDriver::new(surface, self.config.dialog_timeout);
            driver.load(&ctx.user, &starting_blob).await?;
            *session = Some(driver);
            force = false;
        }
        let Some(driver) = session.as_mut() else {
            return Err(DriverError::NotLoaded.into());
        };

        let prefix = self.config.prefix.as_str();
        let always_prompt = matches!(command, Command::Undo(_));
        let mut replies = Vec::new();
        let mut topic = TopicUpdate::Keep;

        for _ in 0..MAX_AUTO_STEPS {
            let outcome = driver.apply(&ctx.user, &log, force).await?;
            force = false;

            let view = match outcome {
                DriverOutcome::Dialog(view) => view,
                DriverOutcome::Terminal(blob) => {
                    let state = self.finish(ctx, &store, blob, initial_setup).await?;
                    if let Some(mut finished) = session.take() {
                        if let Err(e) = finished.close().await {
                            tracing::debug!(error = %e, "Failed to close finished session");
                        }
                    }
                    self.sessions.remove(&key);
                    return Ok(CommandOutcome {
                        replies,
                        topic: self.topic_for(ctx, DialogMeta::default(), ChoiceLog::new(), false),
                        state: Some(state),
                    });
                }
            };

            topic = self.topic_for(ctx, view.meta(), log.clone(), initial_setup);

            if let Some(auto) = self.hooks.select(command.kind(), &view) {
                tracing::debug!(entry = ?auto.entry, "Answering dialog automatically");
                replies.extend(auto.relay);
                log.push(auto.entry);
                continue;
            }

            if *command == Command::State {
                replies.push(state_posted_options(prefix));
                return Ok(CommandOutcome {
                    replies,
                    topic,
                    state: None,
                });
            }

            let mut reply = dialog_message(&view, prefix);
            if view.has_options() || always_prompt {
                let sample = if initial_setup { "input" } else { "number" };
                let mut options = dialog_options(&view, prefix, sample);
                if always_prompt {
                    options.push_str(&format!(", **{prefix}undo**"));
                }
                reply.push_str(&format!("\nOptions: {options}"));
                replies.push(reply);
                return Ok(CommandOutcome {
                    replies,
                    topic,
                    state: None,
                });
            }

            replies.push(reply);
            log.push(ChoiceEntry::Button(1));
        }

        Err(DriverError::StuckDialog(self.config.dialog_timeout.as_millis() as u64).into())
    }

    /// Persist a terminal state and hand it to the collaborators
    async fn finish(
        &self,
        ctx: &CommandContext,
        store: &SnapshotStore,
        blob: String,
        initial_setup: bool,
    ) -> Result<StateUpdate, ReplayError> {
        let lock = self.game_locks.lock_for(ctx.game_id);
        let _guard = lock.lock().await;

        let old_seed = StateCodec::decode(&store.read_current()?)?;
        let mut seed = StateCodec::decode(&blob)?;
        let blob = if seed.normalize_prompt_style() {
            StateCodec::encode(&blob, &seed)?
        } else {
            blob
        };
        let backup = store.persist(&blob, &ctx.user)?;

        let update = StateUpdate {
            game_id: ctx.game_id,
            user: ctx.user.clone(),
            screenshot: self.screenshot(store, &blob).await,
            blob,
            old_seed,
            seed,
            initial_setup,
            backup,
        };
        self.publish(&update).await;
        Ok(update)
    }

    /// Undo/redo in the public context: list backups or restore one
    async fn go_back(
        &self,
        ctx: &CommandContext,
        step: Option<&str>,
    ) -> Result<CommandOutcome, ReplayError> {
        let store = self.store(ctx.game_id);
        let lock = self.game_locks.lock_for(ctx.game_id);
        let _guard = lock.lock().await;
        let prefix = self.config.prefix.as_str();

        let Some(step) = step.and_then(|s| s.trim().parse::<usize>().ok()) else {
            let lines = store.listing()?;
            return Ok(CommandOutcome::reply(format!(
                "Pick a state to undo to with **{prefix}undo <number>**:\n{}",
                lines.join("\n")
            )));
        };

        let old_blob = store.read_current()?;
        let restored = store.select(step, &ctx.user)?;
        let label = if step == 0 {
            "to the latest undone game state".to_string()
        } else {
            format!("{step} game states to")
        };

        let update = StateUpdate {
            game_id: ctx.game_id,
            user: ctx.user.clone(),
            old_seed: StateCodec::decode(&old_blob)?,
            seed: StateCodec::decode(&restored.blob)?,
            screenshot: self.screenshot(&store, &restored.blob).await,
            blob: restored.blob.clone(),
            initial_setup: false,
            backup: Some(restored.undo_backup),
        };
        self.publish(&update).await;

        Ok(CommandOutcome {
            replies: vec![format!(
                "Going back {label}: {}...",
                restored
                    .record
                    .describe(&BackupContents::from_blob(&restored.blob))
            )],
            topic: TopicUpdate::Keep,
            state: Some(update),
        })
    }

    async fn cleanup(
        &self,
        ctx: &CommandContext,
        token: &str,
    ) -> Result<CommandOutcome, ReplayError> {
        let prefix = self.config.prefix.as_str();
        if token != ctx.confirmation_token {
            return Err(ReplayError::Rejected(format!(
                "Please confirm permanent deletion of the BYC game by typing **{prefix}cleanup {}**.",
                ctx.confirmation_token
            )));
        }

        for slot in self.sessions.remove_game(ctx.game_id) {
            close_slot(&slot).await;
        }
        let lock = self.game_locks.lock_for(ctx.game_id);
        let _guard = lock.lock().await;
        let removed = self.store(ctx.game_id).cleanup()?;
        tracing::info!(game_id = ctx.game_id, removed, "Game deleted");

        Ok(CommandOutcome {
            replies: vec!["All items related to the BYC game deleted.".to_string()],
            topic: TopicUpdate::Clear,
            state: None,
        })
    }

    fn topic_for(
        &self,
        ctx: &CommandContext,
        dialog: DialogMeta,
        log: ChoiceLog,
        initial_setup: bool,
    ) -> TopicUpdate {
        if ctx.is_public() && !initial_setup {
            return TopicUpdate::Idle;
        }
        TopicUpdate::Set(ChoiceTopic::new(ctx.game_id, dialog, log))
    }

    async fn screenshot(&self, store: &SnapshotStore, blob: &str) -> Option<std::path::PathBuf> {
        let section = StateCodec::game_state_section(blob)?;
        match self
            .renderer
            .render(&section, &store.screenshot_path("png"))
            .await
        {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(game_id = store.game_id(), error = %e, "Failed to render game state");
                None
            }
        }
    }

    async fn publish(&self, update: &StateUpdate) {
        if let Err(e) = self.publisher.publish_state(update).await {
            tracing::warn!(game_id = update.game_id, error = %e, "Failed to publish game state");
        }
    }

    async fn drop_session(&self, key: &SessionKey) {
        let slot = self.sessions.slot(key);
        self.sessions.remove(key);
        close_slot(&slot).await;
    }
}

async fn close_slot(slot: &SessionSlot) {
    if let Some(mut driver) = slot.lock().await.take() {
        if let Err(e) = driver.close().await {
            tracing::debug!(error = %e, "Failed to close session");
        }
    }
}
