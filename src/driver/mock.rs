//! Scripted in-memory game for deterministic testing
//!
//! Implements [`DialogSurface`] over a small, fixed dialog graph that
//! behaves like the real program: a fresh game asks how to set up the
//! players, a running game shows the main menu, and saving writes a game
//! state with an embedded seed. Every call is captured for assertions.
//!
//! # Example
//! ```no_run
//! use byc::driver::{ScriptedGame, SessionDriver, SurfaceFactory};
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), byc::driver::DriverError> {
//! let game = ScriptedGame::new();
//! let mut driver = SessionDriver::new(game.create(1)?, Duration::from_millis(100));
//! driver.load("adama", &game.started_blob(&["adama", "roslin"])).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::driver::surface::{DialogSurface, SurfaceFactory};
use crate::driver::DriverError;
use crate::seed::{Seed, StateCodec};

/// One interaction with a scripted surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Open { user: String },
    Press(usize),
    EnterText(String),
    ReadState,
    ReloadScript,
    Close,
}

/// Configuration for scripted game behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Answered dialogs after which dialogs stop disappearing
    pub stuck_after: Option<usize>,
    /// Whether the script reports a hot update, which unsticks the dialog
    pub script_update: bool,
    /// Whether open() should fail
    pub fail_on_open: bool,
}

impl MockConfig {
    pub fn stuck_after(mut self, answers: usize) -> Self {
        self.stuck_after = Some(answers);
        self
    }

    pub fn with_script_update(mut self) -> Self {
        self.script_update = true;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_on_open = true;
        self
    }
}

/// Factory for scripted surfaces sharing one call log
#[derive(Clone)]
pub struct ScriptedGame {
    config: MockConfig,
    players: usize,
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
    identity_override: Arc<Mutex<Option<String>>>,
}

impl Default for ScriptedGame {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGame {
    pub fn new() -> Self {
        Self {
            config: MockConfig::default(),
            players: 3,
            calls: Arc::new(Mutex::new(Vec::new())),
            identity_override: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_config(mut self, config: MockConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of player names asked for during custom setup
    pub fn with_players(mut self, players: usize) -> Self {
        self.players = players.max(1);
        self
    }

    /// Captured calls of every surface created by this game
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    /// Make every surface report this user as its identity
    pub fn set_identity_override(&self, user: Option<String>) {
        *self.identity_override.lock() = user;
    }

    /// A saved game at round 1, turn 0 with these players, as the program
    /// would write it after setup
    pub fn started_blob(&self, players: &[&str]) -> String {
        let names: Vec<String> = players.iter().map(|p| p.to_string()).collect();
        let mut seed = new_game_seed(&names);
        seed.insert("promptStyle", json!(vec![1; names.len()]));
        render_state(players.first().copied().unwrap_or_default(), &seed)
    }
}

impl SurfaceFactory for ScriptedGame {
    fn create(&self, _game_id: u64) -> Result<Box<dyn DialogSurface>, DriverError> {
        Ok(Box::new(ScriptedSurface {
            config: self.config.clone(),
            players: self.players,
            calls: Arc::clone(&self.calls),
            identity_override: Arc::clone(&self.identity_override),
            user: None,
            seed: Seed::new(),
            node: None,
            output: None,
            dismissed: true,
            answered: 0,
            deferred: None,
            script_reloaded: false,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    NewGame,
    Setup { names: Vec<String> },
    SetupConfirm { names: Vec<String> },
    Main,
    HandPrivacy,
    Hand,
    StateSpoiler,
    StateShow,
    EndTurn,
}

#[derive(Debug, Clone)]
enum Answer {
    Button(usize),
    Text(String),
}

/// One scripted program instance
pub struct ScriptedSurface {
    config: MockConfig,
    players: usize,
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
    identity_override: Arc<Mutex<Option<String>>>,
    user: Option<String>,
    seed: Seed,
    /// Visible dialog; `None` once the program wrote its state
    node: Option<Node>,
    output: Option<String>,
    dismissed: bool,
    answered: usize,
    deferred: Option<Answer>,
    script_reloaded: bool,
}

impl ScriptedSurface {
    fn record(&self, call: SurfaceCall) {
        self.calls.lock().push(call);
    }

    fn answer(&mut self, answer: Answer) {
        let stuck = self
            .config
            .stuck_after
            .is_some_and(|limit| self.answered >= limit)
            && !self.script_reloaded;
        self.answered += 1;
        if stuck {
            self.dismissed = false;
            self.deferred = Some(answer);
            return;
        }
        self.dismissed = true;
        self.transition(answer);
    }

    fn transition(&mut self, answer: Answer) {
        let Some(node) = self.node.take() else {
            return;
        };
        let user = self.user.clone().unwrap_or_default();
        self.node = match (node, answer) {
            (Node::NewGame, Answer::Button(1)) => {
                let names: Vec<String> = std::iter::once(user.clone())
                    .chain((2..=self.players).map(|n| format!("Player {n}")))
                    .collect();
                return self.finish_setup(&names);
            }
            (Node::NewGame, _) => Some(Node::Setup { names: Vec::new() }),
            (Node::Setup { mut names }, Answer::Text(name)) if !name.trim().is_empty() => {
                names.push(name.trim().to_string());
                if names.len() == self.players {
                    Some(Node::SetupConfirm { names })
                } else {
                    Some(Node::Setup { names })
                }
            }
            (node @ Node::Setup { .. }, _) => Some(node),
            (Node::SetupConfirm { names }, Answer::Button(2)) => {
                return self.finish_setup(&names);
            }
            (Node::SetupConfirm { .. }, _) => Some(Node::Setup { names: Vec::new() }),
            (Node::Main, Answer::Button(1)) => {
                self.write_state();
                None
            }
            (Node::Main, Answer::Text(text)) => match text.trim() {
                "1" => Some(Node::HandPrivacy),
                "2" => Some(Node::StateSpoiler),
                "3" => Some(Node::EndTurn),
                _ => Some(Node::Main),
            },
            (Node::Main, _) => Some(Node::Main),
            (Node::HandPrivacy, Answer::Button(1)) => Some(Node::Hand),
            (Node::HandPrivacy, _) => Some(Node::Main),
            (Node::Hand, _) => Some(Node::Main),
            (Node::StateSpoiler, Answer::Button(2)) => Some(Node::StateShow),
            (Node::StateSpoiler, _) => Some(Node::Main),
            (Node::StateShow, Answer::Button(1)) => {
                self.write_state();
                None
            }
            (Node::StateShow, _) => Some(Node::Main),
            (Node::EndTurn, Answer::Button(2)) => {
                self.advance_turn();
                self.write_state();
                None
            }
            (Node::EndTurn, _) => Some(Node::Main),
        };
    }

    fn finish_setup(&mut self, names: &[String]) {
        self.seed = new_game_seed(names);
        self.write_state();
        self.node = None;
    }

    fn advance_turn(&mut self) {
        let players = self.seed.players().len().max(1) as u64;
        let round = self.seed.round().unwrap_or(1);
        let turn = self.seed.turn() + 1;
        let (round, turn) = if turn >= players {
            (round + 1, 0)
        } else {
            (round, turn)
        };
        self.seed.insert("round", Value::from(round));
        self.seed.insert("turn", Value::from(turn));
    }

    fn write_state(&mut self) {
        let user = self.user.clone().unwrap_or_default();
        self.output = Some(render_state(&user, &self.seed));
    }

    fn render(&self, node: &Node) -> String {
        match node {
            Node::NewGame => render_dialog(
                "Welcome to By Your Command.<br>How do you want to set up the players?",
                &[("start", "Quick start"), ("cancel", "Enter players")],
                false,
            ),
            Node::Setup { names } => render_dialog(
                &format!(
                    "Enter the name of player {} of {}:",
                    names.len() + 1,
                    self.players
                ),
                &[("ok", "OK")],
                true,
            ),
            Node::SetupConfirm { names } => render_dialog(
                &format!("Players: {}<br>Start the game?", names.join(", ")),
                &[("cancel", "Back"), ("ok", "Start")],
                false,
            ),
            Node::Main => render_dialog(
                "Choose an action:<br>1. Print Hand Report<br>2. Display Game State<br>3. End Turn",
                &[("cancel", "Save and Quit"), ("ok", "OK")],
                true,
            ),
            Node::HandPrivacy => render_dialog(
                "Where should the hand report appear?",
                &[("cancel", "Dialog"), ("ok", "Game State")],
                false,
            ),
            Node::Hand => render_dialog(
                "Your hand: Politics 2, Leadership 3, Tactics 1",
                &[("ok", "OK")],
                false,
            ),
            Node::StateSpoiler => render_dialog(
                "The game state may reveal hidden information. Show it anyway?",
                &[("cancel", "No"), ("ok", "Yes")],
                false,
            ),
            Node::StateShow => render_dialog(
                &format!(
                    "Round {}, turn {} is on the table.",
                    self.seed.round().unwrap_or(0),
                    self.seed.turn() + 1
                ),
                &[("cancel", "Save and Quit"), ("ok", "Back")],
                false,
            ),
            Node::EndTurn => render_dialog(
                "End your turn?",
                &[("cancel", "No"), ("ok", "Yes")],
                false,
            ),
        }
    }
}

#[async_trait]
impl DialogSurface for ScriptedSurface {
    async fn open(&mut self, user: &str, blob: &str) -> Result<(), DriverError> {
        self.record(SurfaceCall::Open {
            user: user.to_string(),
        });
        if self.config.fail_on_open {
            return Err(DriverError::ProcessSpawnFailed);
        }

        self.seed = StateCodec::decode(blob).map_err(|e| DriverError::Protocol(e.to_string()))?;
        self.node = Some(if self.seed.round().is_some() {
            Node::Main
        } else {
            Node::NewGame
        });
        self.user = Some(user.to_string());
        self.output = None;
        self.dismissed = true;
        self.answered = 0;
        self.deferred = None;
        self.script_reloaded = false;
        Ok(())
    }

    async fn identity(&mut self) -> Result<Option<String>, DriverError> {
        Ok(self
            .identity_override
            .lock()
            .clone()
            .or_else(|| self.user.clone()))
    }

    async fn wait_dialog(&mut self, _timeout: Duration) -> Result<Option<String>, DriverError> {
        Ok(self.node.as_ref().map(|node| self.render(node)))
    }

    async fn press(&mut self, ordinal: usize) -> Result<(), DriverError> {
        self.record(SurfaceCall::Press(ordinal));
        self.answer(Answer::Button(ordinal));
        Ok(())
    }

    async fn enter_text(&mut self, text: &str) -> Result<(), DriverError> {
        self.record(SurfaceCall::EnterText(text.to_string()));
        self.answer(Answer::Text(text.to_string()));
        Ok(())
    }

    async fn wait_dismissed(&mut self, _timeout: Duration) -> Result<bool, DriverError> {
        Ok(self.dismissed)
    }

    async fn read_state(&mut self) -> Result<String, DriverError> {
        self.record(SurfaceCall::ReadState);
        self.output
            .clone()
            .ok_or_else(|| DriverError::Protocol("game state not written yet".to_string()))
    }

    async fn script_changed(&mut self) -> Result<bool, DriverError> {
        Ok(self.config.script_update && !self.script_reloaded)
    }

    async fn reload_script(&mut self) -> Result<(), DriverError> {
        self.record(SurfaceCall::ReloadScript);
        self.script_reloaded = true;
        if let Some(answer) = self.deferred.take() {
            self.dismissed = true;
            self.transition(answer);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.record(SurfaceCall::Close);
        self.node = None;
        Ok(())
    }
}

fn new_game_seed(names: &[String]) -> Seed {
    let mut seed = Seed::new();
    seed.insert("round", Value::from(1));
    seed.insert("turn", Value::from(0));
    seed.insert("usernames", json!(names));
    seed.insert("players", json!(names));
    seed.insert("promptStyle", json!(vec![0; names.len()]));
    seed
}

fn render_state(user: &str, seed: &Seed) -> String {
    let players = seed.players();
    let turn = seed.turn() as usize;
    let current = players.get(turn).map(String::as_str).unwrap_or("nobody");
    let text = format!(
        "[q=\"{user}\"]\nRound {}, turn {}: {current} to act.\n\nFleet: 8 ships, Fuel 8, Food 8, Morale 10, Population 12\n",
        seed.round().unwrap_or(0),
        turn + 1,
    );
    // A fresh seed never fails to encode into a blob without a fragment
    StateCodec::encode(&text, seed).unwrap_or(text)
}

fn render_dialog(message: &str, buttons: &[(&str, &str)], has_input: bool) -> String {
    let mut markup = format!("<div class=\"dialog\"><div class=\"msg\">{message}</div>");
    if has_input {
        markup.push_str("<input type=\"text\">");
    }
    for (value, text) in buttons {
        markup.push_str(&format!("<button class=\"{value}\">{text}</button>"));
    }
    markup.push_str("</div>");
    markup
}
