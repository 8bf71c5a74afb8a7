//! The replay orchestrator and the types around it.
//!
//! - [`ReplayCore`] runs commands against the game program
//! - [`CommandContext`] and [`CommandOutcome`] describe a command's sender and result
//! - [`Publisher`] and [`ScreenshotRenderer`] are implemented by the surrounding application
//! - [`HookSet`] answers known dialogs automatically

pub mod collab;
pub mod context;
pub mod hooks;
mod replay_core;

pub use collab::{NoScreenshots, Publisher, ScreenshotRenderer};
pub use context::{CommandContext, CommandOutcome, Scope, StateUpdate, TopicUpdate};
pub use hooks::{AutoSelect, AutoSelectHook, HookSet, PrivateHandHook, StateRevealHook};
pub use replay_core::{ReplayCore, NEW_GAME_BLOB};
