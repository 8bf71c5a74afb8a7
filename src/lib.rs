pub mod choice;
pub mod config;
pub mod core;
pub mod dialog;
pub mod driver;
pub mod error;
pub mod seed;
pub mod session;
pub mod store;
pub mod util;

pub use choice::{ChoiceCompiler, ChoiceEntry, ChoiceLog, ChoiceTopic, Command};
pub use config::Config;
pub use crate::core::{CommandContext, CommandOutcome, Publisher, ReplayCore, Scope, TopicUpdate};
pub use dialog::{DialogMeta, DialogView};
pub use driver::{DialogSurface, DriverError, SessionDriver, SurfaceFactory};
pub use error::ReplayError;
pub use seed::{Seed, StateCodec};
pub use store::{BackupRecord, SnapshotStore};
