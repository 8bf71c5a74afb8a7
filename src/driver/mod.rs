//! Driving the external game program through its dialogs

pub mod mock;
pub mod process;
pub mod protocol;
pub mod script;
pub mod session;
pub mod surface;

pub use mock::{MockConfig, ScriptedGame, ScriptedSurface, SurfaceCall};
pub use process::{ProcessSurface, ProcessSurfaceFactory};
pub use script::{extract_script, ScriptSource};
pub use session::{DriverOutcome, SessionDriver};
pub use surface::{DialogSurface, SurfaceFactory};

use crate::dialog::DialogError;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// A dialog stayed on screen after a choice was applied (milliseconds waited)
    #[error("dialog did not disappear within {0}ms")]
    StuckDialog(u64),

    #[error("no game session loaded")]
    NotLoaded,

    #[error("choice does not fit the dialog: {0}")]
    InvalidChoice(String),

    #[error("unreadable dialog: {0}")]
    Dialog(#[from] DialogError),

    #[error("host binary not found: {0}")]
    BinaryNotFound(String),

    #[error("failed to spawn host process")]
    ProcessSpawnFailed,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("host did not answer within {0}ms")]
    Timeout(u64),

    #[error("script error: {0}")]
    Script(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
