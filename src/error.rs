//! Error taxonomy for command handling

use crate::driver::DriverError;
use crate::seed::SeedDecodeError;
use crate::store::StoreError;

/// Errors that end a command.
///
/// User-facing errors leave the session and choice log untouched.
/// Infrastructure errors (see [`ReplayError::is_infrastructure`]) also
/// drop the cached session so the next command starts from a clean load.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// No state file exists for this game.
    #[error("no active game")]
    NoActiveGame,

    /// The compiled choice matches nothing in the current dialog.
    #[error("unknown option: {0}")]
    UnknownOption(String),

    /// The command is valid but not allowed in the current dialog.
    #[error("{0}")]
    Rejected(String),

    /// The command only works in the player's private context.
    #[error("command is not allowed in the public game context")]
    NotPublic,

    /// Another user owns the dialogs while the game is being set up.
    #[error("game setup is in progress by {owner}")]
    SetupInProgress { owner: String },

    /// The game program never cleared a dialog.
    #[error("dialog did not disappear")]
    StuckDialog,

    /// The stored state has a malformed seed fragment.
    #[error("malformed seed in game state: {0}")]
    SeedDecode(#[from] SeedDecodeError),

    /// Undo/redo requested with nothing eligible.
    #[error("no backup available")]
    NoBackupAvailable,

    /// Transport failure talking to the game program.
    #[error("driver error: {0}")]
    Driver(DriverError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DriverError> for ReplayError {
    fn from(error: DriverError) -> Self {
        match error {
            DriverError::StuckDialog(_) => ReplayError::StuckDialog,
            other => ReplayError::Driver(other),
        }
    }
}

impl From<StoreError> for ReplayError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NoActiveGame => ReplayError::NoActiveGame,
            StoreError::NoBackupAvailable => ReplayError::NoBackupAvailable,
            StoreError::Seed(e) => ReplayError::SeedDecode(e),
            StoreError::Io(e) => ReplayError::Io(e),
        }
    }
}

impl ReplayError {
    /// Whether the error comes from the program, the disk or a corrupt
    /// state rather than from the user's command.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            ReplayError::StuckDialog
                | ReplayError::SeedDecode(_)
                | ReplayError::Driver(_)
                | ReplayError::Io(_)
        )
    }

    /// Short text shown to the user. Infrastructure errors stay opaque.
    pub fn user_message(&self, prefix: &str) -> String {
        match self {
            ReplayError::NoActiveGame => format!(
                "There is no active BYC game in this channel. You can start a new game using **{prefix}byc**."
            ),
            ReplayError::UnknownOption(_) => {
                "Option not known. Correct your command usage.".to_string()
            }
            ReplayError::Rejected(message) => message.clone(),
            ReplayError::NotPublic => {
                "Perform this BYC action in your own, private channel.".to_string()
            }
            ReplayError::SetupInProgress { owner } => format!(
                "The game is currently being set up. Only {owner} is able to interact with the dialogs."
            ),
            ReplayError::NoBackupAvailable => format!(
                "There is no game state to go back to. Use **{prefix}undo** to list the available states."
            ),
            ReplayError::StuckDialog => {
                "The game did not respond in time. Please try again.".to_string()
            }
            ReplayError::SeedDecode(_) | ReplayError::Driver(_) | ReplayError::Io(_) => {
                "Uh oh, something went wrong. Please try again.".to_string()
            }
        }
    }
}
