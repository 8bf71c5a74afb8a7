//! File-backed game state history

pub mod backup;
pub mod snapshot;

pub use backup::{BackupContents, BackupLabel, BackupRecord, TIMESTAMP_FORMAT};
pub use snapshot::{Restored, SnapshotStore, MAX_LISTED_BACKUPS};

use crate::seed::SeedDecodeError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no game state file")]
    NoActiveGame,

    #[error("no backup available for this step")]
    NoBackupAvailable,

    #[error("malformed seed: {0}")]
    Seed(#[from] SeedDecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
