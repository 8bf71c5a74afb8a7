//! Current game state, backups, and undo/redo built on them

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime, Timelike, Utc};
use tempfile::NamedTempFile;

use crate::seed::StateCodec;
use crate::store::backup::{BackupContents, BackupLabel, BackupRecord};
use crate::store::StoreError;

/// Backups offered for undo
pub const MAX_LISTED_BACKUPS: usize = 10;

/// A backup that became the current state again
#[derive(Debug, Clone)]
pub struct Restored {
    pub record: BackupRecord,
    pub blob: String,
    /// Snapshot of the state that was current before the restore
    pub undo_backup: BackupRecord,
}

/// State file and backups of one game, all inside one directory.
///
/// Callers serialise mutation per game; the store itself takes no locks.
pub struct SnapshotStore {
    game_id: u64,
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(game_id: u64, dir: impl Into<PathBuf>) -> Self {
        Self {
            game_id,
            dir: dir.into(),
        }
    }

    pub fn game_id(&self) -> u64 {
        self.game_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(format!("game-{}.txt", self.game_id))
    }

    /// Whether a game has been started here; an empty state file does not count
    pub fn exists(&self) -> bool {
        fs::metadata(self.state_path()).is_ok_and(|meta| meta.is_file() && meta.len() > 0)
    }

    /// Create the state file with `initial` contents for a new game
    pub fn create(&self, initial: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        self.write_current(initial)?;
        tracing::info!(game_id = self.game_id, "Created game state file");
        Ok(())
    }

    pub fn read_current(&self) -> Result<String, StoreError> {
        match fs::read_to_string(self.state_path()) {
            Ok(blob) if blob.is_empty() => Err(StoreError::NoActiveGame),
            Ok(blob) => Ok(blob),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NoActiveGame),
            Err(e) => Err(e.into()),
        }
    }

    /// Make `blob` the current state.
    ///
    /// Nothing happens when it equals the current state. Otherwise the
    /// current state is backed up first if the new state carries a round,
    /// labelled with that round and turn.
    pub fn persist(&self, blob: &str, user: &str) -> Result<Option<BackupRecord>, StoreError> {
        let current = self.read_current()?;
        if current == blob {
            tracing::debug!(game_id = self.game_id, "Game state unchanged, nothing to persist");
            return Ok(None);
        }

        let seed = StateCodec::decode(blob)?;
        let backup = match seed.round() {
            Some(round) => {
                let label = BackupLabel::Advance {
                    round,
                    turn: seed.turn(),
                };
                Some(self.write_backup(&current, label, user)?)
            }
            None => None,
        };
        self.write_current(blob)?;
        tracing::info!(
            game_id = self.game_id,
            user = %user,
            backup = ?backup.as_ref().map(|b| b.path.display().to_string()),
            "Persisted game state"
        );
        Ok(backup)
    }

    /// Every backup of the game, oldest first
    pub fn backups(&self) -> Result<Vec<BackupRecord>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut backups: Vec<BackupRecord> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| BackupRecord::parse(self.game_id, &entry.path()))
            .collect();
        backups.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(backups)
    }

    /// The last [`MAX_LISTED_BACKUPS`] backups, oldest first
    pub fn recent_backups(&self) -> Result<Vec<BackupRecord>, StoreError> {
        let mut backups = self.backups()?;
        let skip = backups.len().saturating_sub(MAX_LISTED_BACKUPS);
        backups.drain(..skip);
        Ok(backups)
    }

    /// Undo choices, most recent last, with the current state at the end.
    ///
    /// Each backup line starts with the step that restores it and describes
    /// the state held in that backup.
    pub fn listing(&self) -> Result<Vec<String>, StoreError> {
        let backups = self.recent_backups()?;
        let count = backups.len();
        let mut lines = Vec::with_capacity(count + 1);
        for (index, record) in backups.iter().enumerate() {
            let contents = BackupContents::from_blob(&fs::read_to_string(&record.path)?);
            lines.push(format!("{}. {}", count - index, record.describe(&contents)));
        }

        let current = BackupContents::from_blob(&self.read_current()?);
        lines.push(match current.turn_label() {
            Some(turn) => format!("Current game state: {turn} posted by {}", current.poster()),
            None => "Current game state".to_string(),
        });
        Ok(lines)
    }

    /// Go back `step` states.
    ///
    /// Step `k >= 1` restores the k-th most recent backup. Step 0 restores
    /// the most recent backup only when it was taken by an undo, which
    /// makes it a redo. The current state is snapshotted first and the
    /// restored backup file is removed.
    pub fn select(&self, step: usize, user: &str) -> Result<Restored, StoreError> {
        let backups = self.recent_backups()?;
        let count = backups.len();
        let index = match step {
            0 if backups.last().is_some_and(BackupRecord::is_undo) => count - 1,
            k if k >= 1 && k <= count => count - k,
            _ => return Err(StoreError::NoBackupAvailable),
        };
        let record = backups[index].clone();

        let current = self.read_current()?;
        let blob = fs::read_to_string(&record.path)?;
        let undo_backup = self.write_backup(&current, BackupLabel::Undo { depth: step }, user)?;
        self.write_current(&blob)?;
        fs::remove_file(&record.path)?;

        tracing::info!(
            game_id = self.game_id,
            user = %user,
            step,
            restored = %record.path.display(),
            "Restored game state from backup"
        );
        Ok(Restored {
            record,
            blob,
            undo_backup,
        })
    }

    /// Restore the state that the latest undo replaced
    pub fn redo(&self, user: &str) -> Result<Restored, StoreError> {
        self.select(0, user)
    }

    /// Path for a new screenshot of the game state
    pub fn screenshot_path(&self, extension: &str) -> PathBuf {
        let stamp = Utc::now().naive_utc().format("%Y%m%dT%H%M%S%.6f");
        self.dir
            .join(format!("game-state-{}-{stamp}.{extension}", self.game_id))
    }

    /// Delete the state file, backups, screenshots and page files of the
    /// game. Returns how many files went.
    pub fn cleanup(&self) -> Result<usize, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let state_name = format!("game-{}.txt", self.game_id);
        let prefixes = [
            format!("game-{}-", self.game_id),
            format!("game-state-{}-", self.game_id),
            format!("page-{}-", self.game_id),
        ];
        let mut removed = 0;
        for entry in entries.filter_map(|entry| entry.ok()) {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == state_name || prefixes.iter().any(|prefix| name.starts_with(prefix)) {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        tracing::info!(game_id = self.game_id, removed, "Cleaned up game files");
        Ok(removed)
    }

    fn write_backup(
        &self,
        contents: &str,
        label: BackupLabel,
        user: &str,
    ) -> Result<BackupRecord, StoreError> {
        let timestamp = self.next_timestamp()?;
        let path = self
            .dir
            .join(BackupRecord::file_name(self.game_id, label, timestamp, user));
        fs::write(&path, contents)?;
        BackupRecord::parse(self.game_id, &path).ok_or_else(|| {
            StoreError::Io(std::io::Error::other(format!(
                "unreadable backup name {}",
                path.display()
            )))
        })
    }

    /// A timestamp later than every existing backup of the game
    fn next_timestamp(&self) -> Result<NaiveDateTime, StoreError> {
        let now = truncate_to_micros(Utc::now().naive_utc());
        let latest = self.backups()?.last().map(|b| b.timestamp);
        Ok(match latest {
            Some(latest) if latest >= now => latest + Duration::microseconds(1),
            _ => now,
        })
    }

    fn write_current(&self, blob: &str) -> Result<(), StoreError> {
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(blob.as_bytes())?;
        file.persist(self.state_path()).map_err(|e| e.error)?;
        Ok(())
    }
}

fn truncate_to_micros(timestamp: NaiveDateTime) -> NaiveDateTime {
    let nanos = timestamp.nanosecond() / 1_000 * 1_000;
    timestamp.with_nanosecond(nanos).unwrap_or(timestamp)
}
