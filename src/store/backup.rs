//! Backup file naming

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::seed::StateCodec;
use crate::util::format_username;

/// Sortable microsecond timestamp without `-`, so names split cleanly
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.6f";

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What a backup was taken for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupLabel {
    /// Replaced by a state at this round and turn
    Advance { round: u64, turn: u64 },
    /// Taken right before going back `depth` states
    Undo { depth: usize },
}

/// What the game state inside a backup shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupContents {
    /// `None` while the game is still being set up
    pub round: Option<u64>,
    pub turn: u64,
    /// User named by the leading `[q="user"]` quote
    pub posted_by: Option<String>,
}

impl BackupContents {
    /// Read round, turn and poster from a game state.
    ///
    /// A state whose seed cannot be decoded reads like one without a round.
    pub fn from_blob(blob: &str) -> Self {
        let seed = StateCodec::decode(blob).ok();
        Self {
            round: seed.as_ref().and_then(|seed| seed.round()),
            turn: seed.as_ref().map_or(0, |seed| seed.turn()),
            posted_by: posted_by(blob).map(str::to_string),
        }
    }

    /// `Turn 2.1`, or `None` before the first round
    pub fn turn_label(&self) -> Option<String> {
        self.round.map(|round| format!("Turn {round}.{}", self.turn + 1))
    }

    pub fn poster(&self) -> &str {
        self.posted_by.as_deref().unwrap_or("an unknown user")
    }
}

fn posted_by(blob: &str) -> Option<&str> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r#"^\[q="([^"]*)"\]"#).expect("valid regex"));
    pattern
        .captures(blob)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// One backup file of a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub timestamp: NaiveDateTime,
    pub path: PathBuf,
    pub label: BackupLabel,
    /// User name as it appears in the file name
    pub user: String,
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^game-(\d+)-(?:(\d+)-(\d+)|undo-(\d+))-(\d{8}T\d{6}\.\d{6})-(\w*)\.txt$",
        )
        .expect("valid regex")
    })
}

impl BackupRecord {
    /// File name for a backup of `game_id`
    pub fn file_name(
        game_id: u64,
        label: BackupLabel,
        timestamp: NaiveDateTime,
        user: &str,
    ) -> String {
        let stamp = timestamp.format(TIMESTAMP_FORMAT);
        let user = format_username(user, "_");
        match label {
            BackupLabel::Advance { round, turn } => {
                format!("game-{game_id}-{round}-{turn}-{stamp}-{user}.txt")
            }
            BackupLabel::Undo { depth } => {
                format!("game-{game_id}-undo-{depth}-{stamp}-{user}.txt")
            }
        }
    }

    /// Read a backup record from its path; `None` for other files.
    pub fn parse(game_id: u64, path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let caps = name_pattern().captures(name)?;
        if caps.get(1)?.as_str().parse::<u64>().ok()? != game_id {
            return None;
        }

        let label = match (caps.get(2), caps.get(3), caps.get(4)) {
            (Some(round), Some(turn), _) => BackupLabel::Advance {
                round: round.as_str().parse().ok()?,
                turn: turn.as_str().parse().ok()?,
            },
            (_, _, Some(depth)) => BackupLabel::Undo {
                depth: depth.as_str().parse().ok()?,
            },
            _ => return None,
        };
        let timestamp =
            NaiveDateTime::parse_from_str(caps.get(5)?.as_str(), TIMESTAMP_FORMAT).ok()?;

        Some(Self {
            timestamp,
            path: path.to_path_buf(),
            label,
            user: caps.get(6)?.as_str().to_string(),
        })
    }

    pub fn is_undo(&self) -> bool {
        matches!(self.label, BackupLabel::Undo { .. })
    }

    /// Human label for the state this backup restores, given its contents
    pub fn describe(&self, contents: &BackupContents) -> String {
        let date = self.timestamp.format(DISPLAY_FORMAT);
        let user = if self.user.is_empty() {
            "an unknown user"
        } else {
            &self.user
        };
        match self.label {
            BackupLabel::Advance { .. } => match contents.turn_label() {
                Some(turn) => format!("{turn} at {date} posted by {}", contents.poster()),
                None => format!("Game setup replaced at {date} by {user}"),
            },
            BackupLabel::Undo { depth } => format!(
                "Undone game state that went {depth} steps back at {date} triggered by {user}"
            ),
        }
    }
}
