//! Path utilities for the data directory and per-game files

use std::path::PathBuf;
use std::sync::OnceLock;

use crate::util::names::format_username;

/// Global storage for custom data directory path
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Initialize the data directory with an optional custom path.
/// Must be called early in main() before any other path functions are used.
/// If custom_path is None, uses the default ~/.byc location.
pub fn init_data_dir(custom_path: Option<PathBuf>) {
    let path = custom_path.unwrap_or_else(default_data_dir);
    // Ignore error if already set (shouldn't happen in normal usage)
    if DATA_DIR.set(path.clone()).is_err() {
        let existing = DATA_DIR
            .get()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        tracing::debug!(
            path = %path.display(),
            existing = %existing,
            "Data directory already initialized"
        );
    }
}

/// Get the default data directory path (~/.byc)
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".byc"))
        .unwrap_or_else(|| PathBuf::from(".byc"))
}

/// Get the base data directory.
/// Returns the custom path if set via init_data_dir(), otherwise ~/.byc
pub fn data_dir() -> PathBuf {
    DATA_DIR.get().cloned().unwrap_or_else(default_data_dir)
}

/// Get the directory holding game states and backups (~/.byc/game)
pub fn games_dir() -> PathBuf {
    data_dir().join("game")
}

/// Get the logs directory (~/.byc/logs)
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Get the default log file path (~/.byc/logs/byc.log)
pub fn log_file_path() -> PathBuf {
    logs_dir().join("byc.log")
}

/// Get the directory where command-line sessions keep their topics
pub fn topics_dir() -> PathBuf {
    data_dir().join("topics")
}

/// Topic file for one (game, user) pair, standing in for a channel topic
pub fn topic_path(game_id: u64, user: &str) -> PathBuf {
    topics_dir().join(format!("{}-{}.topic", game_id, format_username(user, "_")))
}

/// Topic file of a game's public context
pub fn public_topic_path(game_id: u64) -> PathBuf {
    topics_dir().join(format!("{}.topic", game_id))
}

/// Get the default location of the downloaded game script (~/.byc/byc.js)
pub fn script_path() -> PathBuf {
    data_dir().join("byc.js")
}

/// Get the config file path (~/.byc/config.toml)
pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}
