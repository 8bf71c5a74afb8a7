use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::util::paths::{config_path, games_dir, script_path};

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix shown in command hints
    pub prefix: String,
    /// Wait for a dialog to appear or disappear
    pub dialog_timeout: Duration,
    /// Page hosting the game script
    pub script_url: Option<String>,
    /// Where the game script is kept
    pub script_path: PathBuf,
    /// Program that hosts the game script
    pub host_command: String,
    pub host_args: Vec<String>,
    /// Directory holding game states and backups
    pub games_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            dialog_timeout: Duration::from_millis(5000),
            script_url: None,
            script_path: script_path(),
            host_command: "byc-host".to_string(),
            host_args: Vec::new(),
            games_dir: games_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlGeneralConfig {
    pub prefix: Option<String>,
    pub dialog_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlScriptConfig {
    pub url: Option<String>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlHostConfig {
    pub command: Option<String>,
    pub args: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlStorageConfig {
    pub games_dir: Option<PathBuf>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub general: Option<TomlGeneralConfig>,
    pub script: Option<TomlScriptConfig>,
    pub host: Option<TomlHostConfig>,
    pub storage: Option<TomlStorageConfig>,
}

impl Config {
    /// Load configuration from file, merging with defaults
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        let mut config = Config::default();
        if let Ok(contents) = fs::read_to_string(&config_file) {
            match toml::from_str::<TomlConfig>(&contents) {
                Ok(toml_config) => config.merge(toml_config),
                Err(e) => tracing::warn!(
                    path = %config_file.display(),
                    error = %e,
                    "Ignoring unreadable config file"
                ),
            }
        }
        config
    }

    /// Defaults overridden by whatever `contents` sets
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let mut config = Config::default();
        config.merge(toml::from_str(contents)?);
        Ok(config)
    }

    fn merge(&mut self, toml_config: TomlConfig) {
        if let Some(general) = toml_config.general {
            if let Some(prefix) = general.prefix {
                self.prefix = prefix;
            }
            if let Some(ms) = general.dialog_timeout_ms {
                self.dialog_timeout = Duration::from_millis(ms);
            }
        }

        if let Some(script) = toml_config.script {
            if script.url.is_some() {
                self.script_url = script.url;
            }
            if let Some(path) = script.path {
                self.script_path = expand_home(&path);
            }
        }

        if let Some(host) = toml_config.host {
            if let Some(command) = host.command {
                self.host_command = command;
            }
            if let Some(args) = host.args {
                self.host_args = args;
            }
        }

        if let Some(games_dir) = toml_config.storage.and_then(|s| s.games_dir) {
            self.games_dir = expand_home(&games_dir);
        }
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    eprintln!("Failed to create config directory: {}", e);
                    return;
                }
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            eprintln!("Failed to write default config: {}", e);
        }
    }

    pub fn with_games_dir(mut self, dir: PathBuf) -> Self {
        self.games_dir = dir;
        self
    }

    pub fn with_dialog_timeout(mut self, timeout: Duration) -> Self {
        self.dialog_timeout = timeout;
        self
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
