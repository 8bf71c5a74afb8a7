//! JSON lines spoken with a host process that runs the game program
//!
//! Every request written to the host's stdin is answered by exactly one
//! event line on its stdout.

use serde::{Deserialize, Serialize};

use crate::driver::DriverError;

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostRequest {
    /// Load the program page for `user` with the saved game state
    Open {
        version: u32,
        game_id: u64,
        user: String,
        state: String,
        script: String,
    },
    Identity,
    /// Wait for a visible dialog; answered by `dialog` or `idle`
    WaitDialog { timeout_ms: u64 },
    Press { ordinal: usize },
    Type { text: String },
    /// Wait for the answered dialog to go away; answered by `dismissed` or `dialog`
    WaitDismissed { timeout_ms: u64 },
    State,
    ReloadScript,
    Close,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    Ready,
    Dialog { markup: String },
    Dismissed,
    Idle,
    Identity { user: Option<String> },
    State { blob: String },
    Ack,
    Error { message: String },
}

impl HostRequest {
    pub fn to_line(&self) -> Result<String, DriverError> {
        let mut line =
            serde_json::to_string(self).map_err(|e| DriverError::Protocol(e.to_string()))?;
        line.push('\n');
        Ok(line)
    }
}

impl HostEvent {
    pub fn from_line(line: &str) -> Result<Self, DriverError> {
        serde_json::from_str(line.trim())
            .map_err(|e| DriverError::Protocol(format!("unreadable host event: {e}")))
    }
}
