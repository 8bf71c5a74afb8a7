//! The structured metadata document embedded in a game state

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key/value game metadata (player names, titles, display hints).
///
/// The top level is always a JSON object; values may nest arbitrarily.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(Map<String, Value>);

impl Seed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn round(&self) -> Option<u64> {
        self.0.get("round").and_then(Value::as_u64)
    }

    /// Turn within the round; absent turns count as the first (0)
    pub fn turn(&self) -> u64 {
        self.0.get("turn").and_then(Value::as_u64).unwrap_or(0)
    }

    pub fn usernames(&self) -> Vec<String> {
        string_list(self.0.get("usernames"))
    }

    pub fn players(&self) -> Vec<String> {
        string_list(self.0.get("players"))
    }

    /// Force every player's prompt style to the plain style (1).
    ///
    /// Returns whether the seed changed.
    pub fn normalize_prompt_style(&mut self) -> bool {
        let Some(styles) = self.0.get("promptStyle").and_then(Value::as_array) else {
            return false;
        };
        if styles.iter().all(|style| style.as_i64() == Some(1)) {
            return false;
        }

        let count = match self.0.get("players").and_then(Value::as_array) {
            Some(players) => players.len(),
            None => styles.len(),
        };
        self.0.insert(
            "promptStyle".to_string(),
            Value::Array(vec![Value::from(1); count]),
        );
        true
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
