//! Live sessions per player and per-game critical sections
//!
//! The map locks are held only long enough to fetch a slot. Commands for
//! the same key then queue on the slot's async mutex.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::driver::SessionDriver;

/// Identifies one player's chain in one game
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub game_id: u64,
    pub user: String,
}

impl SessionKey {
    pub fn new(game_id: u64, user: impl Into<String>) -> Self {
        Self {
            game_id,
            user: user.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.game_id, self.user)
    }
}

/// The driver kept alive between commands, if any
pub type SessionSlot = Arc<AsyncMutex<Option<SessionDriver>>>;

/// Live sessions keyed by game and player
#[derive(Default)]
pub struct SessionCache {
    slots: Mutex<HashMap<SessionKey, SessionSlot>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `key`, created empty on first use
    pub fn slot(&self, key: &SessionKey) -> SessionSlot {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Forget the slot for `key`; a holder of the slot keeps its copy
    pub fn remove(&self, key: &SessionKey) {
        self.slots.lock().remove(key);
    }

    /// Forget every slot of a game, returning them so drivers can be closed
    pub fn remove_game(&self, game_id: u64) -> Vec<SessionSlot> {
        let mut slots = self.slots.lock();
        let keys: Vec<SessionKey> = slots
            .keys()
            .filter(|key| key.game_id == game_id)
            .cloned()
            .collect();
        keys.iter().filter_map(|key| slots.remove(key)).collect()
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.slots.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

/// One async lock per game, guarding its state file and backups
#[derive(Default)]
pub struct GameLocks {
    locks: Mutex<HashMap<u64, Arc<AsyncMutex<()>>>>,
}

impl GameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, game_id: u64) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(game_id).or_default())
    }
}
