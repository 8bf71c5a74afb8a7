//! Session management module
//!
//! Keeps game program sessions alive between commands so a chain can be
//! resumed instead of replayed from the saved state.

pub mod cache;

pub use cache::{GameLocks, SessionCache, SessionKey, SessionSlot};
