//! Collaborators that live outside the engine

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::core::context::StateUpdate;

/// Receives every persisted terminal state, e.g. to post it to the game's
/// shared context and sync player roles
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish_state(&self, update: &StateUpdate) -> anyhow::Result<()>;
}

/// Renders the game-state section of a state into an image at `target`
#[async_trait]
pub trait ScreenshotRenderer: Send + Sync {
    async fn render(&self, section: &str, target: &Path) -> anyhow::Result<Option<PathBuf>>;
}

/// Renderer that never produces an image
pub struct NoScreenshots;

#[async_trait]
impl ScreenshotRenderer for NoScreenshots {
    async fn render(&self, _section: &str, _target: &Path) -> anyhow::Result<Option<PathBuf>> {
        Ok(None)
    }
}
