//! Resume-or-rebuild driving of one user's dialog chain

use std::time::Duration;

use crate::choice::{ChoiceEntry, ChoiceLog};
use crate::dialog::DialogView;
use crate::driver::surface::DialogSurface;
use crate::driver::DriverError;

/// Where the program stopped after the log was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverOutcome {
    /// A dialog waits for the user's next choice
    Dialog(DialogView),
    /// No dialog is showing; the program wrote this game state
    Terminal(String),
}

/// A running program instance pinned to one user and one starting state.
///
/// Entries of the choice log already fed to the program are kept so a
/// resumed session only receives the new suffix, and only while the log
/// still extends them.
pub struct SessionDriver {
    surface: Box<dyn DialogSurface>,
    pinned_user: Option<String>,
    starting_blob: String,
    applied: Vec<ChoiceEntry>,
    current: Option<DialogView>,
    dialog_timeout: Duration,
}

impl SessionDriver {
    pub fn new(surface: Box<dyn DialogSurface>, dialog_timeout: Duration) -> Self {
        Self {
            surface,
            pinned_user: None,
            starting_blob: String::new(),
            applied: Vec::new(),
            current: None,
            dialog_timeout,
        }
    }

    /// The user this session is pinned to, if any
    pub fn pinned_user(&self) -> Option<&str> {
        self.pinned_user.as_deref()
    }

    /// The game state the session was opened from
    pub fn starting_blob(&self) -> &str {
        &self.starting_blob
    }

    /// Number of log entries fed since the last load
    pub fn applied(&self) -> usize {
        self.applied.len()
    }

    /// Open a fresh program instance for `user` from `starting_blob`.
    pub async fn load(&mut self, user: &str, starting_blob: &str) -> Result<(), DriverError> {
        tracing::debug!(user = %user, "Loading game session");
        self.surface.open(user, starting_blob).await?;
        self.pinned_user = Some(user.to_string());
        self.starting_blob = starting_blob.to_string();
        self.applied.clear();
        self.current = match self.surface.wait_dialog(self.dialog_timeout).await? {
            Some(markup) => Some(DialogView::parse(&markup)?),
            None => None,
        };
        Ok(())
    }

    /// Whether the live session can continue for `user` without a reload
    pub async fn try_resume(&mut self, user: &str) -> Result<bool, DriverError> {
        if self.pinned_user.as_deref() != Some(user) || self.current.is_none() {
            return Ok(false);
        }
        let identity = self.surface.identity().await?;
        if identity.as_deref() != Some(user) {
            tracing::info!(
                user = %user,
                identity = ?identity,
                "Program switched context, session needs a reload"
            );
            return Ok(false);
        }
        Ok(true)
    }

    /// Bring the program to the end of `log`.
    ///
    /// With `force`, or when the session cannot be resumed, the program is
    /// reloaded from the pinned starting state and the whole log is fed.
    /// The same happens when `log` does not start with the entries already
    /// applied. Otherwise only the entries not yet applied are fed.
    pub async fn apply(
        &mut self,
        user: &str,
        log: &ChoiceLog,
        force: bool,
    ) -> Result<DriverOutcome, DriverError> {
        let extends = log.entries.starts_with(&self.applied);
        if !extends {
            tracing::debug!(
                user = %user,
                applied = self.applied.len(),
                "Choice log diverged from the live session"
            );
        }
        let resumable = !force && extends && self.try_resume(user).await?;
        if !resumable {
            if self.pinned_user.is_none() {
                return Err(DriverError::NotLoaded);
            }
            let blob = self.starting_blob.clone();
            self.load(user, &blob).await?;
        }

        let pending = log.entries[self.applied.len()..].to_vec();
        tracing::debug!(
            user = %user,
            reloaded = !resumable,
            pending = pending.len(),
            "Applying choices"
        );

        for entry in &pending {
            let Some(view) = self.current.take() else {
                // The chain ended before the log did
                break;
            };
            self.feed(entry, &view).await?;
            self.applied.push(entry.clone());
            self.await_dismissal().await?;
            self.current = match self.surface.wait_dialog(self.dialog_timeout).await? {
                Some(markup) => Some(DialogView::parse(&markup)?),
                None => None,
            };
        }

        match &self.current {
            Some(view) => Ok(DriverOutcome::Dialog(view.clone())),
            None => Ok(DriverOutcome::Terminal(self.surface.read_state().await?)),
        }
    }

    pub async fn close(&mut self) -> Result<(), DriverError> {
        self.current = None;
        self.pinned_user = None;
        self.surface.close().await
    }

    async fn feed(&mut self, entry: &ChoiceEntry, view: &DialogView) -> Result<(), DriverError> {
        match entry {
            ChoiceEntry::Button(ordinal) => self.press_checked(*ordinal, view).await,
            ChoiceEntry::Input(text) if view.has_input => self.surface.enter_text(text).await,
            // Menus without an input field still accept typed numbers
            ChoiceEntry::Input(text) => match text.trim().parse::<usize>() {
                Ok(ordinal) => self.press_checked(ordinal, view).await,
                Err(_) => Err(DriverError::InvalidChoice(text.clone())),
            },
        }
    }

    async fn press_checked(&mut self, ordinal: usize, view: &DialogView) -> Result<(), DriverError> {
        if ordinal == 0 || ordinal > view.buttons.len() {
            return Err(DriverError::InvalidChoice(format!(
                "button {ordinal} of {}",
                view.buttons.len()
            )));
        }
        self.surface.press(ordinal).await
    }

    async fn await_dismissal(&mut self) -> Result<(), DriverError> {
        if self.surface.wait_dismissed(self.dialog_timeout).await? {
            return Ok(());
        }
        if self.surface.script_changed().await? {
            tracing::warn!("Game script changed while a dialog was open, reloading it");
            self.surface.reload_script().await?;
            if self.surface.wait_dismissed(self.dialog_timeout).await? {
                return Ok(());
            }
        }
        Err(DriverError::StuckDialog(
            self.dialog_timeout.as_millis() as u64,
        ))
    }
}
