use std::time::Duration;

use async_trait::async_trait;

use crate::driver::DriverError;

/// A live connection to one instance of the game program.
///
/// Implementations render dialogs as markup that
/// [`DialogView::parse`](crate::dialog::DialogView::parse) understands and
/// report the terminal game state as the program's text output.
#[async_trait]
pub trait DialogSurface: Send {
    /// Start the program for `user` from the saved game state
    async fn open(&mut self, user: &str, blob: &str) -> Result<(), DriverError>;

    /// The user the running program believes it is serving
    async fn identity(&mut self) -> Result<Option<String>, DriverError>;

    /// Markup of the next visible dialog, or `None` when none shows up
    async fn wait_dialog(&mut self, timeout: Duration) -> Result<Option<String>, DriverError>;

    /// Press the button with this 1-based ordinal
    async fn press(&mut self, ordinal: usize) -> Result<(), DriverError>;

    /// Type into the input field and submit with the OK button
    async fn enter_text(&mut self, text: &str) -> Result<(), DriverError>;

    /// Whether the dialog that was answered went away in time
    async fn wait_dismissed(&mut self, timeout: Duration) -> Result<bool, DriverError>;

    /// The game state the program wrote out after its last dialog
    async fn read_state(&mut self) -> Result<String, DriverError>;

    /// Whether the program script changed since it was loaded
    async fn script_changed(&mut self) -> Result<bool, DriverError>;

    async fn reload_script(&mut self) -> Result<(), DriverError>;

    async fn close(&mut self) -> Result<(), DriverError>;
}

/// Creates surfaces for a game
pub trait SurfaceFactory: Send + Sync {
    fn create(&self, game_id: u64) -> Result<Box<dyn DialogSurface>, DriverError>;
}
