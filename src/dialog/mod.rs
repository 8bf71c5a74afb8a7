//! Dialogs shown by the game program
//!
//! This module parses the program's rendered prompt into a [`DialogView`]
//! and formats the replies that present a dialog's options to a player.

pub mod present;
pub mod view;

pub use present::{dialog_message, dialog_options, format_button, state_posted_options};
pub use view::{DialogError, DialogMeta, DialogView, SAVE_AND_QUIT};
