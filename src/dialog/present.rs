//! Reply text for dialogs shown to the player

use crate::dialog::view::{DialogView, SAVE_AND_QUIT};

/// Command names for the first two buttons of a dialog, in order
const BUTTON_COMMANDS: [&str; 2] = ["cancel", "ok"];

/// Format one button as a command hint, e.g. `**!ok**` or `**!cancel**: Pass`
pub fn format_button(prefix: &str, command: &str, text: &str) -> String {
    if text == SAVE_AND_QUIT {
        return format!("**{prefix}commit**: {text}");
    }

    if text.to_lowercase() == command {
        return format!("**{prefix}{command}**");
    }

    format!("**{prefix}{command}**: {text}")
}

/// The comma-separated list of commands that answer this dialog.
///
/// `input_sample` names the placeholder for free-text answers (`input`
/// during game setup, `number` otherwise).
pub fn dialog_options(view: &DialogView, prefix: &str, input_sample: &str) -> String {
    let mut options: Vec<String> = Vec::new();
    for (index, text) in view.buttons.iter().enumerate() {
        match BUTTON_COMMANDS.get(index) {
            // The OK button of an input dialog is reached through `choose`
            Some(&"ok") if view.has_input => {}
            Some(command) => options.push(format_button(prefix, command, text)),
            None => options.push(format!("**{prefix}choose {}**: {text}", index + 1)),
        }
    }

    if view.has_input {
        options.push(format!("**{prefix}choose** <{input_sample}>"));
    }

    options.join(", ")
}

/// Message text of a dialog, with main-menu entries pointing at the
/// commands that reach them.
pub fn dialog_message(view: &DialogView, prefix: &str) -> String {
    if !view.is_main_menu() {
        return view.message.clone();
    }

    view.message
        .replace(
            "Print Hand Report",
            &format!("Show Hand Report (**{prefix}hand**)"),
        )
        .replace(
            "Display Game State",
            &format!("Post Game State (**{prefix}state**)"),
        )
}

/// Options offered after `state` has posted the game state from the main menu
pub fn state_posted_options(prefix: &str) -> String {
    format!("Options: **{prefix}commit**: Save and Quit, **{prefix}undo 2**, **{prefix}reset**")
}
