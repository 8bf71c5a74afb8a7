//! Dialogs answered automatically while a command runs

use crate::choice::{ChoiceEntry, CommandKind};
use crate::dialog::DialogView;

/// A choice made on the player's behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoSelect {
    pub entry: ChoiceEntry,
    /// Dialog text passed on to the player before continuing
    pub relay: Option<String>,
}

pub trait AutoSelectHook: Send + Sync {
    fn select(&self, command: CommandKind, view: &DialogView) -> Option<AutoSelect>;
}

fn is_yes_no(view: &DialogView) -> bool {
    view.buttons.len() == 2 && !view.has_input
}

/// Keeps hand reports inside a dialog instead of the shared game state
pub struct PrivateHandHook;

impl AutoSelectHook for PrivateHandHook {
    fn select(&self, _command: CommandKind, view: &DialogView) -> Option<AutoSelect> {
        (is_yes_no(view) && view.buttons[0] == "Dialog").then_some(AutoSelect {
            entry: ChoiceEntry::Button(1),
            relay: None,
        })
    }
}

/// Confirms the spoiler question on the way to posting the game state
pub struct StateRevealHook;

impl AutoSelectHook for StateRevealHook {
    fn select(&self, command: CommandKind, view: &DialogView) -> Option<AutoSelect> {
        let spoiler = is_yes_no(view) && !view.is_main_menu();
        (command == CommandKind::State && spoiler).then(|| AutoSelect {
            entry: ChoiceEntry::Button(2),
            relay: Some(view.message.clone()),
        })
    }
}

/// Hooks consulted in order; the first match wins
pub struct HookSet {
    hooks: Vec<Box<dyn AutoSelectHook>>,
}

impl Default for HookSet {
    fn default() -> Self {
        Self {
            hooks: vec![Box::new(PrivateHandHook), Box::new(StateRevealHook)],
        }
    }
}

impl HookSet {
    pub fn empty() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn with_hook(mut self, hook: Box<dyn AutoSelectHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn select(&self, command: CommandKind, view: &DialogView) -> Option<AutoSelect> {
        self.hooks.iter().find_map(|hook| hook.select(command, view))
    }
}
