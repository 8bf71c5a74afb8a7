//! Turning a command plus the visible dialog into log entries

use crate::choice::command::Command;
use crate::choice::entry::{ChoiceEntry, ChoiceLog};
use crate::dialog::DialogMeta;
use crate::error::ReplayError;

/// How the session must be brought to the end of the log.
///
/// Decided once per command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPlan {
    /// Feed only the new entries to the live session
    Resume,
    /// Rebuild the session from the saved state and the whole log
    Reload,
    /// Rebuild after dropping entries from the end of the log
    ReloadTruncated { dropped: usize },
}

impl ReplayPlan {
    pub fn forces_reload(&self) -> bool {
        !matches!(self, ReplayPlan::Resume)
    }
}

/// What the compiler needs to know about the command's surroundings
#[derive(Debug, Clone, Copy)]
pub struct CompileInput<'a> {
    /// Dialog the log currently stops at
    pub dialog: &'a DialogMeta,
    /// Canonical names of entities mentioned in the command
    pub mentions: &'a [String],
    /// The game is being set up by the acting user
    pub initial_setup: bool,
    /// The command was sent in the game's public context
    pub public_game_context: bool,
    pub user: &'a str,
    /// Command prefix used in hints, e.g. `!`
    pub prefix: &'a str,
}

/// Result of a successful compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    pub plan: ReplayPlan,
    /// Message to relay before the chain runs
    pub notice: Option<String>,
}

impl Compiled {
    fn plan(plan: ReplayPlan) -> Self {
        Self { plan, notice: None }
    }

    fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}

/// Free-text answer that opens the hand report from the main menu
const MAIN_MENU_HAND: &str = "1";
/// Free-text answer that opens the game state display from the main menu
const MAIN_MENU_STATE: &str = "2";

pub struct ChoiceCompiler;

impl ChoiceCompiler {
    /// Append the entry that selects `value` in the current dialog.
    ///
    /// The log is untouched when the value matches nothing. Blank text is
    /// never an answer, as topics cannot carry empty entries.
    pub fn add_choice(
        log: &mut ChoiceLog,
        input: &CompileInput<'_>,
        value: &str,
    ) -> Result<(), ReplayError> {
        let dialog = input.dialog;
        if let Some(&ordinal) = dialog.option_index.get(value) {
            log.push(ChoiceEntry::Button(ordinal));
        } else if dialog.has_input {
            match input.mentions {
                [mention] if input.initial_setup => log.push(ChoiceEntry::Input(mention.clone())),
                _ if value.trim().is_empty() => {
                    return Err(ReplayError::UnknownOption(value.to_string()))
                }
                _ => log.push(ChoiceEntry::Input(value.to_string())),
            }
        } else {
            match value.parse::<usize>() {
                Ok(ordinal) if (1..=dialog.button_count).contains(&ordinal) => {
                    log.push(ChoiceEntry::Button(ordinal))
                }
                _ => return Err(ReplayError::UnknownOption(value.to_string())),
            }
        }
        Ok(())
    }

    /// Apply `command` to the log and decide how to replay it.
    pub fn compile(
        command: &Command,
        log: &mut ChoiceLog,
        input: &CompileInput<'_>,
    ) -> Result<Compiled, ReplayError> {
        let prefix = input.prefix;
        match command {
            Command::Start => {
                *log = if input.initial_setup {
                    ChoiceLog::for_setup(input.user)
                } else {
                    ChoiceLog::new()
                };
                Ok(Compiled::plan(ReplayPlan::Reload))
            }
            Command::Confirm => {
                Self::add_choice(log, input, "ok")?;
                Ok(Compiled::plan(ReplayPlan::Resume))
            }
            Command::Cancel => {
                if input.dialog.is_main_menu() {
                    return Err(ReplayError::Rejected(format!(
                        "Canceling would make your actions public. If this is what you want here, then use **{prefix}commit**."
                    )));
                }
                Self::add_choice(log, input, "cancel")?;
                Ok(Compiled::plan(ReplayPlan::Resume))
            }
            Command::Choose(value) => {
                Self::add_choice(log, input, value)?;
                Ok(Compiled::plan(ReplayPlan::Resume))
            }
            Command::Commit => {
                Self::add_choice(log, input, "cancel")?;
                Ok(Compiled::plan(ReplayPlan::Resume))
            }
            Command::State => {
                if input.public_game_context && !input.initial_setup {
                    log.entries = vec![
                        ChoiceEntry::Input(MAIN_MENU_STATE.to_string()),
                        ChoiceEntry::Button(2),
                        ChoiceEntry::Button(1),
                    ];
                    return Ok(Compiled::plan(ReplayPlan::Reload));
                }
                Self::require_main_menu(log, input, "Showing game state")?;
                log.push(ChoiceEntry::Input(MAIN_MENU_STATE.to_string()));
                Ok(Compiled::plan(ReplayPlan::Resume))
            }
            Command::Hand => {
                Self::require_main_menu(log, input, "Showing hand report")?;
                log.push(ChoiceEntry::Input(MAIN_MENU_HAND.to_string()));
                Ok(Compiled::plan(ReplayPlan::Resume))
            }
            Command::Undo(step) => {
                let count = step
                    .as_deref()
                    .and_then(|s| s.trim().parse::<usize>().ok())
                    .unwrap_or(1);
                let dropped = log.truncate_last(count);
                Ok(
                    Compiled::plan(ReplayPlan::ReloadTruncated { dropped })
                        .with_notice(format!("Undoing last {count} choice(s)...")),
                )
            }
            Command::Redo => {
                Ok(Compiled::plan(ReplayPlan::Reload).with_notice("Redoing choices..."))
            }
            Command::Reset => {
                log.clear();
                Ok(Compiled::plan(ReplayPlan::Reload).with_notice(format!(
                    "Reverting to the state when you last used **{prefix}byc**..."
                )))
            }
            Command::Cleanup(_) => Err(ReplayError::Rejected(format!(
                "Please use the command **{prefix}cleanup** from within the public BYC game channel."
            ))),
        }
    }

    fn require_main_menu(
        log: &ChoiceLog,
        input: &CompileInput<'_>,
        action: &str,
    ) -> Result<(), ReplayError> {
        if !log.is_empty() && !input.dialog.is_main_menu() {
            return Err(ReplayError::Rejected(format!(
                "{action} is only possible when you are in the main dialog."
            )));
        }
        Ok(())
    }
}
