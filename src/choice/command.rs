//! Commands a player can send, already split into name and arguments

/// A parsed player command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a game, or restart the chain from the saved state
    Start,
    /// Press the dialog's OK button
    Confirm,
    /// Press the dialog's cancel button
    Cancel,
    /// Pick an option by value, label or ordinal, or type free text
    Choose(String),
    /// Save and quit, making the chain's result public
    Commit,
    /// Post the game state
    State,
    /// Show the player's hand report
    Hand,
    /// Drop choices from the chain, or pick a backup in the public context
    Undo(Option<String>),
    /// Replay the chain, or restore the latest undone state in public
    Redo,
    /// Go back to the start of the chain
    Reset,
    /// Delete everything related to the game; needs a confirmation token
    Cleanup(String),
}

/// Command identity without arguments, used to look up per-command hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Start,
    Confirm,
    Cancel,
    Choose,
    Commit,
    State,
    Hand,
    Undo,
    Redo,
    Reset,
    Cleanup,
}

impl Command {
    /// Parse a command name (aliases included) and its positional arguments
    pub fn parse(name: &str, args: &[String]) -> Option<Self> {
        let first = || args.first().cloned();
        let command = match name.to_lowercase().as_str() {
            "start" | "byc" => Command::Start,
            "confirm" | "ok" => Command::Confirm,
            "cancel" => Command::Cancel,
            "choose" | "choice" => Command::Choose(args.join(" ")),
            "commit" => Command::Commit,
            "state" => Command::State,
            "hand" => Command::Hand,
            "undo" | "step" => Command::Undo(first()),
            "redo" => Command::Redo,
            "reset" => Command::Reset,
            "cleanup" | "channel" => Command::Cleanup(first().unwrap_or_default()),
            _ => return None,
        };
        Some(command)
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Start => CommandKind::Start,
            Command::Confirm => CommandKind::Confirm,
            Command::Cancel => CommandKind::Cancel,
            Command::Choose(_) => CommandKind::Choose,
            Command::Commit => CommandKind::Commit,
            Command::State => CommandKind::State,
            Command::Hand => CommandKind::Hand,
            Command::Undo(_) => CommandKind::Undo,
            Command::Redo => CommandKind::Redo,
            Command::Reset => CommandKind::Reset,
            Command::Cleanup(_) => CommandKind::Cleanup,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Start => "start",
            CommandKind::Confirm => "confirm",
            CommandKind::Cancel => "cancel",
            CommandKind::Choose => "choose",
            CommandKind::Commit => "commit",
            CommandKind::State => "state",
            CommandKind::Hand => "hand",
            CommandKind::Undo => "undo",
            CommandKind::Redo => "redo",
            CommandKind::Reset => "reset",
            CommandKind::Cleanup => "cleanup",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Choose(value) => write!(f, "choose {value}"),
            Command::Undo(Some(step)) => write!(f, "undo {step}"),
            Command::Cleanup(token) if !token.is_empty() => write!(f, "cleanup {token}"),
            other => f.write_str(other.name()),
        }
    }
}
