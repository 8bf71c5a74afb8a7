//! Choice logs, commands and the compiler that connects them

pub mod command;
pub mod compiler;
pub mod entry;
pub mod topic;

pub use command::{Command, CommandKind};
pub use compiler::{ChoiceCompiler, CompileInput, Compiled, ReplayPlan};
pub use entry::{ChoiceEntry, ChoiceLog, BUTTON_PREFIX};
pub use topic::{ChoiceTopic, IDLE_TOPIC};
