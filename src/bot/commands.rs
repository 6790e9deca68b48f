//! Bot commands and the tags the dispatcher routes on

use teloxide::utils::command::BotCommands;

/// Commands understood by the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(
    rename_rule = "snake_case",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "show what the bot can do.")]
    Start,
    #[command(description = "explain how to use the bot.")]
    Help,
    #[command(description = "list the available subjects.")]
    Subjects,
    #[command(description = "get the study material for a subject.")]
    GetNotes(String),
}

/// Handler selector for an incoming message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandTag {
    Start,
    Help,
    ListSubjects,
    GetNotes,
    FreeText,
}

impl Command {
    pub fn tag(&self) -> CommandTag {
        match self {
            Command::Start => CommandTag::Start,
            Command::Help => CommandTag::Help,
            Command::Subjects => CommandTag::ListSubjects,
            Command::GetNotes(_) => CommandTag::GetNotes,
        }
    }

    /// Text following the command keyword, empty for argument-less commands
    pub fn argument(&self) -> &str {
        match self {
            Command::GetNotes(subject) => subject,
            Command::Start | Command::Help | Command::Subjects => "",
        }
    }
}

/// Plain text is anything that does not look like a command
pub fn is_free_text(text: &str) -> bool {
    !text.starts_with('/')
}
