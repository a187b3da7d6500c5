/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Remove every turn from the conversation, greeting included.
    Clear,
    /// Start a fresh conversation with the greeting.
    NewConversation,
    /// Quit the application.
    Quit,
    /// Switch to another model.
    ModelChanged(String),
    /// Show the model picker list.
    ShowModels,
    /// Ask the server which models are installed.
    DiscoverModels,
    /// Change the theme.
    ThemeChanged(String),
    /// Toggle the sidebar.
    ToggleSidebar,
    /// Show status (model, turns, tokens).
    ShowStatus,
    /// Show the system instruction heading every prompt.
    ShowSystemPrompt,
    /// Write the current settings to the config file.
    SaveSettings,
    /// Not a command - treat as regular input.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let parts: Vec<&str> = input.trim().splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/clear" => CommandResult::Clear,
        "/new" => CommandResult::NewConversation,

        "/model" => {
            if arg.is_empty() {
                CommandResult::ShowModels
            } else {
                CommandResult::ModelChanged(arg.to_string())
            }
        }
        "/models" => CommandResult::DiscoverModels,

        "/theme" => {
            if arg.is_empty() {
                let themes = crate::theme::Theme::all_names().join(", ");
                CommandResult::Message(format!("Available themes: {themes}\nUsage: /theme <theme-name>"))
            } else {
                CommandResult::ThemeChanged(arg.to_string())
            }
        }
        "/sidebar" => CommandResult::ToggleSidebar,
        "/status" => CommandResult::ShowStatus,
        "/system" => CommandResult::ShowSystemPrompt,
        "/save" => CommandResult::SaveSettings,
        "/version" => CommandResult::Message(format!("DeepChat v{}", env!("CARGO_PKG_VERSION"))),

        _ => {
            if input.trim_start().starts_with('/') {
                CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands."))
            } else {
                CommandResult::NotACommand
            }
        }
    }
}

/// Complete a partially typed command name, if exactly one matches.
pub fn complete_command(input: &str) -> Option<String> {
    if !input.starts_with('/') || input.contains(' ') {
        return None;
    }
    let mut matches = COMMANDS.iter().filter(|c| c.starts_with(input));
    let first = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(first.to_string())
}

const COMMANDS: &[&str] = &[
    "/help", "/exit", "/quit", "/clear", "/new", "/model", "/models", "/theme", "/sidebar",
    "/status", "/system", "/save", "/version",
];

fn show_help() -> CommandResult {
    let help_text = "\
╭─ DeepChat Commands ────────────────────────────────────────────╮

  CONVERSATION
    /clear                    Remove every message, greeting included
    /new                      Start a fresh conversation
    /system                   Show the system instruction

  MODEL
    /model                    Show the configured models
    /model <name>             Switch model
    /models                   List models installed on the Ollama server

  DISPLAY
    /theme <name>             Change color theme
    /sidebar                  Toggle the configuration sidebar
    /status                   Show model, message count and token usage

  OTHER
    /save                     Save settings to the config file
    /help, /h                 Show this help message
    /version                  Show version information
    /exit, /quit, /q          Quit the application

╰────────────────────────────────────────────────────────────────╯";

    CommandResult::Message(help_text.into())
}
