/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Show model, session and transcript stats.
    ShowStatus,
    /// Show the model this session talks to.
    ShowModel,
    /// Change the theme.
    ThemeChanged(String),
    /// Not a command - treat as chat input.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim_start();
    if !input.starts_with('/') {
        return CommandResult::NotACommand;
    }

    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/status" => CommandResult::ShowStatus,
        "/model" => CommandResult::ShowModel,
        "/theme" => {
            if arg.is_empty() {
                let themes = crate::theme::Theme::all_names().join(", ");
                CommandResult::Message(format!("Available themes: {themes}\nUsage: /theme <theme-name>"))
            } else if crate::theme::Theme::by_name(arg).is_some() {
                CommandResult::ThemeChanged(arg.to_string())
            } else {
                CommandResult::Message(format!("Unknown theme '{arg}'. Try /theme for a list."))
            }
        }
        _ => CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands.")),
    }
}

fn show_help() -> CommandResult {
    CommandResult::Message(
        "Mosscap Commands\n\
         \n\
         /help, /h         Show this help\n\
         /status           Model, session, turns and context size\n\
         /model            Show the model in use\n\
         /theme <name>     Switch color theme\n\
         /quit, /exit, /q  Leave\n\
         \n\
         Keys: Enter send | Up/Down input history | PgUp/PgDn scroll | Esc clear input | Ctrl+C quit"
            .into(),
    )
}
