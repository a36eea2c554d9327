// Library interface for mosscap-cli.
// The binary in main.rs is a thin wrapper so integration tests can reach
// every module through this crate.

pub mod app;
pub mod backend;
pub mod cli;
pub mod commands;
pub mod theme;
pub mod view;

pub use backend::ChatBackend;
pub use cli::Cli;
pub use commands::{handle_command, CommandResult};
pub use theme::Theme;
pub use view::{ChatView, Notice, NoticeKind};
