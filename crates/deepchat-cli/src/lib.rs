// Library interface for deepchat-cli, shared by the binary and the
// integration tests.

pub mod app;
pub mod commands;
pub mod markdown;
pub mod theme;

pub use commands::{handle_command, CommandResult};
pub use theme::Theme;
