//! Command parsing for the bot's chat commands.
//!
//! Moderators interact with the bot through `!`-prefixed messages in any
//! channel the bot can read. Parsing is pure; executing a command is the
//! gateway's job.

mod parser;
mod types;

pub use parser::parse_command;
pub use types::Command;
