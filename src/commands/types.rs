//! Command types for the `!`-prefixed chat commands.

use serde::{Deserialize, Serialize};

/// A parsed chat command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// `!lastnews` — fetch the single latest item and post a preview with
    /// action markers into the invoking channel.
    LastNews,
}
