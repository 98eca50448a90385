//! Parser for `!`-prefixed commands in message text.
//!
//! A pure function over the message string: no platform types, no I/O.

use super::types::Command;

/// The prefix introducing a command.
const PREFIX: char = '!';

/// Parses a message into a command, if it is one.
///
/// # Parsing Rules
///
/// - The message must start with `!` (leading whitespace is tolerated)
/// - The command word is case-insensitive
/// - Anything after the command word is ignored
/// - Returns `None` for ordinary messages and unknown commands
///
/// # Examples
///
/// ```
/// use newsdesk::commands::{Command, parse_command};
///
/// assert_eq!(parse_command("!lastnews"), Some(Command::LastNews));
/// assert_eq!(parse_command("  !LastNews please"), Some(Command::LastNews));
/// assert_eq!(parse_command("!unknown"), None);
/// assert_eq!(parse_command("just chatting"), None);
/// ```
pub fn parse_command(text: &str) -> Option<Command> {
    let rest = text.trim_start().strip_prefix(PREFIX)?;
    let word = rest.split_whitespace().next()?;

    if word.eq_ignore_ascii_case("lastnews") {
        Some(Command::LastNews)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_lastnews() {
        assert_eq!(parse_command("!lastnews"), Some(Command::LastNews));
    }

    #[test]
    fn command_word_is_case_insensitive() {
        assert_eq!(parse_command("!LastNews"), Some(Command::LastNews));
        assert_eq!(parse_command("!LASTNEWS"), Some(Command::LastNews));
    }

    #[test]
    fn tolerates_leading_whitespace_and_trailing_text() {
        assert_eq!(parse_command("   !lastnews"), Some(Command::LastNews));
        assert_eq!(parse_command("!lastnews now please"), Some(Command::LastNews));
    }

    #[test]
    fn rejects_non_commands() {
        assert_eq!(parse_command("lastnews"), None);
        assert_eq!(parse_command("hello !lastnews"), None);
        assert_eq!(parse_command("!lastnewsextra"), None);
        assert_eq!(parse_command("!unknown"), None);
        assert_eq!(parse_command("!"), None);
        assert_eq!(parse_command(""), None);
    }

    proptest! {
        /// The parser never panics, whatever the message contains.
        #[test]
        fn never_panics(text in ".*") {
            let _ = parse_command(&text);
        }

        /// Only the exact command word parses; other `!`-words do not.
        #[test]
        fn unknown_bang_words_are_rejected(word in "[a-zA-Z0-9]{1,20}") {
            prop_assume!(!word.eq_ignore_ascii_case("lastnews"));
            prop_assert_eq!(parse_command(&format!("!{word}")), None);
        }
    }
}
