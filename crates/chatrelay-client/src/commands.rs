//! Lexing for the lines a user types at the prompt.
//!
//! This is deliberately a small hand-rolled parser rather than a `clap`
//! sub-parser: these are single in-band lines typed at a running prompt, not
//! process arguments, and `clap` remains reserved for `main`'s CLI surface.

use chatrelay_wire::{NAME_SIZE_LIMIT, TEXT_SIZE_LIMIT};

/// Longest recognized command word (`/name`, `/join`, `/exit` are all 5
/// bytes), mirroring the spec's `COMMAND_SIZE_LIMIT`.
pub const COMMAND_SIZE_LIMIT: usize = 5;

/// One line typed at the prompt, already classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A plain chat line, to be sent as the `text` field of a `CHAT` frame.
    Chat(String),
    /// `/name NAME`.
    SetName(String),
    /// `/join ID`.
    Join(u8),
    /// `/exit`.
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("usage: /name NAME")]
    NameUsage,
    #[error("name must be at most {NAME_SIZE_LIMIT} bytes ({len} given)")]
    NameTooLong { len: usize },
    #[error("usage: /join ROOM_ID (0-255)")]
    JoinUsage,
    #[error("chat text must be at most {TEXT_SIZE_LIMIT} bytes ({len} given)")]
    TextTooLong { len: usize },
}

/// Parses one line from the prompt. An empty line is treated as chat text
/// (the dispatcher accepts zero-length text the same as any other message;
/// it is simply dropped if genuinely empty after trimming by the caller).
pub fn parse(line: &str) -> Result<Input, CommandError> {
    let Some(rest) = line.strip_prefix('/') else {
        // +1 for the wire-mandated trailing NUL; reject rather than
        // truncate so the user knows the line wasn't sent as typed.
        if line.len() + 1 > TEXT_SIZE_LIMIT {
            return Err(CommandError::TextTooLong { len: line.len() });
        }
        return Ok(Input::Chat(line.to_string()));
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let word = parts.next().unwrap_or("");
    let arg = parts.next().unwrap_or("").trim();

    match word {
        "name" => {
            if arg.is_empty() {
                return Err(CommandError::NameUsage);
            }
            // +1 for the wire-mandated trailing NUL.
            if arg.len() + 1 > NAME_SIZE_LIMIT {
                return Err(CommandError::NameTooLong { len: arg.len() });
            }
            Ok(Input::SetName(arg.to_string()))
        }
        "join" => {
            let id: u8 = arg.parse().map_err(|_| CommandError::JoinUsage)?;
            Ok(Input::Join(id))
        }
        "exit" => Ok(Input::Exit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_line_is_chat() {
        assert_eq!(parse("hello there").unwrap(), Input::Chat("hello there".into()));
    }

    #[test]
    fn chat_line_rejects_oversized_text() {
        let long = "x".repeat(TEXT_SIZE_LIMIT);
        assert_eq!(parse(&long), Err(CommandError::TextTooLong { len: long.len() }));
    }

    #[test]
    fn name_command_parses_argument() {
        assert_eq!(parse("/name alice").unwrap(), Input::SetName("alice".into()));
    }

    #[test]
    fn name_command_rejects_oversized_name() {
        let long = "x".repeat(NAME_SIZE_LIMIT);
        assert_eq!(parse(&format!("/name {long}")), Err(CommandError::NameTooLong { len: long.len() }));
    }

    #[test]
    fn join_command_parses_room_id() {
        assert_eq!(parse("/join 3").unwrap(), Input::Join(3));
    }

    #[test]
    fn join_command_rejects_non_numeric() {
        assert_eq!(parse("/join abc"), Err(CommandError::JoinUsage));
    }

    #[test]
    fn exit_command_has_no_argument() {
        assert_eq!(parse("/exit").unwrap(), Input::Exit);
    }

    #[test]
    fn unrecognized_slash_command_is_an_error_and_sends_nothing() {
        assert_eq!(parse("/nonsense"), Err(CommandError::Unknown("nonsense".into())));
    }
}
