//! Wire protocol definitions
//!
//! Line-oriented text protocol: chat message formatting, server notice
//! lines, and in-band command parsing. Every logical unit on the wire
//! is one newline-terminated line; the exact formats here are load
//! bearing for client compatibility.

use chrono::{DateTime, Local};

use crate::error::ChatError;

/// Greeting banner sent on connect, before the name prompt
pub const GREETING: &str = "Welcome to TCP-Chat!";

/// Name prompt sent right after the greeting
pub const NAME_PROMPT: &str = "[ENTER YOUR NAME]:";

/// Sent to a connection rejected at accept time, before closing
pub const SERVER_FULL: &str = "Server is full. Try again later.";

/// Handshake reject: the requested username is already live
pub const NAME_TAKEN: &str = "Username already taken. Disconnecting...";

/// Handshake reject: the requested username is empty after trimming
pub const INVALID_NAME: &str = "Invalid username. Disconnecting...";

/// Inline rename error; the session stays open
pub const NAME_TAKEN_INLINE: &str = "Username already taken.";

/// Inline rename error for an empty or missing new name
pub const INVALID_NAME_INLINE: &str = "Invalid username.";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One chat message, immutable once created
///
/// Appended to the history log at send time and never mutated, so the
/// log's insertion order is the causal send order.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Send time, captured when the server read the line
    pub timestamp: DateTime<Local>,
    /// Username the sender held at send time
    pub author: String,
    /// Message body, already trimmed
    pub content: String,
}

impl ChatMessage {
    /// Create a message stamped with the current local time
    pub fn new(author: &str, content: &str) -> Self {
        Self {
            timestamp: Local::now(),
            author: author.to_string(),
            content: content.to_string(),
        }
    }

    /// Render the wire line: `[YYYY-MM-DD HH:MM:SS][author]: content`
    pub fn format(&self) -> String {
        format!(
            "[{}][{}]: {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.author,
            self.content
        )
    }
}

/// Notice broadcast when a session joins
pub fn join_notice(username: &str) -> String {
    format!("[INFO]: {username} joined the chat")
}

/// Notice broadcast when a session leaves
pub fn leave_notice(username: &str) -> String {
    format!("[INFO]: {username} left the chat")
}

/// Notice broadcast when a session changes its name
pub fn rename_notice(old: &str, new: &str) -> String {
    format!("[INFO]: {old} changed their name to {new}")
}

/// One parsed inbound line
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// `/exit`, exactly
    Exit,
    /// `/name <newname>` with a non-empty argument
    Rename(&'a str),
    /// Anything else: a chat line to relay
    Message(&'a str),
}

/// Parse one trimmed, non-empty inbound line.
///
/// Only `/exit` (exact) and `/name <arg>` are commands; any other text,
/// including `/name` glued to more letters, is an ordinary chat line.
pub fn parse_line(line: &str) -> Result<Command<'_>, ChatError> {
    if line == "/exit" {
        return Ok(Command::Exit);
    }
    if let Some(rest) = line.strip_prefix("/name") {
        if !rest.is_empty() && !rest.starts_with(' ') {
            // "/namesake" and friends are chat, not commands
            return Ok(Command::Message(line));
        }
        let new_name = rest.trim();
        if new_name.is_empty() {
            return Err(ChatError::CommandSyntax("usage: /name <newname>".into()));
        }
        return Ok(Command::Rename(new_name));
    }
    Ok(Command::Message(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_chat_message_format() {
        let msg = ChatMessage {
            timestamp: Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 5).unwrap(),
            author: "alice".to_string(),
            content: "hello there".to_string(),
        };
        assert_eq!(msg.format(), "[2024-05-01 09:30:05][alice]: hello there");
    }

    #[test]
    fn test_notice_formats() {
        assert_eq!(join_notice("bob"), "[INFO]: bob joined the chat");
        assert_eq!(leave_notice("bob"), "[INFO]: bob left the chat");
        assert_eq!(
            rename_notice("bob", "rob"),
            "[INFO]: bob changed their name to rob"
        );
    }

    #[test]
    fn test_parse_exit() {
        assert_eq!(parse_line("/exit").unwrap(), Command::Exit);
        // only the exact command exits
        assert_eq!(
            parse_line("/exit now").unwrap(),
            Command::Message("/exit now")
        );
    }

    #[test]
    fn test_parse_rename() {
        assert_eq!(parse_line("/name rob").unwrap(), Command::Rename("rob"));
        assert_eq!(
            parse_line("/name   spaced  ").unwrap(),
            Command::Rename("spaced")
        );
    }

    #[test]
    fn test_parse_rename_missing_argument() {
        assert!(matches!(
            parse_line("/name"),
            Err(ChatError::CommandSyntax(_))
        ));
        assert!(matches!(
            parse_line("/name   "),
            Err(ChatError::CommandSyntax(_))
        ));
    }

    #[test]
    fn test_parse_chat_line() {
        assert_eq!(parse_line("hello").unwrap(), Command::Message("hello"));
        assert_eq!(
            parse_line("/namesake").unwrap(),
            Command::Message("/namesake")
        );
    }
}
