//! Inbound message parsing
//!
//! Classifies active-phase lines and validates requested nicknames.

use crate::error::NicknameError;

/// An inbound chat line after classification.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatMessage<'a> {
    /// `@target body`: delivered to one named client.
    Private { target: &'a str, body: &'a str },
    /// Everything else, including `@name` with no space.
    Broadcast(&'a str),
}

impl<'a> ChatMessage<'a> {
    /// A line is private when it starts with `@` and contains a space. The
    /// target runs from after the `@` to the first space; the body is the rest.
    pub fn parse(line: &'a str) -> Self {
        if let Some(rest) = line.strip_prefix('@') {
            if let Some((target, body)) = rest.split_once(' ') {
                return ChatMessage::Private { target, body };
            }
        }
        ChatMessage::Broadcast(line)
    }
}

/// Checks a requested nickname against the naming rules.
///
/// Names must be non-empty, at most `max_len` bytes, free of whitespace and
/// control characters, and must not start with `@` (they could never be
/// addressed by a private message otherwise).
pub fn validate_nickname(name: &str, max_len: usize) -> Result<&str, NicknameError> {
    if name.is_empty() {
        return Err(NicknameError::Empty);
    }

    if name.len() > max_len {
        return Err(NicknameError::TooLong { max: max_len });
    }

    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(NicknameError::InvalidCharacter);
    }

    if name.starts_with('@') {
        return Err(NicknameError::ReservedPrefix);
    }

    Ok(name)
}
