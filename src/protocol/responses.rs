//! Chat wire responses
//!
//! Every server-to-client line. Prompts have no trailing newline.

pub const NICKNAME_PROMPT: &str = "Enter your nickname: ";
pub const NICKNAME_REJECTED: &str = "Nickname already taken or invalid. Please choose another: ";
pub const NICKNAME_ACCEPTED: &str = "Nickname accepted! You can now chat.\n";
pub const SERVER_FULL: &str = "Error: Server is full. Try again later.\n";

pub fn joined(name: &str) -> String {
    format!("{} has joined the chat.\n", name)
}

pub fn left(name: &str) -> String {
    format!("{} has left the chat.\n", name)
}

pub fn broadcast_line(sender: &str, text: &str) -> String {
    format!("{}: {}\n", sender, text)
}

pub fn private_line(sender: &str, text: &str) -> String {
    format!("[Private from {}]: {}\n", sender, text)
}

pub fn recipient_not_found(target: &str) -> String {
    format!("Error: User '{}' not found\n", target)
}

pub fn message_too_long(limit: usize) -> String {
    format!("Error: Message exceeds {} bytes and was discarded\n", limit)
}
