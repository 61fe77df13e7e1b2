//! Error types
//!
//! Defines domain-specific error types for each module of the chat server.

use std::io;

use config::ConfigError;
use thiserror::Error;

use crate::client::ClientId;

/// Registry module errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("registry is full ({capacity} clients)")]
    CapacityExceeded { capacity: usize },
    #[error("nickname already registered: {0}")]
    NameTaken(String),
}

/// Failure to hand one line to one recipient
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("outbound queue full for client {0}")]
    QueueFull(ClientId),
    #[error("client {0} is no longer connected")]
    Disconnected(ClientId),
}

/// Nickname validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NicknameError {
    #[error("nickname is empty")]
    Empty,
    #[error("nickname exceeds {max} bytes")]
    TooLong { max: usize },
    #[error("nickname contains whitespace or control characters")]
    InvalidCharacter,
    #[error("nickname cannot start with '@'")]
    ReservedPrefix,
}

/// Why a connection handler reached its closed state
#[derive(Debug, Error)]
pub enum SessionEnd {
    #[error("peer closed the connection")]
    PeerClosed,
    #[error("read failure: {0}")]
    ReadFailure(#[from] io::Error),
    #[error("registry full")]
    CapacityExceeded,
}

/// Startup errors for the server binary
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
