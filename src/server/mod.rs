//! Server core functionality
//!
//! The acceptor: binds the listener and runs one supervised connection
//! handler task per accepted client.

pub mod core;

pub use self::core::Server;
