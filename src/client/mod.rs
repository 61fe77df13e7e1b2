//! Client management system
//!
//! Connected-client records, the shared registry and the per-connection
//! handler that drives a client from nickname negotiation to disconnect.

pub mod handler;
pub mod outbox;
pub mod record;
pub mod registry;
pub mod state;

pub use handler::ConnectionHandler;
pub use outbox::{Outbox, spawn_writer};
pub use record::{ClientId, ClientRecord};
pub use registry::Registry;
pub use state::SessionState;
