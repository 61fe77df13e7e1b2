//! Module `record`
//!
//! Defines the `ClientRecord` kept in the registry for every named session.

use std::fmt;
use std::net::SocketAddr;

use crate::client::Outbox;

/// Opaque handle identifying one accepted connection. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub(crate) u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered chat session.
///
/// Name and peer address are fixed at construction. The outbox is the only
/// way to reach the client's socket; the socket itself stays with the
/// connection handler.
#[derive(Debug, Clone)]
pub struct ClientRecord {
    id: ClientId,
    name: String,
    peer_addr: SocketAddr,
    outbox: Outbox,
}

impl ClientRecord {
    pub fn new(id: ClientId, name: impl Into<String>, peer_addr: SocketAddr, outbox: Outbox) -> Self {
        Self {
            id,
            name: name.into(),
            peer_addr,
            outbox,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }
}
