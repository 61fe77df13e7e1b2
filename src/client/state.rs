//! Module `state`
//!
//! Lifecycle of one connection: `Negotiating → Active → Closed`.

use std::fmt;

/// Where a connection handler is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for an acceptable nickname. Nothing is registered yet.
    Negotiating,
    /// Registered under `name` and exchanging messages.
    Active { name: String },
    /// Terminal. The connection has been released.
    Closed,
}

impl SessionState {
    /// Name the session is registered under, if it got that far.
    pub fn registered_name(&self) -> Option<&str> {
        match self {
            SessionState::Active { name } => Some(name),
            _ => None,
        }
    }

    /// Moves to `next`, returning the state being left.
    ///
    /// Only forward transitions are allowed; anything else is a bug in the
    /// handler and leaves the state untouched.
    pub fn transition(&mut self, next: SessionState) -> Option<SessionState> {
        let allowed = matches!(
            (&*self, &next),
            (SessionState::Negotiating, SessionState::Active { .. })
                | (SessionState::Negotiating, SessionState::Closed)
                | (SessionState::Active { .. }, SessionState::Closed)
        );

        if !allowed {
            debug_assert!(false, "invalid session transition {} -> {}", self, next);
            return None;
        }

        Some(std::mem::replace(self, next))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Negotiating => write!(f, "Negotiating"),
            SessionState::Active { name } => write!(f, "Active({})", name),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}
