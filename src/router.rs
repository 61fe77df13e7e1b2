//! Message routing
//!
//! Formats an inbound line and hands it to the right outboxes. Delivery is
//! fire-and-forget: one recipient failing never stops the others and never
//! reaches the sender.

use log::debug;

use crate::client::{ClientId, ClientRecord, Registry};
use crate::protocol::ChatMessage;
use crate::protocol::responses::{broadcast_line, private_line, recipient_not_found};

/// What happened to a routed line.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Sent to every other client and echoed to the sender.
    Broadcast { delivered: usize, failed: usize },
    /// Sent to one named client. `delivered` is false if its queue refused it.
    Private { target: String, delivered: bool },
    /// No client by that name; the sender got an error line.
    RecipientNotFound { target: String },
}

/// Classifies `line` and dispatches it on behalf of `sender`.
pub async fn route(registry: &Registry, sender: &ClientRecord, line: &str) -> RouteOutcome {
    match ChatMessage::parse(line) {
        ChatMessage::Private { target, body } => send_private(registry, sender, target, body).await,
        ChatMessage::Broadcast(text) => {
            let formatted = broadcast_line(sender.name(), text);
            let (delivered, failed) = broadcast_from(registry, sender.id(), &formatted).await;
            sender.outbox().deliver_or_log(&formatted);
            RouteOutcome::Broadcast { delivered, failed }
        }
    }
}

/// Sends an already formatted line to everyone except `excluding`.
///
/// Returns `(delivered, failed)` counts.
pub async fn broadcast_from(registry: &Registry, excluding: ClientId, line: &str) -> (usize, usize) {
    let targets = registry.broadcast_targets(excluding).await;

    let mut delivered = 0;
    let mut failed = 0;
    for outbox in &targets {
        if outbox.deliver_or_log(line) {
            delivered += 1;
        } else {
            failed += 1;
        }
    }

    debug!(
        "Broadcast from {}: {} delivered, {} failed",
        excluding, delivered, failed
    );
    (delivered, failed)
}

async fn send_private(
    registry: &Registry,
    sender: &ClientRecord,
    target: &str,
    body: &str,
) -> RouteOutcome {
    match registry.lookup_by_name(target).await {
        Some(outbox) => {
            let delivered = outbox.deliver_or_log(&private_line(sender.name(), body));
            RouteOutcome::Private {
                target: target.to_string(),
                delivered,
            }
        }
        None => {
            debug!("{} tried to message unknown user '{}'", sender.name(), target);
            sender.outbox().deliver_or_log(&recipient_not_found(target));
            RouteOutcome::RecipientNotFound {
                target: target.to_string(),
            }
        }
    }
}
