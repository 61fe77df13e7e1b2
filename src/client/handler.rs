//! Connection handler
//!
//! Drives one connection through nickname negotiation and the message loop,
//! and owns its cleanup. Every path out of the handler unregisters the
//! client (if it got registered), announces the departure, and releases the
//! socket exactly once.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::FramedRead;

use crate::audit::AuditSink;
use crate::client::{ClientId, ClientRecord, Outbox, Registry, SessionState, spawn_writer};
use crate::config::ServerConfig;
use crate::error::{RegistrationError, SessionEnd};
use crate::protocol::responses::{
    NICKNAME_ACCEPTED, NICKNAME_PROMPT, NICKNAME_REJECTED, SERVER_FULL, joined, left,
    message_too_long,
};
use crate::protocol::{ChatCodec, InboundLine, validate_nickname};
use crate::router::{self, RouteOutcome};

/// How long a closing connection may spend flushing queued output.
const WRITER_LINGER: Duration = Duration::from_secs(5);

type Lines<R> = FramedRead<R, ChatCodec>;

/// Per-connection state machine. One instance can serve any number of
/// connections; all per-connection state lives inside [`run`](Self::run).
pub struct ConnectionHandler {
    registry: Arc<Registry>,
    audit: Arc<dyn AuditSink>,
    config: Arc<ServerConfig>,
}

impl ConnectionHandler {
    pub fn new(registry: Arc<Registry>, audit: Arc<dyn AuditSink>, config: Arc<ServerConfig>) -> Self {
        Self {
            registry,
            audit,
            config,
        }
    }

    /// Serves `stream` until the peer goes away, returning why it ended.
    pub async fn run<S>(&self, stream: S, peer_addr: SocketAddr) -> SessionEnd
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let id = self.registry.next_client_id();
        let (read_half, write_half) = tokio::io::split(stream);
        let (outbox, writer) = spawn_writer(id, write_half, self.config.outbound_queue_depth);
        let mut lines = FramedRead::new(read_half, ChatCodec::new(self.config.max_message_length));
        let mut state = SessionState::Negotiating;

        debug!("Client {} ({}) entered {}", id, peer_addr, state);

        let end = match self.negotiate(id, peer_addr, &outbox, &mut lines).await {
            Ok(record) => {
                state.transition(SessionState::Active {
                    name: record.name().to_string(),
                });
                self.announce_join(&record).await;
                self.message_loop(&record, &mut lines).await
            }
            Err(end) => end,
        };

        let previous = state.transition(SessionState::Closed);
        if let Some(name) = previous.as_ref().and_then(SessionState::registered_name) {
            self.announce_departure(id, name).await;
        }
        debug!("Client {} ({}) closed: {}", id, peer_addr, end);

        // Dropping the last local handles lets the writer drain and shut the socket.
        drop(lines);
        drop(outbox);
        release(id, writer).await;

        end
    }

    /// Prompts until a usable nickname is registered.
    async fn negotiate<R>(
        &self,
        id: ClientId,
        peer_addr: SocketAddr,
        outbox: &Outbox,
        lines: &mut Lines<R>,
    ) -> Result<ClientRecord, SessionEnd>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            outbox.deliver_or_log(NICKNAME_PROMPT);
            let requested = match next_line(lines).await? {
                InboundLine::Line(line) => line,
                InboundLine::TooLong | InboundLine::Malformed => {
                    outbox.deliver_or_log(NICKNAME_REJECTED);
                    continue;
                }
            };

            if let Err(e) = validate_nickname(&requested, self.config.max_nickname_length) {
                debug!("Client {} offered unusable nickname {:?}: {}", id, requested, e);
                outbox.deliver_or_log(NICKNAME_REJECTED);
                continue;
            }

            if self.registry.is_name_taken(&requested).await {
                outbox.deliver_or_log(NICKNAME_REJECTED);
                continue;
            }

            let record = ClientRecord::new(id, requested, peer_addr, outbox.clone());
            let accepted = self.registry.register_with(record.clone(), |r| {
                r.outbox().deliver_or_log(NICKNAME_ACCEPTED);
            });
            match accepted.await {
                Ok(()) => return Ok(record),
                Err(RegistrationError::NameTaken(name)) => {
                    // Lost a race with a concurrent registration of the same name.
                    debug!("Client {} lost the race for nickname '{}'", id, name);
                    outbox.deliver_or_log(NICKNAME_REJECTED);
                }
                Err(RegistrationError::CapacityExceeded { capacity }) => {
                    warn!(
                        "Maximum clients reached ({}), closing connection from {}",
                        capacity, peer_addr
                    );
                    outbox.deliver_or_log(SERVER_FULL);
                    return Err(SessionEnd::CapacityExceeded);
                }
            }
        }
    }

    async fn announce_join(&self, record: &ClientRecord) {
        let peer = record.peer_addr();
        info!(
            "Client {} connected from {}:{}",
            record.name(),
            peer.ip(),
            peer.port()
        );
        self.audit.record(&format!(
            "Client {} connected from {}:{}",
            record.name(),
            peer.ip(),
            peer.port()
        ));

        router::broadcast_from(&self.registry, record.id(), &joined(record.name())).await;
    }

    async fn message_loop<R>(&self, record: &ClientRecord, lines: &mut Lines<R>) -> SessionEnd
    where
        R: AsyncRead + Unpin,
    {
        loop {
            let line = match next_line(lines).await {
                Ok(InboundLine::Line(line)) => line,
                Ok(InboundLine::TooLong) => {
                    self.audit
                        .record(&format!("Discarded oversized line from {}", record.name()));
                    record
                        .outbox()
                        .deliver_or_log(&message_too_long(self.config.max_message_length));
                    continue;
                }
                Ok(InboundLine::Malformed) => {
                    debug!("Ignoring non-UTF-8 line from {}", record.name());
                    self.audit
                        .record(&format!("Discarded malformed line from {}", record.name()));
                    continue;
                }
                Err(end) => return end,
            };

            debug!("Message from {}: {}", record.name(), line);
            self.audit
                .record(&format!("Message from {}: {}", record.name(), line));

            if let RouteOutcome::RecipientNotFound { target } =
                router::route(&self.registry, record, &line).await
            {
                debug!("Private message from {} to missing '{}'", record.name(), target);
            }
        }
    }

    async fn announce_departure(&self, id: ClientId, name: &str) {
        self.registry.unregister(id).await;

        info!("Client {} disconnected", name);
        self.audit.record(&format!("Client {} disconnected", name));

        router::broadcast_from(&self.registry, id, &left(name)).await;
    }
}

async fn next_line<R>(lines: &mut Lines<R>) -> Result<InboundLine, SessionEnd>
where
    R: AsyncRead + Unpin,
{
    match lines.next().await {
        Some(Ok(line)) => Ok(line),
        Some(Err(e)) => Err(SessionEnd::ReadFailure(e)),
        None => Err(SessionEnd::PeerClosed),
    }
}

/// Waits for the writer to flush and close, aborting it if the peer stalls.
async fn release(id: ClientId, writer: tokio::task::JoinHandle<()>) {
    let abort = writer.abort_handle();
    if tokio::time::timeout(WRITER_LINGER, writer).await.is_err() {
        warn!("Writer for client {} did not finish in time, aborting", id);
        abort.abort();
    }
}
