//! Outbound delivery
//!
//! Each connection has one writer task that owns the socket's write half and
//! drains a bounded queue in order. Everyone else talks to the client through
//! a cloneable [`Outbox`]; enqueueing never waits.

use log::{debug, warn};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::client::ClientId;
use crate::error::DeliveryError;

/// Short-lived sending handle for one client's outbound queue.
#[derive(Debug, Clone)]
pub struct Outbox {
    owner: ClientId,
    tx: mpsc::Sender<String>,
}

impl Outbox {
    pub fn owner(&self) -> ClientId {
        self.owner
    }

    /// Queues `line` for the owning client without blocking.
    pub fn deliver(&self, line: &str) -> Result<(), DeliveryError> {
        self.tx.try_send(line.to_string()).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull(self.owner),
            TrySendError::Closed(_) => DeliveryError::Disconnected(self.owner),
        })
    }

    /// Like [`deliver`](Self::deliver), but failures are only logged.
    pub fn deliver_or_log(&self, line: &str) -> bool {
        match self.deliver(line) {
            Ok(()) => true,
            Err(e @ DeliveryError::QueueFull(_)) => {
                warn!("Dropping outbound line: {}", e);
                false
            }
            Err(e @ DeliveryError::Disconnected(_)) => {
                debug!("Dropping outbound line: {}", e);
                false
            }
        }
    }
}

/// Spawns the writer task for `writer` and returns the queue feeding it.
///
/// The task ends once every `Outbox` clone is dropped or a write fails, and
/// shuts the write half down on the way out.
pub fn spawn_writer<W>(owner: ClientId, mut writer: W, depth: usize) -> (Outbox, JoinHandle<()>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(depth);

    let handle = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            let written = async {
                writer.write_all(line.as_bytes()).await?;
                writer.flush().await
            }
            .await;

            if let Err(e) = written {
                debug!("Write to client {} failed: {}", owner, e);
                break;
            }
        }

        rx.close();
        let _ = writer.shutdown().await;
    });

    (Outbox { owner, tx }, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn lines_arrive_in_order() {
        let (ours, mut theirs) = tokio::io::duplex(1024);
        let (outbox, writer) = spawn_writer(ClientId(1), ours, 8);

        outbox.deliver("one\n").unwrap();
        outbox.deliver("two\n").unwrap();
        drop(outbox);
        writer.await.unwrap();

        let mut received = String::new();
        theirs.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "one\ntwo\n");
    }

    #[tokio::test]
    async fn full_queue_reports_instead_of_blocking() {
        // A one-byte pipe nobody reads keeps the writer stuck on its first line.
        let (ours, _theirs) = tokio::io::duplex(1);
        let (outbox, _writer) = spawn_writer(ClientId(7), ours, 1);

        let mut saw_full = false;
        for _ in 0..16 {
            if let Err(e) = outbox.deliver("payload\n") {
                assert_eq!(e, DeliveryError::QueueFull(ClientId(7)));
                saw_full = true;
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(saw_full);
    }

    #[tokio::test]
    async fn closed_peer_reports_disconnected() {
        let (ours, theirs) = tokio::io::duplex(64);
        let (outbox, writer) = spawn_writer(ClientId(3), ours, 4);
        drop(theirs);

        // The first write fails and ends the writer task.
        let _ = outbox.deliver("lost\n");
        writer.await.unwrap();

        assert_eq!(
            outbox.deliver("after\n"),
            Err(DeliveryError::Disconnected(ClientId(3)))
        );
        assert!(!outbox.deliver_or_log("again\n"));
    }
}
