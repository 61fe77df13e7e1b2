use log::{debug, error, info};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::audit::AuditSink;
use crate::client::{ConnectionHandler, Registry};
use crate::config::ServerConfig;
use crate::error::ServerError;

/// Back-off after a failed accept so a persistent error (e.g. out of file
/// descriptors) does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

pub struct Server {
    registry: Arc<Registry>,
    audit: Arc<dyn AuditSink>,
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds to the configured address. The registry starts empty.
    pub async fn bind(config: ServerConfig, audit: Arc<dyn AuditSink>) -> Result<Self, ServerError> {
        let addr = config.socket_address();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            registry: Arc::new(Registry::new(config.max_clients)),
            audit,
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Accepts clients forever.
    pub async fn run(self) {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Accepts clients until `shutdown` completes, then aborts the
    /// connection handlers still running.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Starting RAX chat server on {} (max {} clients)",
            self.config.socket_address(),
            self.config.max_clients
        );
        self.audit.record("Chat server started");

        let handler = Arc::new(ConnectionHandler::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.audit),
            Arc::clone(&self.config),
        ));
        let mut handlers = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        info!("Accepted connection from {}", addr);
                        let handler = Arc::clone(&handler);

                        // One task per client so the accept loop never blocks
                        handlers.spawn(async move {
                            let end = handler.run(stream, addr).await;
                            debug!("Handler for {} finished: {}", addr, end);
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
                Some(finished) = handlers.join_next(), if !handlers.is_empty() => {
                    if let Err(e) = finished {
                        if e.is_panic() {
                            error!("Connection handler panicked: {}", e);
                        }
                    }
                }
            }
        }

        let outstanding = handlers.len();
        handlers.shutdown().await;
        info!("Server stopped ({} connection handlers aborted)", outstanding);
    }
}
