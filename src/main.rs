//! RAX Chat Server - Entry Point
//!
//! Multi-client TCP chat with nicknames, broadcast and private messages.

use std::process::ExitCode;
use std::sync::Arc;

use env_logger::Env;
use log::{error, info, warn};

use rax_chat_server::Server;
use rax_chat_server::audit::{AuditSink, FileAuditSink, NullAuditSink};
use rax_chat_server::config::ServerConfig;

#[tokio::main]
async fn main() -> ExitCode {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Launching chat server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // A missing audit trail degrades the server, it does not stop it
    let audit: Arc<dyn AuditSink> = match FileAuditSink::open(&config.audit_log_path) {
        Ok(sink) => {
            info!("Audit log: {}", sink.path().display());
            Arc::new(sink)
        }
        Err(e) => {
            warn!(
                "Failed to open audit log {}: {}; audit events will be dropped",
                config.audit_log_path, e
            );
            Arc::new(NullAuditSink)
        }
    };

    let server = match Server::bind(config, audit).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Ctrl+C received, shutting down");
        })
        .await;

    ExitCode::SUCCESS
}
