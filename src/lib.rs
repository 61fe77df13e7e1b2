pub mod audit;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod router;
pub mod server;

pub use server::Server;
