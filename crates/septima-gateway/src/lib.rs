//! HTTP gateway for sermon chat and semantic search, with a health endpoint.

mod backend;
mod error;
mod handlers;
mod router;
mod server;

pub use backend::ChatBackend;
pub use error::GatewayError;
pub use server::GatewayServer;
