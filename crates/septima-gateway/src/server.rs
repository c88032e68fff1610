use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;

use crate::backend::ChatBackend;
use crate::error::GatewayError;
use crate::router::build_router;

pub(crate) struct AppState<B> {
    pub backend: Arc<B>,
    pub started_at: Instant,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            started_at: self.started_at,
        }
    }
}

pub struct GatewayServer<B> {
    addr: SocketAddr,
    rate_limit: u32,
    max_body_size: usize,
    backend: Arc<B>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<B: ChatBackend> GatewayServer<B> {
    #[must_use]
    pub fn new(bind: &str, port: u16, backend: Arc<B>, shutdown_rx: watch::Receiver<bool>) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("gateway binding to 0.0.0.0 with no authentication in front of it");
        }

        Self {
            addr,
            rate_limit: 60,
            max_body_size: 262_144,
            backend,
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn with_rate_limit(mut self, limit: u32) -> Self {
        self.rate_limit = limit;
        self
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Serve until the shutdown channel flips to `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let state = AppState {
            backend: self.backend,
            started_at: Instant::now(),
        };

        let router = build_router(state, self.rate_limit, self.max_body_size);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        tracing::info!(
            rate_limit = self.rate_limit,
            max_body_size = self.max_body_size,
            "gateway listening on {}",
            self.addr
        );

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            while !*shutdown_rx.borrow_and_update() {
                if shutdown_rx.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
            tracing::info!("gateway shutting down");
        })
        .await
        .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use septima_rag::{Answer, ChatMessage, GroupedResult, RagError};

    use super::*;

    struct NoopBackend;

    impl ChatBackend for NoopBackend {
        async fn answer(&self, _query: &str, _history: &[ChatMessage]) -> Result<Answer, RagError> {
            Err(RagError::Internal)
        }

        async fn search(
            &self,
            _query: &str,
            _top_k_paragraphs: Option<usize>,
            _top_k_sermons: Option<usize>,
        ) -> Result<Vec<GroupedResult>, RagError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn server_builder_chain() {
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::new("127.0.0.1", 8090, Arc::new(NoopBackend), srx)
            .with_rate_limit(30)
            .with_max_body_size(512);

        assert_eq!(server.rate_limit, 30);
        assert_eq!(server.max_body_size, 512);
        assert_eq!(server.addr.port(), 8090);
    }

    #[test]
    fn server_invalid_bind_fallback() {
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::new("not_an_ip", 9999, Arc::new(NoopBackend), srx);
        assert_eq!(server.addr.port(), 9999);
        assert!(server.addr.ip().is_loopback());
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown_signal() {
        let (stx, srx) = watch::channel(false);
        let server = GatewayServer::new("127.0.0.1", 0, Arc::new(NoopBackend), srx);
        let handle = tokio::spawn(server.serve());
        stx.send(true).unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
