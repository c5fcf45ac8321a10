//! HTTP server lifecycle.
//!
//! Binds the listener, serves the ingestion routes, and supports graceful
//! shutdown via a oneshot signal.

use std::net::SocketAddr;

use axum::Router;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::ServerError;

/// Owns the relay's HTTP listener and server task.
pub struct RelayServer {
    addr: SocketAddr,
    router: Router,
    local_addr: Option<SocketAddr>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RelayServer {
    /// Create a server for the given bind address and routes.
    pub fn new(addr: SocketAddr, router: Router) -> Self {
        Self {
            addr,
            router,
            local_addr: None,
            shutdown_tx: None,
            handle: None,
        }
    }

    /// Bind the listener and spawn the server task.
    pub async fn start(&mut self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: self.addr,
            source,
        })?;
        self.local_addr = Some(local_addr);

        tracing::info!("Webhook relay listening on {}", local_addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let app = self.router.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                    tracing::info!("Webhook relay shutting down");
                })
                .await
            {
                tracing::error!("Server error: {}", e);
            }
        });
        self.handle = Some(handle);
        Ok(())
    }

    /// Address actually bound. Differs from the configured address when
    /// started on port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Signal graceful shutdown and wait for the server task to finish.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}
