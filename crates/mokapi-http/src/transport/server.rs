//! Mock server accept loop.

use crate::registry::Resolver;
use crate::transport::router::route_request;
use anyhow::Context;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// HTTP server replaying definitions and hosting the management API
pub struct MockServer {
    host: String,
    port: u16,
    resolver: Arc<Resolver>,
}

impl MockServer {
    pub fn new(host: impl Into<String>, port: u16, resolver: Arc<Resolver>) -> Self {
        Self {
            host: host.into(),
            port,
            resolver,
        }
    }

    /// Bind the configured address and serve until `shutdown` fires
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind((self.host.as_str(), self.port))
            .await
            .with_context(|| format!("Failed to bind {}:{}", self.host, self.port))?;
        Self::serve(listener, self.resolver, shutdown).await
    }

    /// Serve connections from an already bound listener until `shutdown`
    /// fires or its sender is dropped. In-flight connections are left to
    /// finish on their own tasks.
    pub async fn serve(
        listener: TcpListener,
        resolver: Arc<Resolver>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), anyhow::Error> {
        let local_addr = listener.local_addr()?;
        info!("MokAPI listening on http://{}", local_addr);

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let resolver = Arc::clone(&resolver);
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req| {
                                    let resolver = Arc::clone(&resolver);
                                    async move { route_request(req, resolver).await }
                                });
                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, service)
                                    .await
                                {
                                    debug!("Connection error from {}: {}", addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error on {}: {}", local_addr, e);
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("MokAPI on {} shutting down", local_addr);
                    break;
                }
            }
        }

        Ok(())
    }
}
