use std::{net::SocketAddr, sync::Arc};

use axum::body::Body as AxumBody;
use eyre::{Result, WrapErr};
use hyper::{Request, body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::{rt::TokioIo, server::graceful::GracefulShutdown as ConnectionDrain};
use tokio::net::TcpListener;

use crate::{
    ports::http_server::{HttpHandler, HttpServer},
    utils::GracefulShutdown,
};

/// HTTP/1.1 server driving an [`HttpHandler`] over plain TCP.
///
/// A handler error terminates the connection without a response; that is
/// how oversized request bodies are refused.
pub struct MockHttpServer<H: HttpHandler> {
    listener: TcpListener,
    handler: Arc<H>,
    shutdown: Arc<GracefulShutdown>,
}

impl<H: HttpHandler> MockHttpServer<H> {
    /// Bind the listening socket. Port `0` picks a free port; see
    /// [`MockHttpServer::local_addr`].
    pub async fn bind(
        addr: SocketAddr,
        handler: Arc<H>,
        shutdown: Arc<GracefulShutdown>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .wrap_err_with(|| format!("Failed to bind to address {addr}"))?;

        Ok(Self {
            listener,
            handler,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .wrap_err("Failed to get local addr")
    }

    fn serve(&self, stream: tokio::net::TcpStream, peer: SocketAddr, drain: &ConnectionDrain) {
        let handler = self.handler.clone();
        let service = service_fn(move |req: Request<Incoming>| {
            let handler = handler.clone();
            async move { handler.handle_request(req.map(AxumBody::new)).await }
        });

        let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        let connection = drain.watch(connection);

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!("Connection from {} closed: {}", peer, e);
            }
        });
    }
}

impl<H: HttpHandler> HttpServer for MockHttpServer<H> {
    async fn run(&self) -> Result<()> {
        let local_addr = self.local_addr()?;
        tracing::info!("Stubway mock server listening on http://{}", local_addr);

        let drain = ConnectionDrain::new();
        let shutdown = self.shutdown.wait_for_shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                reason = &mut shutdown => {
                    tracing::info!("Shutdown signal received: {:?}", reason);
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.serve(stream, peer, &drain),
                    Err(e) => tracing::debug!("Accept error: {}", e),
                },
            }
        }

        tokio::select! {
            _ = drain.shutdown() => {
                tracing::info!("All connections closed");
            }
            _ = tokio::time::sleep(self.shutdown.drain_timeout()) => {
                tracing::warn!(
                    "Drain timeout ({:?}) exceeded, closing remaining connections",
                    self.shutdown.drain_timeout()
                );
            }
        }

        Ok(())
    }
}
