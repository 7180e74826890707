use axum::body::Body as AxumBody;
use eyre::Result;
use hyper::{Request, Response};
use thiserror::Error;

/// Error type for HTTP handler operations
///
/// Any error returned by a handler makes the server drop the connection
/// without writing a response.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HandlerError {
    /// The request body grew past the configured limit
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The request body stream failed
    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    /// The response could not be assembled
    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// HttpServer defines the port (interface) for serving HTTP connections
pub trait HttpServer: Send + Sync + 'static {
    /// Run the HTTP server
    ///
    /// # Returns
    /// A future that resolves when the server shuts down or encounters an error
    fn run(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// HttpHandler defines the port for handling HTTP requests
pub trait HttpHandler: Send + Sync + 'static {
    /// Handle an incoming HTTP request
    ///
    /// # Arguments
    /// * `req` - The HTTP request to handle
    ///
    /// # Returns
    /// A future that resolves to an HTTP response, or an error when the
    /// connection must be aborted instead of answered
    fn handle_request(
        &self,
        req: Request<AxumBody>,
    ) -> impl std::future::Future<Output = Result<Response<AxumBody>, HandlerError>> + Send;
}
