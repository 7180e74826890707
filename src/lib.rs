//! Stubway - a configurable HTTP mock server.
//!
//! Stubway answers HTTP requests from declarative JSON route files. Each route
//! is keyed by `"<METHOD>:<urlPattern>"` and either points at a rule file or
//! carries an inline request/response pair. Requests are matched exactly or by
//! `:param` placeholders, validated against the declared headers and body, and
//! answered with the configured status, headers and payload (with path
//! parameters substituted in).
//!
//! # Features
//! - Route and rule files are re-read on every request, so edits apply live
//! - Programmatic registration (`get` / `post` / `put`) overriding file routes
//! - Case-insensitive header validation and structural body comparison
//! - Configurable fallback (default) response for unmatched requests
//! - Optional permissive CORS with preflight handling
//! - Hard 1 MB request body cap that drops the offending connection
//! - Structured logging via `tracing` and graceful shutdown
//!
//! # Quick Example
//! ```no_run
//! use std::{net::SocketAddr, sync::Arc};
//!
//! use hyper::StatusCode;
//! use serde_json::json;
//! use stubway::{
//!     FileDocumentLoader, MockHttpHandler, MockHttpServer, MockService, RequestSpec,
//!     ResponseSpec, ports::http_server::HttpServer, utils::GracefulShutdown,
//! };
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let service = Arc::new(MockService::new(Arc::new(FileDocumentLoader::new())));
//! service.set_route_file("./routes/routes.json");
//! service.get(
//!     "/api/v2/user/:id",
//!     RequestSpec::new(),
//!     ResponseSpec::new(
//!         StatusCode::OK,
//!         json!({"id": ":id"}).as_object().cloned().unwrap_or_default(),
//!     ),
//! );
//!
//! let addr: SocketAddr = "127.0.0.1:8000".parse()?;
//! let handler = Arc::new(MockHttpHandler::new(service));
//! let server = MockHttpServer::bind(addr, handler, Arc::new(GracefulShutdown::new())).await?;
//! server.run().await?;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations) while keeping
//! the matching, validation and dispatch logic inside `core`, free of any I/O.
//!
//! # Error Handling
//! Library errors are `thiserror` enums; every pipeline error ends in exactly one JSON
//! response. The binary uses `eyre` with `WrapErr` context.
pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{FileDocumentLoader, MockHttpHandler, MockHttpServer},
    core::{
        MockResponse, MockService, PayloadMismatch, RequestContext, RequestSpec, ResponseSpec,
        RouteTable,
    },
    ports::document_loader::DocumentLoader,
    utils::GracefulShutdown,
};
