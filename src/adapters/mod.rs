pub mod file_loader;
pub mod http_handler;
pub mod http_server;
pub mod middleware;

/// Re-export commonly used types from adapters
pub use file_loader::FileDocumentLoader;
pub use http_handler::MockHttpHandler;
pub use http_server::MockHttpServer;
