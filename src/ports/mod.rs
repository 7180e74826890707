pub mod document_loader;
pub mod http_server;
