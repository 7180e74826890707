//! Error taxonomy for the matching, validation and dispatch pipeline.
//!
//! None of these ever escape [`crate::core::MockService::handle`]: each one is
//! turned into exactly one JSON response by the dispatcher.
use std::io;

use serde_json::{Value, json};
use thiserror::Error;

pub const ROUTES_FILE_ERROR: &str = "Error loading the routes file";
pub const RULE_FILE_ERROR: &str = "Route found, but error loading in the corresponding config.";
pub const HEADERS_MISSING: &str = "One or more header(s) are missing";
pub const HEADER_MISMATCH: &str = "Header mismatch";
pub const SCHEMA_ERROR: &str = "Schema error in config file";
pub const PAYLOAD_MISMATCH: &str = "Payload is not matching";

/// Failure reported by a [`crate::ports::document_loader::DocumentLoader`].
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum LoadError {
    /// The document could not be read at all.
    #[error("{code}: {message}, {syscall} '{path}'")]
    Io {
        path: String,
        code: String,
        errno: i32,
        syscall: String,
        message: String,
    },

    /// The document was read but is not usable JSON.
    #[error("Failed to parse '{path}': {reason}")]
    Parse { path: String, reason: String },
}

impl LoadError {
    /// Build an I/O load error from the underlying `std::io::Error` raised by
    /// `syscall` (`open` or `read`).
    pub fn io(path: impl Into<String>, syscall: &str, err: &io::Error) -> Self {
        let code = match err.kind() {
            io::ErrorKind::NotFound => "ENOENT",
            io::ErrorKind::PermissionDenied => "EACCES",
            io::ErrorKind::IsADirectory => "EISDIR",
            io::ErrorKind::InvalidInput => "EINVAL",
            _ => "EIO",
        };
        Self::Io {
            path: path.into(),
            code: code.to_string(),
            errno: err.raw_os_error().map(|errno| -errno).unwrap_or(0),
            syscall: syscall.to_string(),
            message: err.to_string(),
        }
    }

    pub fn parse(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// The raw error as exposed to clients in a 400 payload.
    pub fn to_payload(&self) -> Value {
        match self {
            Self::Io {
                path,
                code,
                errno,
                syscall,
                message,
            } => json!({
                "errno": errno,
                "code": code,
                "syscall": syscall,
                "path": path,
                "message": message,
            }),
            Self::Parse { path, reason } => json!({
                "code": "EPARSE",
                "path": path,
                "message": reason,
            }),
        }
    }
}

/// Malformed request expectations inside a route or rule document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("route document is not a JSON object")]
    DocumentNotObject,

    #[error("route document has no 'request' section")]
    MissingRequest,

    #[error("'request' must be an object")]
    RequestNotObject,

    #[error("'request.headers' must be an object")]
    HeadersNotObject,

    #[error("expected value of header '{name}' must be a string")]
    HeaderValueNotString { name: String },
}

/// Rejection of an incoming request by the validator. Always answered with 400.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("One or more header(s) are missing")]
    MissingHeader { name: String },

    #[error("Header mismatch")]
    HeaderMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Schema error in config file")]
    Schema(#[from] SchemaError),

    #[error("Payload is not matching")]
    PayloadMismatch,
}
