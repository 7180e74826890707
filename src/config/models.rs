//! Server settings.
//!
//! These map directly to a TOML (also JSON / YAML) settings file and to
//! `STUBWAY_*` environment variables. Every field has a default, so an empty
//! or missing file is a valid configuration.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{service::DEFAULT_ROUTE_FILE, validator::PayloadMismatch};

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";

/// Request bodies larger than this abort the connection.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1_000_000;

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_route_file() -> String {
    DEFAULT_ROUTE_FILE.to_string()
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Main server settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    /// Address to listen on (`IP:PORT`)
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Route file consulted on every request
    #[serde(default = "default_route_file")]
    pub route_file: String,

    /// Answer preflights and add CORS headers to every response
    #[serde(default)]
    pub cors_enabled: bool,

    /// Log each request at `info` instead of `debug`
    #[serde(default)]
    pub logs_enabled: bool,

    /// Outcome when a POST/PUT body does not match the declared payload
    #[serde(default)]
    pub payload_mismatch: PayloadMismatch,

    /// Hard cap on buffered request bodies
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Replacement for the built-in 404 response. Needs `headers` and
    /// `payload` objects; `statusCode` is optional.
    #[serde(default)]
    pub default_response: Option<Value>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            route_file: default_route_file(),
            cors_enabled: false,
            logs_enabled: false,
            payload_mismatch: PayloadMismatch::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            default_response: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let settings: ServerSettings = serde_json::from_value(json!({})).unwrap();
        assert_eq!(settings, ServerSettings::default());
        assert_eq!(settings.listen_addr, "127.0.0.1:8000");
        assert_eq!(settings.route_file, "./routes/routes.json");
        assert_eq!(settings.max_body_bytes, 1_000_000);
        assert_eq!(settings.payload_mismatch, PayloadMismatch::NotFound);
    }

    #[test]
    fn payload_mismatch_is_snake_case() {
        let settings: ServerSettings =
            serde_json::from_value(json!({"payload_mismatch": "reject"})).unwrap();
        assert_eq!(settings.payload_mismatch, PayloadMismatch::Reject);
    }
}
