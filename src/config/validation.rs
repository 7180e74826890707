#![allow(clippy::collapsible_if)]

use std::net::SocketAddr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::{
    config::models::ServerSettings,
    core::{
        error::LoadError,
        route::{ResponseSpec, RouteData, RouteDefinition},
    },
    ports::document_loader::DocumentLoader,
};

/// Methods a route file may use.
const KNOWN_METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

static ROUTE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+):(/\S*)$").expect("invalid route key regex"));

/// Validation result type alias
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Problems found in server settings or a route file
#[derive(Debug, thiserror::Error, Clone)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Invalid route '{key}': {message}")]
    InvalidRoute { key: String, message: String },

    #[error("Route file could not be used: {0}")]
    RouteFile(#[from] LoadError),

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Server settings validator
pub struct SettingsValidator;

impl SettingsValidator {
    /// Validate all settings, reporting every problem at once
    pub fn validate(settings: &ServerSettings) -> SettingsResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&settings.listen_addr) {
            errors.push(e);
        }

        if settings.route_file.trim().is_empty() {
            errors.push(SettingsError::InvalidField {
                field: "route_file".to_string(),
                message: "Route file path must not be empty".to_string(),
            });
        }

        if settings.max_body_bytes == 0 {
            errors.push(SettingsError::InvalidField {
                field: "max_body_bytes".to_string(),
                message: "Body limit must be greater than zero".to_string(),
            });
        }

        if let Some(default_response) = &settings.default_response {
            if ResponseSpec::from_default_value(default_response).is_none() {
                errors.push(SettingsError::InvalidField {
                    field: "default_response".to_string(),
                    message: "Must contain 'headers' and 'payload' objects".to_string(),
                });
            }
        }

        into_result(errors)
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> SettingsResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(SettingsError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:8000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }
}

/// Counts reported for a route file that passed validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteFileSummary {
    pub routes: usize,
    pub rules: usize,
    pub inline: usize,
}

/// Route file linter
///
/// Checks key syntax, methods, definition shape, rule file readability and
/// the request/response schema of every route.
pub struct RouteFileValidator;

impl RouteFileValidator {
    /// Load and lint the route file at `route_file`.
    pub async fn validate(
        loader: &dyn DocumentLoader,
        route_file: &str,
    ) -> SettingsResult<RouteFileSummary> {
        let document = loader.load(route_file).await?;
        Self::validate_document(loader, &document).await
    }

    /// Lint an already parsed route document. Rule files are loaded through
    /// `loader`.
    pub async fn validate_document(
        loader: &dyn DocumentLoader,
        document: &Value,
    ) -> SettingsResult<RouteFileSummary> {
        let Some(routes) = document.as_object() else {
            return Err(SettingsError::ValidationFailed {
                message: "Route file must contain a JSON object".to_string(),
            });
        };

        let mut errors = Vec::new();
        let mut summary = RouteFileSummary {
            routes: routes.len(),
            ..RouteFileSummary::default()
        };

        for (key, definition) in routes {
            if let Err(e) = Self::validate_key(key) {
                errors.push(e);
            }

            match RouteDefinition::from_value(definition) {
                RouteDefinition::Rule(path) => {
                    summary.rules += 1;
                    match loader.load(&path).await {
                        Ok(rule) => {
                            let data = RouteData::from_value(&rule);
                            if let Err(e) = Self::validate_route_data(key, &data) {
                                errors.push(e);
                            }
                        }
                        Err(e) => errors.push(SettingsError::InvalidRoute {
                            key: key.clone(),
                            message: e.to_string(),
                        }),
                    }
                }
                RouteDefinition::Inline(data) => {
                    summary.inline += 1;
                    if let Err(e) = Self::validate_route_data(key, &data) {
                        errors.push(e);
                    }
                }
                RouteDefinition::Unusable => errors.push(SettingsError::InvalidRoute {
                    key: key.clone(),
                    message: "Needs a string 'rule' or a 'data' object".to_string(),
                }),
            }
        }

        into_result(errors).map(|()| summary)
    }

    fn validate_key(key: &str) -> SettingsResult<()> {
        let Some(captures) = ROUTE_KEY_RE.captures(key) else {
            return Err(SettingsError::InvalidRoute {
                key: key.to_string(),
                message: "Keys must look like 'METHOD:/path'".to_string(),
            });
        };

        let method = &captures[1];
        if !KNOWN_METHODS.contains(&method.to_ascii_uppercase().as_str()) {
            return Err(SettingsError::InvalidRoute {
                key: key.to_string(),
                message: format!("Unknown HTTP method '{method}'"),
            });
        }

        if captures[2].split('/').any(|segment| segment == ":") {
            return Err(SettingsError::InvalidRoute {
                key: key.to_string(),
                message: "Path parameters need a name after ':'".to_string(),
            });
        }

        Ok(())
    }

    fn validate_route_data(key: &str, data: &RouteData) -> SettingsResult<()> {
        if let Err(e) = &data.request {
            return Err(SettingsError::InvalidRoute {
                key: key.to_string(),
                message: e.to_string(),
            });
        }
        if data.response.is_none() {
            return Err(SettingsError::InvalidRoute {
                key: key.to_string(),
                message: "'response.payload' must be an object".to_string(),
            });
        }
        Ok(())
    }
}

fn into_result(errors: Vec<SettingsError>) -> SettingsResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SettingsError::ValidationFailed {
            message: format_multiple_errors(errors),
        })
    }
}

/// Format multiple validation errors into a single message
fn format_multiple_errors(errors: Vec<SettingsError>) -> String {
    if errors.len() == 1 {
        return errors[0].to_string();
    }

    let mut message = format!("Found {} validation errors:\n", errors.len());
    for (i, error) in errors.iter().enumerate() {
        message.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    message
}
