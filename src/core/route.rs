//! Typed route model.
//!
//! Route and rule documents arrive as loose JSON. They are converted once,
//! when loaded, into the types below so that the rest of the pipeline never
//! has to re-check shapes. Malformed request expectations are kept as a
//! [`SchemaError`] instead of being dropped, because they must still surface
//! as a 400 when the route is hit.
use std::{borrow::Borrow, fmt};

use hyper::StatusCode;
use serde_json::{Map, Value};

use crate::core::error::SchemaError;

/// Methods accepted by the registration API.
pub const REGISTRABLE_METHODS: [&str; 3] = ["GET", "POST", "PUT"];

/// `"<METHOD>:<urlPattern>"` as used for route table keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey(String);

impl RouteKey {
    pub fn new(method: &str, pattern: &str) -> Self {
        Self(format!("{method}:{pattern}"))
    }

    /// Wrap a raw key read from a route file.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Method token (everything before the first `:`).
    pub fn method(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(m, _)| m)
    }

    /// URL pattern (everything after the first `:`).
    pub fn pattern(&self) -> &str {
        self.0.split_once(':').map_or("", |(_, p)| p)
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RouteKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One entry of the route table.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteDefinition {
    /// Reference to a rule file, loaded on every hit.
    Rule(String),
    /// Request/response pair declared in place.
    Inline(RouteData),
    /// Entry with neither a usable `rule` nor `data`; answered with 404.
    Unusable,
}

impl RouteDefinition {
    /// Interpret one value of a route file.
    pub fn from_value(value: &Value) -> Self {
        match value.get("rule") {
            Some(Value::String(path)) => return Self::Rule(path.clone()),
            Some(_) => return Self::Unusable,
            None => {}
        }

        match value.get("data") {
            Some(data) => Self::Inline(RouteData::from_value(data)),
            None => Self::Unusable,
        }
    }
}

/// Expected request and configured response of a single route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteData {
    pub request: Result<RequestSpec, SchemaError>,
    pub response: Option<ResponseSpec>,
}

impl RouteData {
    pub fn new(request: RequestSpec, response: ResponseSpec) -> Self {
        Self {
            request: Ok(request),
            response: Some(response),
        }
    }

    /// Interpret an inline `data` object or a whole rule document.
    pub fn from_value(value: &Value) -> Self {
        let Some(document) = value.as_object() else {
            return Self {
                request: Err(SchemaError::DocumentNotObject),
                response: None,
            };
        };

        let request = match document.get("request") {
            None => Err(SchemaError::MissingRequest),
            Some(request) => RequestSpec::from_value(request),
        };
        let response = document.get("response").and_then(ResponseSpec::from_value);

        Self { request, response }
    }
}

/// Expectations on the incoming request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSpec {
    /// Declared headers in declaration order. Names keep their original case.
    pub headers: Vec<(String, String)>,
    /// Expected body. `Some(Value::Null)` means "declared as null".
    pub payload: Option<Value>,
}

impl RequestSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let request = value.as_object().ok_or(SchemaError::RequestNotObject)?;

        let headers = match request.get("headers") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(headers)) => headers
                .iter()
                .map(|(name, expected)| match expected {
                    Value::String(expected) => Ok((name.clone(), expected.clone())),
                    _ => Err(SchemaError::HeaderValueNotString { name: name.clone() }),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(SchemaError::HeadersNotObject),
        };

        Ok(Self {
            headers,
            payload: request.get("payload").cloned(),
        })
    }
}

/// Response written when a route matches and validates.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    pub headers: Vec<(String, String)>,
    pub status: StatusCode,
    pub payload: Map<String, Value>,
}

impl ResponseSpec {
    pub fn new(status: StatusCode, payload: Map<String, Value>) -> Self {
        Self {
            headers: Vec::new(),
            status,
            payload,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Interpret a `response` section.
    ///
    /// Returns `None` unless the section is an object whose `payload` is an
    /// object; such a route is treated as absent. A missing or out-of-range
    /// `statusCode` falls back to 200.
    pub fn from_value(value: &Value) -> Option<Self> {
        let response = value.as_object()?;
        let payload = response.get("payload")?.as_object()?.clone();

        let status = response
            .get("statusCode")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::OK);

        Some(Self {
            headers: response
                .get("headers")
                .map(header_pairs)
                .unwrap_or_default(),
            status,
            payload,
        })
    }

    /// Whether `value` is acceptable as a replacement 404 response: it needs
    /// both a `headers` object and a `payload` object.
    pub fn from_default_value(value: &Value) -> Option<Self> {
        match value.get("headers") {
            Some(Value::Object(_)) => Self::from_value(value),
            _ => None,
        }
    }
}

fn header_pairs(headers: &Value) -> Vec<(String, String)> {
    let Some(headers) = headers.as_object() else {
        return Vec::new();
    };

    headers
        .iter()
        .filter_map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    tracing::warn!("Ignoring non-scalar response header '{}'", name);
                    return None;
                }
            };
            Some((name.clone(), value))
        })
        .collect()
}
