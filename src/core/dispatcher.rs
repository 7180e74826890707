//! Final response assembly.
//!
//! Produces a transport-independent [`MockResponse`]; the HTTP adapter only
//! copies it onto the wire. The body is always a JSON object.
use hyper::StatusCode;
use serde_json::{Value, json};

use crate::core::{context::TokenVars, route::ResponseSpec};

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl MockResponse {
    /// Case-insensitive header lookup (last value wins).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every header called `name` with a single `value`.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    /// The wire body.
    pub fn body_string(&self) -> String {
        self.body.to_string()
    }
}

/// Write a matched response, or the 404 fallback when there is none.
///
/// Path parameters are substituted structurally: a header value or payload
/// leaf string equal to `:name` is replaced by the bound value. Strings that
/// merely contain a placeholder are left alone.
pub fn dispatch(
    spec: Option<&ResponseSpec>,
    tokens: &TokenVars,
    default: Option<&ResponseSpec>,
) -> MockResponse {
    let Some(spec) = spec else {
        return not_found(default);
    };

    let mut body = Value::Object(spec.payload.clone());
    substitute_tokens(&mut body, tokens);

    let headers = spec
        .headers
        .iter()
        .map(|(name, value)| {
            let value = tokens.resolve(value).unwrap_or(value.as_str());
            (name.clone(), value.to_string())
        })
        .collect();

    let mut response = MockResponse {
        status: spec.status,
        headers,
        body,
    };
    if response.header("content-type").is_none() {
        response.set_header("Content-Type", JSON_CONTENT_TYPE);
    }
    response
}

/// The "no route" answer: the configured default response if one was
/// accepted, otherwise 404 `{"error": "Route not found"}`. Always JSON.
pub fn not_found(default: Option<&ResponseSpec>) -> MockResponse {
    let mut response = match default {
        Some(spec) => MockResponse {
            status: spec.status,
            headers: spec.headers.clone(),
            body: Value::Object(spec.payload.clone()),
        },
        None => MockResponse {
            status: StatusCode::NOT_FOUND,
            headers: Vec::new(),
            body: json!({ "error": "Route not found" }),
        },
    };
    response.set_header("Content-Type", JSON_CONTENT_TYPE);
    response
}

/// A `{"message": ...}` error response.
pub fn error_response(status: StatusCode, message: impl Into<Value>) -> MockResponse {
    MockResponse {
        status,
        headers: vec![("content-type".to_string(), JSON_CONTENT_TYPE.to_string())],
        body: json!({ "message": message.into() }),
    }
}

/// Replace every string leaf equal to a bound `:name` placeholder.
pub fn substitute_tokens(value: &mut Value, tokens: &TokenVars) {
    if tokens.is_empty() {
        return;
    }
    match value {
        Value::String(s) => {
            if let Some(bound) = tokens.resolve(s) {
                *s = bound.to_string();
            }
        }
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| substitute_tokens(item, tokens)),
        Value::Object(fields) => fields
            .values_mut()
            .for_each(|field| substitute_tokens(field, tokens)),
        _ => {}
    }
}
