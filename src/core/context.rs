//! Per-request state carried through matching, validation and dispatch.
//!
//! Everything that belongs to one request lives here and is passed down the
//! pipeline explicitly, so concurrent requests never share mutable state.
use std::collections::BTreeMap;

use serde_json::Value;

/// Path parameters captured by the matcher, keyed by name without the `:`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenVars(BTreeMap<String, String>);

impl TokenVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Look up the value for a `:name` placeholder.
    pub fn resolve(&self, placeholder: &str) -> Option<&str> {
        placeholder.strip_prefix(':').and_then(|name| self.get(name))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Transport-independent view of one incoming request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: String,
    /// Request path used for matching (no query string).
    pub url: String,
    /// Header names lower-cased; repeated headers keep the last value.
    headers: BTreeMap<String, String>,
    /// Parsed JSON body, `None` when empty or not valid JSON.
    pub body: Option<Value>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// Parse a raw body the lenient way: anything that is not JSON is no body.
    pub fn with_raw_body(self, raw: &[u8]) -> Self {
        let body = serde_json::from_slice(raw).ok();
        self.with_body(body)
    }

    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether the method carries a body that takes part in validation.
    pub fn is_mutating(&self) -> bool {
        self.method == "POST" || self.method == "PUT"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let ctx = RequestContext::new("GET", "/").with_header("Content-Type", "application/json");
        assert_eq!(ctx.header("content-type"), Some("application/json"));
        assert_eq!(ctx.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(ctx.header("accept"), None);
    }

    #[test]
    fn raw_body_is_parsed_leniently() {
        let ctx = RequestContext::new("POST", "/").with_raw_body(br#"{"name":"cerlin"}"#);
        assert_eq!(ctx.body, Some(json!({"name": "cerlin"})));

        let ctx = RequestContext::new("POST", "/").with_raw_body(b"name=cerlin");
        assert_eq!(ctx.body, None);

        let ctx = RequestContext::new("POST", "/").with_raw_body(b"");
        assert_eq!(ctx.body, None);
    }

    #[test]
    fn only_post_and_put_are_mutating() {
        assert!(RequestContext::new("POST", "/").is_mutating());
        assert!(RequestContext::new("PUT", "/").is_mutating());
        assert!(!RequestContext::new("GET", "/").is_mutating());
        assert!(!RequestContext::new("DELETE", "/").is_mutating());
    }

    #[test]
    fn tokens_resolve_placeholders() {
        let mut tokens = TokenVars::new();
        tokens.bind("id", "42");
        assert_eq!(tokens.resolve(":id"), Some("42"));
        assert_eq!(tokens.resolve("id"), None);
        assert_eq!(tokens.resolve(":name"), None);
    }
}
