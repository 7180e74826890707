//! Route resolution: exact key lookup first, then segment-wise pattern
//! matching with `:name` placeholders.
use crate::core::{
    context::TokenVars,
    route::{RouteDefinition, RouteKey},
    table::RouteTable,
};

/// A resolved route together with the path parameters it captured.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch<'a> {
    pub key: &'a RouteKey,
    pub definition: &'a RouteDefinition,
    pub tokens: TokenVars,
}

/// Find the definition serving `method url`.
///
/// An exact `"<method>:<url>"` entry always wins. Otherwise the table is
/// scanned in order and the first pattern that fits is used.
pub fn find_route<'a>(table: &'a RouteTable, method: &str, url: &str) -> Option<RouteMatch<'a>> {
    let request_key = format!("{method}:{url}");

    if let Some((key, definition)) = table.get_key_value(&request_key) {
        return Some(RouteMatch {
            key,
            definition,
            tokens: TokenVars::new(),
        });
    }

    table.iter().find_map(|(key, definition)| {
        match_pattern(key.as_str(), &request_key).map(|tokens| RouteMatch {
            key,
            definition,
            tokens,
        })
    })
}

/// Match one `"<METHOD>:<pattern>"` key against a `"<METHOD>:<url>"` request
/// key, comparing case-insensitively.
///
/// Empty segments are dropped on the request side only, so `/user/42/`
/// fits `/user/:id` while a pattern with a trailing `/` needs an extra
/// segment. Captured values keep the request's original casing. Bindings are
/// local to this call, a failed candidate never leaks tokens.
pub fn match_pattern(pattern_key: &str, request_key: &str) -> Option<TokenVars> {
    let mut pattern = pattern_key.split('/');
    let mut request = request_key.split('/').filter(|segment| !segment.is_empty());

    let pattern_method = pattern.next()?;
    let request_method = request.next()?;
    if !pattern_method.eq_ignore_ascii_case(request_method) {
        return None;
    }

    let pattern: Vec<&str> = pattern.collect();
    let request: Vec<&str> = request.collect();
    if pattern.len() != request.len() {
        return None;
    }

    let mut tokens = TokenVars::new();
    for (expected, actual) in pattern.into_iter().zip(request) {
        match expected.strip_prefix(':') {
            Some(name) => tokens.bind(name, actual),
            None if expected.to_lowercase() == actual.to_lowercase() => {}
            None => return None,
        }
    }

    Some(tokens)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn table_fixture() -> RouteTable {
        RouteTable::from_document(&json!({
            "GET:/api/v2/user/:id": {"rule": "by-id.json"},
            "GET:/api/v2/user/me": {"rule": "me.json"},
            "POST:/api/v2/user/:id/:name": {"rule": "by-name.json"},
            "GET:/api/v2/:kind/list": {"rule": "kind.json"},
            "GET:/api/v2/links/list": {"rule": "links.json"}
        }))
        .unwrap()
    }

    fn rule_of(found: Option<RouteMatch<'_>>) -> String {
        match found.map(|m| m.definition.clone()) {
            Some(RouteDefinition::Rule(path)) => path,
            other => panic!("expected rule, got {other:?}"),
        }
    }

    #[test]
    fn exact_match_wins_over_earlier_pattern() {
        let table = table_fixture();
        let found = find_route(&table, "GET", "/api/v2/user/me").unwrap();
        assert_eq!(found.key.as_str(), "GET:/api/v2/user/me");
        assert!(found.tokens.is_empty());
    }

    #[test]
    fn pattern_binds_path_parameters() {
        let table = table_fixture();
        let found = find_route(&table, "GET", "/api/v2/user/42").unwrap();
        assert_eq!(found.key.as_str(), "GET:/api/v2/user/:id");
        assert_eq!(found.tokens.get("id"), Some("42"));

        let found = find_route(&table, "POST", "/api/v2/user/7/Cerlin").unwrap();
        assert_eq!(found.tokens.get("id"), Some("7"));
        assert_eq!(found.tokens.get("name"), Some("Cerlin"));
    }

    #[test]
    fn first_pattern_in_table_order_wins() {
        let table = RouteTable::from_document(&json!({
            "GET:/a/:x": {"rule": "first.json"},
            "GET:/:y/b": {"rule": "second.json"}
        }))
        .unwrap();
        assert_eq!(rule_of(find_route(&table, "GET", "/a/b")), "first.json");
        assert_eq!(rule_of(find_route(&table, "GET", "/z/b")), "second.json");

        let table = table_fixture();
        assert_eq!(
            rule_of(find_route(&table, "GET", "/api/v2/links/list")),
            "links.json"
        );
        let found = find_route(&table, "GET", "/api/v2/users/list").unwrap();
        assert_eq!(found.tokens.get("kind"), Some("users"));
    }

    #[test]
    fn literal_segments_and_method_ignore_case() {
        let tokens = match_pattern("GET:/Api/V2/user/:id", "get:/api/v2/USER/Ab3").unwrap();
        assert_eq!(tokens.get("id"), Some("Ab3"));
    }

    #[test]
    fn empty_request_segments_are_ignored() {
        let tokens = match_pattern("GET:/user/:id", "GET:/user/42/").unwrap();
        assert_eq!(tokens.get("id"), Some("42"));
        assert!(match_pattern("GET:/user/:id", "GET://user//42").is_some());
        assert!(match_pattern("GET:/user/:id/", "GET:/user/42").is_none());
    }

    #[test]
    fn method_and_length_must_agree() {
        assert!(match_pattern("GET:/user/:id", "POST:/user/42").is_none());
        assert!(match_pattern("GET:/user/:id", "GET:/user").is_none());
        assert!(match_pattern("GET:/user/:id", "GET:/user/42/extra").is_none());
        assert!(match_pattern("GET:/user/me", "GET:/user/you").is_none());
    }

    #[test]
    fn failed_candidates_do_not_leak_tokens() {
        let table = RouteTable::from_document(&json!({
            "GET:/shop/:shop/orders": {"rule": "orders.json"},
            "GET:/shop/:id/items": {"rule": "items.json"}
        }))
        .unwrap();

        let found = find_route(&table, "GET", "/shop/9/items").unwrap();
        assert_eq!(found.tokens.get("id"), Some("9"));
        assert_eq!(found.tokens.get("shop"), None);
        assert_eq!(found.tokens.len(), 1);
    }

    #[test]
    fn unknown_route_is_not_found() {
        assert!(find_route(&table_fixture(), "GET", "/this/route/doesnt/exist").is_none());
        assert!(find_route(&table_fixture(), "DELETE", "/api/v2/user/42").is_none());
    }
}
