//! Request validation against a matched route: headers first, then the body
//! of `POST`/`PUT` requests.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{
    context::RequestContext,
    error::ValidationError,
    route::{RequestSpec, ResponseSpec, RouteData},
};

/// What to answer when a `POST`/`PUT` body differs from the declared payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadMismatch {
    /// Treat the route as absent (404).
    #[default]
    NotFound,
    /// Reject with 400 "Payload is not matching".
    Reject,
}

/// Validate `ctx` against `route`.
///
/// * `Err(_)`: the request is rejected (400).
/// * `Ok(None)`: nothing to serve (404).
/// * `Ok(Some(_))`: the response to send.
pub fn validate<'a>(
    ctx: &RequestContext,
    route: &'a RouteData,
    on_mismatch: PayloadMismatch,
) -> Result<Option<&'a ResponseSpec>, ValidationError> {
    let expected = route.request.as_ref().map_err(|e| e.clone())?;
    validate_headers(ctx, expected)?;
    validate_payload(ctx, expected, route.response.as_ref(), on_mismatch)
}

/// Every declared header must be present and equal ignoring case. All headers
/// are checked; the last failing one, in declaration order, decides the error.
pub fn validate_headers(ctx: &RequestContext, expected: &RequestSpec) -> Result<(), ValidationError> {
    let mut failure = None;
    for (name, value) in &expected.headers {
        match ctx.header(name) {
            None => failure = Some(ValidationError::MissingHeader { name: name.clone() }),
            Some(actual) if actual.to_lowercase() != value.to_lowercase() => {
                failure = Some(ValidationError::HeaderMismatch {
                    name: name.clone(),
                    expected: value.clone(),
                    actual: actual.to_string(),
                })
            }
            Some(_) => {}
        }
    }
    failure.map_or(Ok(()), Err)
}

pub fn validate_payload<'a>(
    ctx: &RequestContext,
    expected: &RequestSpec,
    response: Option<&'a ResponseSpec>,
    on_mismatch: PayloadMismatch,
) -> Result<Option<&'a ResponseSpec>, ValidationError> {
    let declared = match &expected.payload {
        Some(declared) if ctx.is_mutating() => declared,
        _ => return Ok(response),
    };

    let body = ctx.body.as_ref().unwrap_or(&Value::Null);
    if deep_equal(body, declared) {
        return Ok(response);
    }

    tracing::debug!(
        "Payload of {} {} does not match the declared one",
        ctx.method,
        ctx.url
    );
    match on_mismatch {
        PayloadMismatch::NotFound => Ok(None),
        PayloadMismatch::Reject => Err(ValidationError::PayloadMismatch),
    }
}

/// Structural equality: object key order is irrelevant, array order is not,
/// and numbers compare by value (`1` equals `1.0`).
pub fn deep_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            l == r || matches!((l.as_f64(), r.as_f64()), (Some(l), Some(r)) if l == r)
        }
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(l, r)| deep_equal(l, r))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l
                    .iter()
                    .all(|(key, l)| r.get(key).is_some_and(|r| deep_equal(l, r)))
        }
        _ => left == right,
    }
}
