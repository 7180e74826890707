use std::{sync::Arc, time::Instant};

use axum::{
    body::Body as AxumBody,
    http::{HeaderName, HeaderValue, StatusCode, header},
};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::{Request, Response};
use serde_json::json;
use tracing::Instrument;

use crate::{
    adapters::middleware::{
        apply_cors_headers, apply_request_id, is_preflight, log_request, new_request_id,
    },
    config::DEFAULT_MAX_BODY_BYTES,
    core::{MockResponse, MockService, RequestContext, dispatcher::JSON_CONTENT_TYPE},
    ports::http_server::{HandlerError, HttpHandler},
    tracing_setup::create_request_span,
};

/// HTTP adapter in front of [`MockService`].
///
/// Buffers the request body up to a hard limit, hands a transport-free
/// [`RequestContext`] to the service and writes the resulting
/// [`MockResponse`] back out.
pub struct MockHttpHandler {
    service: Arc<MockService>,
    max_body_bytes: usize,
}

impl MockHttpHandler {
    pub fn new(service: Arc<MockService>) -> Self {
        Self {
            service,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn service(&self) -> &Arc<MockService> {
        &self.service
    }

    /// Collect the whole body, failing once it grows past the limit.
    async fn read_body(&self, body: AxumBody) -> Result<Bytes, HandlerError> {
        match Limited::new(body, self.max_body_bytes).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                Err(HandlerError::PayloadTooLarge {
                    limit: self.max_body_bytes,
                })
            }
            Err(e) => Err(HandlerError::BodyRead(e.to_string())),
        }
    }

    async fn process(&self, req: Request<AxumBody>) -> Result<Response<AxumBody>, HandlerError> {
        let cors_enabled = self.service.cors_enabled();
        let (parts, body) = req.into_parts();

        let bytes = self.read_body(body).await?;

        let response = if is_preflight(&parts.method, cors_enabled) {
            MockResponse {
                status: StatusCode::OK,
                headers: vec![("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())],
                body: json!({}),
            }
        } else {
            let mut ctx = RequestContext::new(parts.method.as_str(), parts.uri.path())
                .with_raw_body(&bytes);
            for (name, value) in &parts.headers {
                match value.to_str() {
                    Ok(value) => ctx.insert_header(name.as_str(), value),
                    Err(_) => tracing::debug!("Skipping non-UTF-8 request header '{}'", name),
                }
            }
            self.service.handle(&ctx).await
        };

        let mut response = into_http_response(response)?;
        if cors_enabled {
            apply_cors_headers(response.headers_mut());
        }
        Ok(response)
    }
}

impl HttpHandler for MockHttpHandler {
    async fn handle_request(
        &self,
        req: Request<AxumBody>,
    ) -> Result<Response<AxumBody>, HandlerError> {
        let started = Instant::now();
        let request_id = new_request_id();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let span = create_request_span(method.as_str(), &path, &request_id);

        let result = self.process(req).instrument(span.clone()).await;

        match result {
            Ok(mut response) => {
                apply_request_id(response.headers_mut(), &request_id);
                span.record("http.status_code", response.status().as_u16());
                log_request(
                    self.service.logs_enabled(),
                    &method,
                    &path,
                    response.status(),
                    started,
                );
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(parent: &span, "Dropping connection for {} {}: {}", method, path, e);
                Err(e)
            }
        }
    }
}

/// Copy a [`MockResponse`] onto a hyper response. Header pairs that are not
/// valid HTTP are skipped with a warning.
pub fn into_http_response(mock: MockResponse) -> Result<Response<AxumBody>, HandlerError> {
    let body = mock.body_string();
    let mut response = Response::builder()
        .status(mock.status)
        .body(AxumBody::from(body))
        .map_err(|e| HandlerError::InternalError(e.to_string()))?;

    let headers = response.headers_mut();
    for (name, value) in &mock.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::warn!("Invalid response header: {} = {}", name, value),
        }
    }
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON_CONTENT_TYPE),
        );
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::{core::error::LoadError, ports::document_loader::DocumentLoader};

    struct StaticLoader(Value);

    #[async_trait]
    impl DocumentLoader for StaticLoader {
        async fn load(&self, _path: &str) -> Result<Value, LoadError> {
            Ok(self.0.clone())
        }
    }

    fn handler() -> MockHttpHandler {
        let routes = json!({
            "GET:/api/v2/user/:id": {
                "data": {
                    "request": {},
                    "response": {"payload": {"id": ":id"}}
                }
            },
            "POST:/echo": {
                "data": {
                    "request": {"payload": {"ping": true}},
                    "response": {"statusCode": 201, "payload": {"pong": true}}
                }
            }
        });
        MockHttpHandler::new(Arc::new(MockService::new(Arc::new(StaticLoader(routes)))))
    }

    fn request(method: &str, uri: &str, body: impl Into<AxumBody>) -> Request<AxumBody> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(body.into())
            .unwrap()
    }

    async fn body_json(response: Response<AxumBody>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn query_string_is_ignored_for_matching() {
        let response = handler()
            .handle_request(request("GET", "/api/v2/user/42?verbose=1", AxumBody::empty()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSON_CONTENT_TYPE);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_json(response).await, json!({"id": "42"}));
    }

    #[tokio::test]
    async fn json_body_reaches_the_validator() {
        let response = handler()
            .handle_request(request("POST", "/echo", r#"{"ping": true}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = handler()
            .handle_request(request("POST", "/echo", "not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn oversized_body_is_an_error() {
        let handler = handler().with_max_body_bytes(16);
        let err = handler
            .handle_request(request("POST", "/echo", vec![b'x'; 17]))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::PayloadTooLarge { limit: 16 }));
    }

    #[tokio::test]
    async fn preflight_is_answered_when_cors_is_enabled() {
        let handler = handler();
        let response = handler
            .handle_request(request("OPTIONS", "/anything", AxumBody::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!response.headers().contains_key("access-control-allow-origin"));

        handler.service().enable_cors();
        let response = handler
            .handle_request(request("OPTIONS", "/anything", AxumBody::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(body_json(response).await, json!({}));

        let response = handler
            .handle_request(request("GET", "/api/v2/user/1", AxumBody::empty()))
            .await
            .unwrap();
        assert_eq!(
            response.headers()["access-control-allow-methods"],
            "GET, POST, PUT, DELETE"
        );
    }

    #[test]
    fn invalid_headers_are_skipped() {
        let response = into_http_response(MockResponse {
            status: StatusCode::ACCEPTED,
            headers: vec![
                ("bad header".to_string(), "x".to_string()),
                ("x-ok".to_string(), "yes".to_string()),
            ],
            body: json!({"ok": true}),
        })
        .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["x-ok"], "yes");
        assert_eq!(response.headers().len(), 2);
    }
}
