// Tests for serving route and rule files from disk through the mock service
#[cfg(test)]
mod test {
    use std::{path::Path, sync::Arc};

    use hyper::StatusCode;
    use serde_json::{Value, json};
    use stubway::{FileDocumentLoader, MockService, RequestContext, RequestSpec, ResponseSpec};
    use tempfile::TempDir;

    fn write_json(dir: &Path, name: &str, value: &Value) -> String {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
        path.to_str().unwrap().to_string()
    }

    /// Route file plus rule files laid out the way a project keeps them.
    fn fixture() -> (TempDir, MockService) {
        let dir = tempfile::tempdir().unwrap();

        let user_rule = write_json(
            dir.path(),
            "user.json",
            &json!({
                "request": {"headers": {"Content-Type": "application/json"}},
                "response": {
                    "headers": {"content-type": "application/json"},
                    "statusCode": 200,
                    "payload": {
                        "message": "User retrieved successfully",
                        "user": {"name": "cerlin"}
                    }
                }
            }),
        );
        let broken_rule = dir.path().join("broken.json");
        std::fs::write(&broken_rule, "{ \"request\": ").unwrap();
        let missing_rule = dir.path().join("dummy.json");

        let routes = write_json(
            dir.path(),
            "routes.json",
            &json!({
                "GET:/api/v2/user": {"rule": user_rule},
                "GET:/api/v2/broken": {"rule": broken_rule.to_str().unwrap()},
                "GET:/api/v2/missing": {"rule": missing_rule.to_str().unwrap()},
                "GET:/api/v2/user/:id/posts/:post": {
                    "data": {
                        "request": {},
                        "response": {"payload": {"user": ":id", "post": ":post"}}
                    }
                },
                "PUT:/api/v2/user/:id": {
                    "data": {
                        "request": {"payload": {"name": "ada"}},
                        "response": {"statusCode": 202, "payload": {"updated": ":id"}}
                    }
                }
            }),
        );

        let service = MockService::new(Arc::new(FileDocumentLoader::new()));
        service.set_route_file(routes);
        (dir, service)
    }

    fn object(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_rule_file_with_headers() {
        let (_dir, service) = fixture();

        let ctx = RequestContext::new("GET", "/api/v2/user")
            .with_header("content-type", "Application/JSON");
        let response = service.handle(&ctx).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["message"], "User retrieved successfully");

        let response = service
            .handle(&RequestContext::new("GET", "/api/v2/user"))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body,
            json!({"message": "One or more header(s) are missing"})
        );

        let ctx = RequestContext::new("GET", "/api/v2/user").with_header("content-type", "text/xml");
        let response = service.handle(&ctx).await;
        assert_eq!(response.body, json!({"message": "Header mismatch"}));
    }

    #[tokio::test]
    async fn test_multiple_path_parameters() {
        let (_dir, service) = fixture();
        let response = service
            .handle(&RequestContext::new("GET", "/API/v2/USER/Ada/posts/7/"))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({"user": "Ada", "post": "7"}));
    }

    #[tokio::test]
    async fn test_put_payload_validation() {
        let (_dir, service) = fixture();

        let ctx = RequestContext::new("PUT", "/api/v2/user/3").with_raw_body(br#"{"name":"ada"}"#);
        let response = service.handle(&ctx).await;
        assert_eq!(response.status, StatusCode::ACCEPTED);
        assert_eq!(response.body, json!({"updated": "3"}));

        let ctx = RequestContext::new("PUT", "/api/v2/user/3").with_raw_body(b"name=ada");
        assert_eq!(service.handle(&ctx).await.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rule_file_errors() {
        let (dir, service) = fixture();

        let response = service
            .handle(&RequestContext::new("GET", "/api/v2/broken"))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body["message"],
            "Route found, but error loading in the corresponding config."
        );

        let response = service
            .handle(&RequestContext::new("GET", "/api/v2/missing"))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["message"]["code"], "ENOENT");
        assert_eq!(response.body["message"]["errno"], -2);
        assert_eq!(
            response.body["message"]["path"],
            dir.path().join("dummy.json").to_str().unwrap()
        );
    }

    #[tokio::test]
    async fn test_route_file_errors() {
        let (dir, service) = fixture();

        let missing = dir.path().join(".doesntexist.json");
        service.set_route_file(missing.to_str().unwrap());
        let response = service.handle(&RequestContext::new("GET", "/")).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["message"]["code"], "ENOENT");
        assert_eq!(response.body["message"]["syscall"], "open");

        let invalid = dir.path().join("invalid.json");
        std::fs::write(&invalid, "[{,]").unwrap();
        service.set_route_file(invalid.to_str().unwrap());
        let response = service
            .handle(&RequestContext::new("GET", "/api/v2/user"))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body,
            json!({"message": "Error loading the routes file"})
        );
    }

    #[tokio::test]
    async fn test_route_file_edits_apply_without_restart() {
        let (dir, service) = fixture();
        let response = service.handle(&RequestContext::new("GET", "/ping")).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);

        write_json(
            dir.path(),
            "routes.json",
            &json!({
                "GET:/ping": {
                    "data": {"request": {}, "response": {"payload": {"pong": true}}}
                }
            }),
        );
        let response = service.handle(&RequestContext::new("GET", "/ping")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({"pong": true}));
    }

    #[tokio::test]
    async fn test_registered_route_replaces_missing_rule_file() {
        let (_dir, service) = fixture();
        service.get(
            "/api/v2/links",
            RequestSpec::new().header("content-type", "application/json"),
            ResponseSpec::new(
                StatusCode::OK,
                object(json!({"links": [{"name": "Link 1", "url": "/link1"}]})),
            ),
        );

        // The rule file is unreadable, so the registered routes serve the request.
        let ctx = RequestContext::new("GET", "/api/v2/missing");
        let response = service.handle(&ctx).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);

        let ctx = RequestContext::new("GET", "/api/v2/links")
            .with_header("Content-Type", "application/json");
        let response = service.handle(&ctx).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["links"][0]["url"], "/link1");
    }
}
