//! Core mock orchestration service.
//!
//! `MockService` owns the process-wide state (registered routes, route file
//! location, toggles, default response) and runs the per-request pipeline:
//! load the route file, merge registered routes, resolve the route, load a
//! rule file if needed, validate, and dispatch.
//!
//! Per-request data never lives on the service. Each call to
//! [`MockService::handle`] works on its own [`RequestContext`] and token
//! bindings, so concurrent requests cannot observe each other.
use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, Ordering},
};

use arc_swap::{ArcSwap, ArcSwapOption};
use hyper::StatusCode;
use serde_json::Value;

use crate::{
    config::ServerSettings,
    core::{
        context::{RequestContext, TokenVars},
        dispatcher::{MockResponse, dispatch, error_response, not_found},
        error::{LoadError, ROUTES_FILE_ERROR, RULE_FILE_ERROR},
        matcher::find_route,
        route::{RequestSpec, ResponseSpec, RouteData, RouteDefinition},
        table::{RouteTable, merge_routes},
        validator::{PayloadMismatch, validate},
    },
    ports::document_loader::DocumentLoader,
};

pub const DEFAULT_ROUTE_FILE: &str = "./routes/routes.json";

/// Central orchestrator for route resolution, validation and dispatch.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct MockService {
    loader: Arc<dyn DocumentLoader>,
    route_file: ArcSwap<String>,
    registered: RwLock<RouteTable>,
    default_response: ArcSwapOption<ResponseSpec>,
    cors_enabled: AtomicBool,
    logs_enabled: AtomicBool,
    reject_payload_mismatch: AtomicBool,
}

impl MockService {
    pub fn new(loader: Arc<dyn DocumentLoader>) -> Self {
        Self {
            loader,
            route_file: ArcSwap::from_pointee(DEFAULT_ROUTE_FILE.to_string()),
            registered: RwLock::new(RouteTable::new()),
            default_response: ArcSwapOption::empty(),
            cors_enabled: AtomicBool::new(false),
            logs_enabled: AtomicBool::new(false),
            reject_payload_mismatch: AtomicBool::new(false),
        }
    }

    /// Build a service with the toggles and locations from `settings` applied.
    pub fn from_settings(loader: Arc<dyn DocumentLoader>, settings: &ServerSettings) -> Self {
        let service = Self::new(loader);
        service.set_route_file(settings.route_file.clone());
        service.set_cors(settings.cors_enabled);
        service.set_logs(settings.logs_enabled);
        service.set_payload_mismatch(settings.payload_mismatch);
        if let Some(default) = &settings.default_response {
            if !service.set_default_response(default) {
                tracing::warn!("Ignoring default response from settings: needs 'headers' and 'payload' objects");
            }
        }
        service
    }

    // ---------------------------------------------------------------------
    // Registration API
    // ---------------------------------------------------------------------

    /// Register an inline route. Only `GET`, `POST` and `PUT` are accepted
    /// (any case); other methods are silently ignored.
    pub fn register(
        &self,
        method: &str,
        url: &str,
        request: RequestSpec,
        response: ResponseSpec,
    ) -> &Self {
        let data = RouteData::new(request, response);
        let mut registered = self
            .registered
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if registered.register(method, url, data) {
            tracing::debug!("Registered route {}:{}", method.to_ascii_uppercase(), url);
        }
        self
    }

    pub fn get(&self, url: &str, request: RequestSpec, response: ResponseSpec) -> &Self {
        self.register("GET", url, request, response)
    }

    pub fn post(&self, url: &str, request: RequestSpec, response: ResponseSpec) -> &Self {
        self.register("POST", url, request, response)
    }

    pub fn put(&self, url: &str, request: RequestSpec, response: ResponseSpec) -> &Self {
        self.register("PUT", url, request, response)
    }

    /// Snapshot of the registered overlay.
    pub fn registered_routes(&self) -> RouteTable {
        self.registered
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn clear_registered(&self) {
        self.registered
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    // ---------------------------------------------------------------------
    // Settings
    // ---------------------------------------------------------------------

    pub fn set_route_file(&self, path: impl Into<String>) {
        self.route_file.store(Arc::new(path.into()));
    }

    pub fn route_file(&self) -> String {
        self.route_file.load().as_ref().clone()
    }

    /// Replace the 404 fallback. Returns `false` (and keeps the previous
    /// fallback) unless `value` has both a `headers` and a `payload` object.
    pub fn set_default_response(&self, value: &Value) -> bool {
        match ResponseSpec::from_default_value(value) {
            Some(spec) => {
                self.default_response.store(Some(Arc::new(spec)));
                true
            }
            None => false,
        }
    }

    pub fn set_payload_mismatch(&self, mode: PayloadMismatch) {
        self.reject_payload_mismatch
            .store(mode == PayloadMismatch::Reject, Ordering::Relaxed);
    }

    pub fn payload_mismatch(&self) -> PayloadMismatch {
        if self.reject_payload_mismatch.load(Ordering::Relaxed) {
            PayloadMismatch::Reject
        } else {
            PayloadMismatch::NotFound
        }
    }

    pub fn set_cors(&self, enabled: bool) {
        self.cors_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn enable_cors(&self) {
        self.set_cors(true);
    }

    pub fn disable_cors(&self) {
        self.set_cors(false);
    }

    pub fn cors_enabled(&self) -> bool {
        self.cors_enabled.load(Ordering::Relaxed)
    }

    pub fn set_logs(&self, enabled: bool) {
        self.logs_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn enable_logs(&self) {
        self.set_logs(true);
    }

    pub fn disable_logs(&self) {
        self.set_logs(false);
    }

    pub fn logs_enabled(&self) -> bool {
        self.logs_enabled.load(Ordering::Relaxed)
    }

    // ---------------------------------------------------------------------
    // Request pipeline
    // ---------------------------------------------------------------------

    /// Produce the response for one request. Never fails: every error path
    /// ends in exactly one response.
    pub async fn handle(&self, ctx: &RequestContext) -> MockResponse {
        let registered = self.registered_routes();
        let route_file = self.route_file.load_full();

        let loaded = match self.loader.load(&route_file).await {
            Ok(document) => {
                let table = RouteTable::from_document(&document);
                if table.is_none() {
                    tracing::warn!("Route file {} is not a JSON object", route_file);
                }
                table
            }
            Err(err @ LoadError::Parse { .. }) => {
                tracing::warn!("{}", err);
                None
            }
            Err(err) => return self.on_load_failure(ctx, err, &registered),
        };

        let Some(table) = merge_routes(loaded, &registered) else {
            return error_response(StatusCode::BAD_REQUEST, ROUTES_FILE_ERROR);
        };

        let Some(found) = find_route(&table, &ctx.method, &ctx.url) else {
            tracing::debug!("No route for {} {}", ctx.method, ctx.url);
            return self.not_found();
        };
        tracing::debug!("{} {} resolved to {}", ctx.method, ctx.url, found.key);

        match found.definition {
            RouteDefinition::Inline(data) => self.respond(ctx, data, &found.tokens),
            RouteDefinition::Unusable => self.not_found(),
            RouteDefinition::Rule(path) => match self.loader.load(path).await {
                Ok(Value::Null) => {
                    tracing::warn!("Rule file {} is null", path);
                    error_response(StatusCode::BAD_REQUEST, RULE_FILE_ERROR)
                }
                Ok(document) => {
                    self.respond(ctx, &RouteData::from_value(&document), &found.tokens)
                }
                Err(err @ LoadError::Parse { .. }) => {
                    tracing::warn!("{}", err);
                    error_response(StatusCode::BAD_REQUEST, RULE_FILE_ERROR)
                }
                Err(err) => self.on_load_failure(ctx, err, &registered),
            },
        }
    }

    /// A route or rule file could not be read. With nothing registered the raw
    /// error is returned to the client; otherwise the request is served from
    /// the registered routes alone.
    fn on_load_failure(
        &self,
        ctx: &RequestContext,
        err: LoadError,
        registered: &RouteTable,
    ) -> MockResponse {
        if registered.is_empty() {
            tracing::warn!("{}", err);
            return error_response(StatusCode::BAD_REQUEST, err.to_payload());
        }

        tracing::debug!("{}; falling back to registered routes", err);
        match find_route(registered, &ctx.method, &ctx.url) {
            Some(found) => match found.definition {
                RouteDefinition::Inline(data) => self.respond(ctx, data, &found.tokens),
                _ => self.not_found(),
            },
            None => self.not_found(),
        }
    }

    fn respond(&self, ctx: &RequestContext, data: &RouteData, tokens: &TokenVars) -> MockResponse {
        let default = self.default_response.load();
        match validate(ctx, data, self.payload_mismatch()) {
            Ok(spec) => dispatch(spec, tokens, default.as_deref()),
            Err(err) => {
                tracing::debug!("Rejecting {} {}: {:?}", ctx.method, ctx.url, err);
                error_response(StatusCode::BAD_REQUEST, err.to_string())
            }
        }
    }

    fn not_found(&self) -> MockResponse {
        not_found(self.default_response.load().as_deref())
    }
}
