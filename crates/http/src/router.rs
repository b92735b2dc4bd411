//! Router builder for the catalog HTTP server

use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    Router,
};
use std::time::Duration;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use uuid::Uuid;

use crate::error::AppError;

/// Every entity route lives under this prefix.
pub const CATALOG_PREFIX: &str = "/catalog";

/// Builder for constructing the main HTTP router
pub struct RouterBuilder {
    router: Router,
    catalog: Router,
    tracing: bool,
    request_id: bool,
    timeout: Option<Duration>,
}

impl RouterBuilder {
    /// Create a new router builder
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            catalog: Router::new(),
            tracing: false,
            request_id: false,
            timeout: None,
        }
    }

    /// Add a top-level route
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Merge a module's router into the `/catalog` tree
    pub fn mount_module(mut self, module_name: &str, module_router: Router) -> Self {
        tracing::info!(
            module = module_name,
            "mounting module routes under {}",
            CATALOG_PREFIX
        );
        self.catalog = self.catalog.merge(module_router);
        self
    }

    /// Add tracing middleware
    pub fn with_tracing(mut self) -> Self {
        self.tracing = true;
        self
    }

    /// Add request ID middleware; the id is echoed back on the response
    pub fn with_request_id(mut self) -> Self {
        self.request_id = true;
        self
    }

    /// Add timeout middleware
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(Duration::from_millis(timeout_ms));
        self
    }

    /// Build the final router. Unknown paths render the 404 error page.
    ///
    /// Middleware is applied here, after every route is known, so it wraps
    /// module routes and the fallback alike.
    pub fn build(self) -> Router {
        let mut router = self
            .router
            .nest(CATALOG_PREFIX, self.catalog)
            .fallback(not_found);

        if let Some(timeout) = self.timeout {
            router = router.layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeout,
            ));
        }
        if self.tracing {
            router = router.layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(true))
                    .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                    .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
            );
        }
        if self.request_id {
            // Outermost, so the trace span already sees the id.
            router = router
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7));
        }
        router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn not_found() -> AppError {
    AppError::not_found("Page not found")
}

/// Request ID generator for tracing
#[derive(Clone)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let request_id = Uuid::now_v7().to_string().parse::<HeaderValue>().ok()?;
        Some(RequestId::new(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_module_mounting() {
        let module_router = Router::new().route("/genres", get(|| async { "genres" }));

        let router = RouterBuilder::new()
            .mount_module("genres", module_router)
            .build();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/catalog/genres")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let router = RouterBuilder::new()
            .route("/healthz", get(|| async { "ok" }))
            .with_tracing()
            .with_request_id()
            .with_timeout(5000)
            .build();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_slow_handler_times_out() {
        let router = RouterBuilder::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .with_timeout(20)
            .build();

        let response = router
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let router = RouterBuilder::new()
            .route("/healthz", get(|| async { "ok" }))
            .build();

        let response = router
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
