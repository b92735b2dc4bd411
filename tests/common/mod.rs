#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use catalog_app::{templates, AppState, Catalog};
use catalog_db::MemoryStore;
use catalog_kernel::settings::{Settings, ViewSettings};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub catalog: Catalog,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestApp {
    /// Full application over an empty in-memory store.
    pub async fn new() -> Self {
        let views = templates::load(&ViewSettings::default()).unwrap();
        let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(views));
        let catalog = state.catalog.clone();
        let router = catalog_app::build_app(state, &Settings::default())
            .await
            .unwrap();
        Self { router, catalog }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// POST a url-encoded form; repeated keys are sent as given.
    pub async fn post(&self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}

impl TestResponse {
    /// Id at the end of a `/catalog/<kind>/<id>` redirect.
    pub fn redirected_id(&self) -> String {
        let location = self.location.as_deref().unwrap();
        location.rsplit('/').next().unwrap().to_string()
    }
}
