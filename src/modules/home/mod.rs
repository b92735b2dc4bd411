use async_trait::async_trait;
use axum::{extract::State, response::Response, routing::get, Router};
use catalog_db::Filter;
use catalog_http::AppError;
use catalog_kernel::{InitCtx, Module};
use serde::Serialize;
use std::sync::Arc;
use tera::Context;

use crate::state::{AppState, Catalog};

/// Catalog landing page with record counts.
pub struct HomeModule {
    state: AppState,
}

impl HomeModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for HomeModule {
    fn name(&self) -> &'static str {
        "home"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "home module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(index))
            .with_state(self.state.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub book_count: u64,
    pub book_instance_count: u64,
    pub book_instance_available_count: u64,
    pub author_count: u64,
    pub genre_count: u64,
}

impl Counts {
    /// All five counts, queried concurrently.
    pub async fn fetch(catalog: &Catalog) -> Result<Self, AppError> {
        let (
            book_count,
            book_instance_count,
            book_instance_available_count,
            author_count,
            genre_count,
        ) = tokio::try_join!(
            catalog.books.count(Filter::All),
            catalog.instances.count(Filter::All),
            catalog.instances.count(Filter::eq("status", "Available")),
            catalog.authors.count(Filter::All),
            catalog.genres.count(Filter::All),
        )?;

        Ok(Self {
            book_count,
            book_instance_count,
            book_instance_available_count,
            author_count,
            genre_count,
        })
    }
}

async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    let counts = Counts::fetch(&state.catalog).await?;

    let mut context = Context::new();
    context.insert("title", "Local Library Home");
    context.insert("data", &counts);
    state.render("index.html", &context)
}

pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(HomeModule::new(state))
}
