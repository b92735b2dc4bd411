//! Local library catalog: authors, books, genres and the physical copies
//! of each book, managed through server-rendered forms.

pub mod modules;
pub mod seed;
pub mod state;
pub mod templates;
pub mod utils;

use anyhow::Context;
use axum::Router;
use catalog_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use std::sync::Arc;

pub use state::{AppState, Catalog};

/// Register every module against `state` and initialize them.
pub async fn build_registry(state: &AppState, settings: &Settings) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, state)?;

    let ctx = InitCtx { settings };
    registry
        .init_all(&ctx)
        .await
        .context("failed to initialize modules")?;
    Ok(registry)
}

/// Router for the whole application over an existing state.
pub async fn build_app(state: AppState, settings: &Settings) -> anyhow::Result<Router> {
    let registry = build_registry(&state, settings).await?;
    Ok(catalog_http::build_router(&registry, settings))
}

/// Connect the store, serve until shutdown, then stop every module.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.endpoint,
        "catalog-app bootstrap starting"
    );

    let store = catalog_db::connect(&settings.database)
        .await
        .context("failed to open the document store")?;
    let views = templates::load(&settings.views).context("failed to load templates")?;
    let state = AppState::new(store, Arc::new(views));

    let registry = build_registry(&state, &settings).await?;
    let ctx = InitCtx {
        settings: &settings,
    };
    registry.start_all(&ctx).await.context("failed to start modules")?;
    tracing::info!(modules = registry.len(), "catalog-app bootstrap complete");

    let served = catalog_http::start_server(&registry, &settings).await;
    registry.stop_all().await.context("failed to stop modules")?;
    served
}
