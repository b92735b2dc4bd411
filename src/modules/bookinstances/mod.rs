pub mod models;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use catalog_db::{DocId, Query, Record, StoreResult};
use catalog_http::{validation::ValidationErrors, AppError, FormData};
use catalog_kernel::{InitCtx, Module};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tera::Context;

use crate::modules::books::models::{Book, BookView};
use crate::state::{redirect, AppState, Catalog};
use crate::utils::EntityKind;
use models::{BookInstanceInput, BookInstanceView, Status};

/// Book instances (physical copies) module
pub struct BookInstancesModule {
    state: AppState,
}

impl BookInstancesModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BookInstancesModule {
    fn name(&self) -> &'static str {
        "bookinstances"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "bookinstances module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/bookinstances", get(bookinstance_list))
            .route(
                "/bookinstance/create",
                get(bookinstance_create_get).post(bookinstance_create_post),
            )
            .route("/bookinstance/{id}", get(bookinstance_detail))
            .route(
                "/bookinstance/{id}/delete",
                get(bookinstance_delete_get).post(bookinstance_delete_post),
            )
            .route(
                "/bookinstance/{id}/update",
                get(bookinstance_update_get).post(bookinstance_update_post),
            )
            .with_state(self.state.clone())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "bookinstances module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "bookinstances module stopped");
        Ok(())
    }
}

/// The copy joined with its book, or `None` when the copy does not exist.
async fn find_populated(
    catalog: &Catalog,
    id: &DocId,
) -> Result<Option<BookInstanceView>, AppError> {
    let Some(instance) = catalog.instances.find_by_id(id).await? else {
        return Ok(None);
    };
    let book = catalog.books.find_by_id(&instance.data.book).await?;
    Ok(Some(BookInstanceView::populated(&instance, book.as_ref())))
}

async fn book_choices(catalog: &Catalog) -> StoreResult<Vec<Record<Book>>> {
    catalog.books.find_many(Query::all().sort_by("title")).await
}

/// Render the copy form with every book as a candidate.
async fn form_page(
    state: &AppState,
    title: &str,
    input: &BookInstanceInput,
    errors: &ValidationErrors,
) -> Result<Response, AppError> {
    let books = book_choices(&state.catalog).await?;
    render_form(state, title, input, &books, errors)
}

fn render_form(
    state: &AppState,
    title: &str,
    input: &BookInstanceInput,
    books: &[Record<Book>],
    errors: &ValidationErrors,
) -> Result<Response, AppError> {
    let statuses: Vec<&str> = Status::ALL.iter().map(|status| status.as_str()).collect();

    let mut context = Context::new();
    context.insert("title", title);
    context.insert("bookinstance", input);
    context.insert(
        "book_list",
        &books.iter().map(BookView::plain).collect::<Vec<_>>(),
    );
    context.insert("selected_book", &input.book);
    context.insert("statuses", &statuses);
    context.insert("errors", errors);
    state.render("bookinstance_form.html", &context)
}

/// Each distinct referenced book is fetched once.
async fn bookinstance_list(State(state): State<AppState>) -> Result<Response, AppError> {
    let catalog = &state.catalog;
    let instances = catalog.instances.find_many(Query::all()).await?;

    let mut seen = HashSet::new();
    let ids: Vec<DocId> = instances
        .iter()
        .map(|instance| instance.data.book.clone())
        .filter(|id| seen.insert(id.clone()))
        .collect();
    let books = catalog.books.find_by_ids(&ids).await?;
    let books: HashMap<&DocId, &Record<Book>> = books.iter().map(|book| (&book.id, book)).collect();

    let views: Vec<BookInstanceView> = instances
        .iter()
        .map(|instance| {
            BookInstanceView::populated(instance, books.get(&instance.data.book).copied())
        })
        .collect();

    let mut context = Context::new();
    context.insert("title", "Book Instance List");
    context.insert("bookinstance_list", &views);
    state.render("bookinstance_list.html", &context)
}

async fn bookinstance_detail(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
) -> Result<Response, AppError> {
    let instance = find_populated(&state.catalog, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Book copy not found"))?;
    let book_title = instance
        .book
        .as_ref()
        .map(|book| book.title.as_str())
        .unwrap_or_default();

    let mut context = Context::new();
    context.insert("title", &format!("Copy: {book_title}"));
    context.insert("bookinstance", &instance);
    state.render("bookinstance_detail.html", &context)
}

async fn bookinstance_create_get(State(state): State<AppState>) -> Result<Response, AppError> {
    form_page(
        &state,
        "Create BookInstance",
        &BookInstanceInput::default(),
        &ValidationErrors::default(),
    )
    .await
}

async fn bookinstance_create_post(
    State(state): State<AppState>,
    form: FormData,
) -> Result<Response, AppError> {
    let (input, errors) = BookInstanceInput::from_form(&form);
    if !errors.is_empty() {
        return form_page(&state, "Create BookInstance", &input, &errors).await;
    }

    let instance = state.catalog.instances.save(input.to_instance()).await?;
    tracing::info!(id = %instance.id, book = %instance.data.book, "book copy created");
    Ok(redirect(&EntityKind::BookInstance.url(&instance.id)))
}

async fn bookinstance_delete_get(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
) -> Result<Response, AppError> {
    let Some(instance) = find_populated(&state.catalog, &id).await? else {
        return Ok(redirect(&EntityKind::BookInstance.list_url()));
    };

    let mut context = Context::new();
    context.insert("title", "Delete BookInstance");
    context.insert("bookinstance", &instance);
    state.render("bookinstance_delete.html", &context)
}

/// Copies have no dependents, so deletion is never blocked.
async fn bookinstance_delete_post(
    State(state): State<AppState>,
    form: FormData,
) -> Result<Response, AppError> {
    let id = form.require_id("bookinstanceid")?;
    let deleted = state.catalog.instances.delete_by_id(&id).await?;
    tracing::info!(id = %id, deleted, "book copy deleted");
    Ok(redirect(&EntityKind::BookInstance.list_url()))
}

/// The copy and the book candidates are fetched together.
async fn bookinstance_update_get(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
) -> Result<Response, AppError> {
    let (instance, books) = tokio::try_join!(
        state.catalog.instances.find_by_id(&id),
        book_choices(&state.catalog),
    )?;
    let instance = instance.ok_or_else(|| AppError::not_found("Book copy not found"))?;

    render_form(
        &state,
        "Update BookInstance",
        &BookInstanceInput::from(&instance.data),
        &books,
        &ValidationErrors::default(),
    )
}

async fn bookinstance_update_post(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
    form: FormData,
) -> Result<Response, AppError> {
    let (input, errors) = BookInstanceInput::from_form(&form);
    if !errors.is_empty() {
        return form_page(&state, "Update BookInstance", &input, &errors).await;
    }

    let instance = Record::new(id, input.to_instance());
    if !state.catalog.instances.update_by_id(&instance).await? {
        return Err(AppError::not_found("Book copy not found"));
    }
    tracing::info!(id = %instance.id, status = %instance.data.status, "book copy updated");
    Ok(redirect(&EntityKind::BookInstance.url(&instance.id)))
}

pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(BookInstancesModule::new(state))
}
