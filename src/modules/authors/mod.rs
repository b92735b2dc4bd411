pub mod models;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use catalog_db::{DocId, Filter, Query, Record};
use catalog_http::{validation::ValidationErrors, AppError, FormData};
use catalog_kernel::{InitCtx, Module};
use std::sync::Arc;
use tera::Context;

use crate::modules::books::models::{Book, BookView};
use crate::state::{redirect, AppState};
use crate::utils::EntityKind;
use models::{Author, AuthorInput, AuthorView};

/// Authors module: list, detail and the create/update/delete forms.
pub struct AuthorsModule {
    state: AppState,
}

impl AuthorsModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "authors module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/authors", get(author_list))
            .route(
                "/author/create",
                get(author_create_get).post(author_create_post),
            )
            .route("/author/{id}", get(author_detail))
            .route(
                "/author/{id}/delete",
                get(author_delete_get).post(author_delete_post),
            )
            .route(
                "/author/{id}/update",
                get(author_update_get).post(author_update_post),
            )
            .with_state(self.state.clone())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module stopped");
        Ok(())
    }
}

/// The author (if any) and every book that references it.
async fn author_and_books(
    state: &AppState,
    id: &DocId,
) -> Result<(Option<Record<Author>>, Vec<Record<Book>>), AppError> {
    let catalog = &state.catalog;
    let (author, books) = tokio::try_join!(
        catalog.authors.find_by_id(id),
        catalog
            .books
            .find_many(Query::filter(Filter::eq("author", id.as_str()))),
    )?;
    Ok((author, books))
}

fn book_views(books: &[Record<Book>]) -> Vec<BookView> {
    books.iter().map(BookView::plain).collect()
}

fn form_page(
    state: &AppState,
    title: &str,
    input: &AuthorInput,
    errors: &ValidationErrors,
) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("author", input);
    context.insert("errors", errors);
    state.render("author_form.html", &context)
}

fn delete_page(
    state: &AppState,
    author: Option<&Record<Author>>,
    books: &[Record<Book>],
) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("title", "Delete Author");
    context.insert("author", &author.map(AuthorView::from));
    context.insert("author_books", &book_views(books));
    state.render("author_delete.html", &context)
}

async fn author_list(State(state): State<AppState>) -> Result<Response, AppError> {
    let authors = state
        .catalog
        .authors
        .find_many(Query::all().sort_by("family_name"))
        .await?;

    let mut context = Context::new();
    context.insert("title", "Author List");
    context.insert(
        "author_list",
        &authors.iter().map(AuthorView::from).collect::<Vec<_>>(),
    );
    state.render("author_list.html", &context)
}

async fn author_detail(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
) -> Result<Response, AppError> {
    let (author, books) = author_and_books(&state, &id).await?;
    let author = author.ok_or_else(|| AppError::not_found("Author not found"))?;

    let mut context = Context::new();
    context.insert("title", "Author Detail");
    context.insert("author", &AuthorView::from(&author));
    context.insert("author_books", &book_views(&books));
    state.render("author_detail.html", &context)
}

async fn author_create_get(State(state): State<AppState>) -> Result<Response, AppError> {
    form_page(
        &state,
        "Create Author",
        &AuthorInput::default(),
        &ValidationErrors::default(),
    )
}

async fn author_create_post(
    State(state): State<AppState>,
    form: FormData,
) -> Result<Response, AppError> {
    let (input, errors) = AuthorInput::from_form(&form);
    if !errors.is_empty() {
        return form_page(&state, "Create Author", &input, &errors);
    }

    let author = state.catalog.authors.save(input.to_author()).await?;
    tracing::info!(id = %author.id, "author created");
    Ok(redirect(&EntityKind::Author.url(&author.id)))
}

async fn author_delete_get(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
) -> Result<Response, AppError> {
    let (author, books) = author_and_books(&state, &id).await?;
    match author {
        Some(author) => delete_page(&state, Some(&author), &books),
        None => Ok(redirect(&EntityKind::Author.list_url())),
    }
}

async fn author_delete_post(
    State(state): State<AppState>,
    form: FormData,
) -> Result<Response, AppError> {
    let id = form.require_id("authorid")?;
    let (author, books) = author_and_books(&state, &id).await?;
    if !books.is_empty() {
        tracing::info!(id = %id, dependents = books.len(), "author delete blocked");
        return delete_page(&state, author.as_ref(), &books);
    }

    let deleted = state.catalog.authors.delete_by_id(&id).await?;
    tracing::info!(id = %id, deleted, "author deleted");
    Ok(redirect(&EntityKind::Author.list_url()))
}

async fn author_update_get(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
) -> Result<Response, AppError> {
    let author = state
        .catalog
        .authors
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Author not found"))?;

    form_page(
        &state,
        "Update Author",
        &AuthorInput::from(&author.data),
        &ValidationErrors::default(),
    )
}

async fn author_update_post(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
    form: FormData,
) -> Result<Response, AppError> {
    let (input, errors) = AuthorInput::from_form(&form);
    if !errors.is_empty() {
        return form_page(&state, "Update Author", &input, &errors);
    }

    let author = Record::new(id, input.to_author());
    if !state.catalog.authors.update_by_id(&author).await? {
        return Err(AppError::not_found("Author not found"));
    }
    tracing::info!(id = %author.id, "author updated");
    Ok(redirect(&EntityKind::Author.url(&author.id)))
}

/// Create a new instance of the authors module
pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(AuthorsModule::new(state))
}
