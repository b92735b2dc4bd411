pub mod models;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use catalog_db::{DocId, Filter, Query, Record, StoreResult};
use catalog_http::{validation::ValidationErrors, AppError, FormData};
use catalog_kernel::{InitCtx, Module};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tera::Context;

use crate::modules::authors::models::{Author, AuthorView};
use crate::modules::bookinstances::models::{BookInstance, BookInstanceView};
use crate::modules::genres::models::{genre_choices, Genre};
use crate::state::{redirect, AppState, Catalog};
use crate::utils::EntityKind;
use models::{Book, BookInput, BookView};

/// Books module
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/books", get(book_list))
            .route("/book/create", get(book_create_get).post(book_create_post))
            .route("/book/{id}", get(book_detail))
            .route(
                "/book/{id}/delete",
                get(book_delete_get).post(book_delete_post),
            )
            .route(
                "/book/{id}/update",
                get(book_update_get).post(book_update_post),
            )
            .with_state(self.state.clone())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Join each book with its author. Each distinct author is fetched once.
async fn with_authors(catalog: &Catalog, books: &[Record<Book>]) -> Result<Vec<BookView>, AppError> {
    let mut seen = HashSet::new();
    let ids: Vec<DocId> = books
        .iter()
        .map(|book| book.data.author.clone())
        .filter(|id| seen.insert(id.clone()))
        .collect();

    let authors: HashMap<DocId, _> = catalog
        .authors
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|author| (author.id.clone(), author))
        .collect();

    Ok(books
        .iter()
        .map(|book| BookView::populated(book, authors.get(&book.data.author), &[]))
        .collect())
}

/// Join one book with its author and whichever of its genres still exist.
async fn populate(catalog: &Catalog, book: &Record<Book>) -> Result<BookView, AppError> {
    let (author, genres) = tokio::try_join!(
        catalog.authors.find_by_id(&book.data.author),
        catalog.genres.find_by_ids(&book.data.genre),
    )?;
    Ok(BookView::populated(book, author.as_ref(), &genres))
}

async fn book_and_instances(
    state: &AppState,
    id: &DocId,
) -> Result<(Option<Record<Book>>, Vec<Record<BookInstance>>), AppError> {
    let catalog = &state.catalog;
    let (book, instances) = tokio::try_join!(
        catalog.books.find_by_id(id),
        catalog
            .instances
            .find_many(Query::filter(Filter::eq("book", id.as_str()))),
    )?;
    Ok((book, instances))
}

fn instance_views(instances: &[Record<BookInstance>]) -> Vec<BookInstanceView> {
    instances.iter().map(BookInstanceView::plain).collect()
}

/// Author candidates by family name and genre candidates by name.
async fn choices(
    catalog: &Catalog,
) -> StoreResult<(Vec<Record<Author>>, Vec<Record<Genre>>)> {
    tokio::try_join!(
        catalog.authors.find_many(Query::all().sort_by("family_name")),
        catalog.genres.find_many(Query::all().sort_by("name")),
    )
}

/// Render the book form. Author and genre choices are re-fetched every time.
async fn form_page(
    state: &AppState,
    title: &str,
    input: &BookInput,
    errors: &ValidationErrors,
) -> Result<Response, AppError> {
    let (authors, genres) = choices(&state.catalog).await?;
    render_form(state, title, input, &authors, &genres, errors)
}

fn render_form(
    state: &AppState,
    title: &str,
    input: &BookInput,
    authors: &[Record<Author>],
    genres: &[Record<Genre>],
    errors: &ValidationErrors,
) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("book", input);
    context.insert(
        "authors",
        &authors.iter().map(AuthorView::from).collect::<Vec<_>>(),
    );
    context.insert("genres", &genre_choices(genres, &input.genre));
    context.insert("errors", errors);
    state.render("book_form.html", &context)
}

fn delete_page(
    state: &AppState,
    book: Option<&Record<Book>>,
    instances: &[Record<BookInstance>],
) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("title", "Delete Book");
    context.insert("book", &book.map(BookView::plain));
    context.insert("book_instances", &instance_views(instances));
    state.render("book_delete.html", &context)
}

async fn book_list(State(state): State<AppState>) -> Result<Response, AppError> {
    let books = state
        .catalog
        .books
        .find_many(Query::all().sort_by("title"))
        .await?;

    let mut context = Context::new();
    context.insert("title", "Book List");
    context.insert("book_list", &with_authors(&state.catalog, &books).await?);
    state.render("book_list.html", &context)
}

async fn book_detail(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
) -> Result<Response, AppError> {
    let (book, instances) = book_and_instances(&state, &id).await?;
    let book = book.ok_or_else(|| AppError::not_found("Book not found"))?;
    let view = populate(&state.catalog, &book).await?;

    let mut context = Context::new();
    context.insert("title", &view.title);
    context.insert("book", &view);
    context.insert("book_instances", &instance_views(&instances));
    state.render("book_detail.html", &context)
}

async fn book_create_get(State(state): State<AppState>) -> Result<Response, AppError> {
    form_page(
        &state,
        "Create Book",
        &BookInput::default(),
        &ValidationErrors::default(),
    )
    .await
}

async fn book_create_post(
    State(state): State<AppState>,
    form: FormData,
) -> Result<Response, AppError> {
    let (input, errors) = BookInput::from_form(&form);
    if !errors.is_empty() {
        return form_page(&state, "Create Book", &input, &errors).await;
    }

    let book = state.catalog.books.save(input.to_book()).await?;
    tracing::info!(id = %book.id, "book created");
    Ok(redirect(&EntityKind::Book.url(&book.id)))
}

async fn book_delete_get(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
) -> Result<Response, AppError> {
    let (book, instances) = book_and_instances(&state, &id).await?;
    match book {
        Some(book) => delete_page(&state, Some(&book), &instances),
        None => Ok(redirect(&EntityKind::Book.list_url())),
    }
}

async fn book_delete_post(
    State(state): State<AppState>,
    form: FormData,
) -> Result<Response, AppError> {
    let id = form.require_id("bookid")?;
    let (book, instances) = book_and_instances(&state, &id).await?;
    if !instances.is_empty() {
        tracing::info!(id = %id, dependents = instances.len(), "book delete blocked");
        return delete_page(&state, book.as_ref(), &instances);
    }

    let deleted = state.catalog.books.delete_by_id(&id).await?;
    tracing::info!(id = %id, deleted, "book deleted");
    Ok(redirect(&EntityKind::Book.list_url()))
}

/// The book and both candidate lists are fetched together.
async fn book_update_get(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
) -> Result<Response, AppError> {
    let (book, (authors, genres)) = tokio::try_join!(
        state.catalog.books.find_by_id(&id),
        choices(&state.catalog),
    )?;
    let book = book.ok_or_else(|| AppError::not_found("Book not found"))?;

    render_form(
        &state,
        "Update Book",
        &BookInput::from(&book.data),
        &authors,
        &genres,
        &ValidationErrors::default(),
    )
}

async fn book_update_post(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
    form: FormData,
) -> Result<Response, AppError> {
    let (input, errors) = BookInput::from_form(&form);
    if !errors.is_empty() {
        return form_page(&state, "Update Book", &input, &errors).await;
    }

    let book = Record::new(id, input.to_book());
    if !state.catalog.books.update_by_id(&book).await? {
        return Err(AppError::not_found("Book not found"));
    }
    tracing::info!(id = %book.id, "book updated");
    Ok(redirect(&EntityKind::Book.url(&book.id)))
}

/// Create a new instance of the books module
pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(state))
}
