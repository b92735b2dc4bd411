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
use models::{Genre, GenreInput, GenreView};

/// Genres module
pub struct GenresModule {
    state: AppState,
}

impl GenresModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for GenresModule {
    fn name(&self) -> &'static str {
        "genres"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "genres module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/genres", get(genre_list))
            .route("/genre/create", get(genre_create_get).post(genre_create_post))
            .route("/genre/{id}", get(genre_detail))
            .route(
                "/genre/{id}/delete",
                get(genre_delete_get).post(genre_delete_post),
            )
            .route(
                "/genre/{id}/update",
                get(genre_update_get).post(genre_update_post),
            )
            .with_state(self.state.clone())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "genres module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "genres module stopped");
        Ok(())
    }
}

/// The genre (if any) and the books tagged with it, by title.
async fn genre_and_books(
    state: &AppState,
    id: &DocId,
) -> Result<(Option<Record<Genre>>, Vec<Record<Book>>), AppError> {
    let catalog = &state.catalog;
    let (genre, books) = tokio::try_join!(
        catalog.genres.find_by_id(id),
        catalog
            .books
            .find_many(Query::filter(Filter::eq("genre", id.as_str())).sort_by("title")),
    )?;
    Ok((genre, books))
}

fn book_views(books: &[Record<Book>]) -> Vec<BookView> {
    books.iter().map(BookView::plain).collect()
}

fn form_page(
    state: &AppState,
    title: &str,
    input: &GenreInput,
    errors: &ValidationErrors,
) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("genre", input);
    context.insert("errors", errors);
    state.render("genre_form.html", &context)
}

fn delete_page(
    state: &AppState,
    genre: Option<&Record<Genre>>,
    books: &[Record<Book>],
) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("title", "Delete Genre");
    context.insert("genre", &genre.map(GenreView::from));
    context.insert("genre_books", &book_views(books));
    state.render("genre_delete.html", &context)
}

async fn genre_list(State(state): State<AppState>) -> Result<Response, AppError> {
    let genres = state
        .catalog
        .genres
        .find_many(Query::all().sort_by("name"))
        .await?;

    let mut context = Context::new();
    context.insert("title", "Genre List");
    context.insert(
        "genre_list",
        &genres.iter().map(GenreView::from).collect::<Vec<_>>(),
    );
    state.render("genre_list.html", &context)
}

async fn genre_detail(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
) -> Result<Response, AppError> {
    let (genre, books) = genre_and_books(&state, &id).await?;
    let genre = genre.ok_or_else(|| AppError::not_found("Genre not found"))?;

    let mut context = Context::new();
    context.insert("title", "Genre Detail");
    context.insert("genre", &GenreView::from(&genre));
    context.insert("genre_books", &book_views(&books));
    state.render("genre_detail.html", &context)
}

async fn genre_create_get(State(state): State<AppState>) -> Result<Response, AppError> {
    form_page(
        &state,
        "Create Genre",
        &GenreInput::default(),
        &ValidationErrors::default(),
    )
}

/// Creating a genre whose name already exists leads to the existing one.
async fn genre_create_post(
    State(state): State<AppState>,
    form: FormData,
) -> Result<Response, AppError> {
    let (input, errors) = GenreInput::from_form(&form);
    if !errors.is_empty() {
        return form_page(&state, "Create Genre", &input, &errors);
    }

    let genres = &state.catalog.genres;
    if let Some(existing) = genres.find_one(Filter::eq("name", input.name.as_str())).await? {
        tracing::debug!(id = %existing.id, "genre already exists");
        return Ok(redirect(&EntityKind::Genre.url(&existing.id)));
    }

    let genre = genres.save(input.to_genre()).await?;
    tracing::info!(id = %genre.id, "genre created");
    Ok(redirect(&EntityKind::Genre.url(&genre.id)))
}

async fn genre_delete_get(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
) -> Result<Response, AppError> {
    let (genre, books) = genre_and_books(&state, &id).await?;
    match genre {
        Some(genre) => delete_page(&state, Some(&genre), &books),
        None => Ok(redirect(&EntityKind::Genre.list_url())),
    }
}

async fn genre_delete_post(
    State(state): State<AppState>,
    form: FormData,
) -> Result<Response, AppError> {
    let id = form.require_id("genreid")?;
    let (genre, books) = genre_and_books(&state, &id).await?;
    if !books.is_empty() {
        tracing::info!(id = %id, dependents = books.len(), "genre delete blocked");
        return delete_page(&state, genre.as_ref(), &books);
    }

    let deleted = state.catalog.genres.delete_by_id(&id).await?;
    tracing::info!(id = %id, deleted, "genre deleted");
    Ok(redirect(&EntityKind::Genre.list_url()))
}

async fn genre_update_get(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
) -> Result<Response, AppError> {
    let genre = state
        .catalog
        .genres
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Genre not found"))?;

    form_page(
        &state,
        "Update Genre",
        &GenreInput::from(&genre.data),
        &ValidationErrors::default(),
    )
}

async fn genre_update_post(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
    form: FormData,
) -> Result<Response, AppError> {
    let (input, errors) = GenreInput::from_form(&form);
    if !errors.is_empty() {
        return form_page(&state, "Update Genre", &input, &errors);
    }

    let genre = Record::new(id, input.to_genre());
    if !state.catalog.genres.update_by_id(&genre).await? {
        return Err(AppError::not_found("Genre not found"));
    }
    tracing::info!(id = %genre.id, "genre updated");
    Ok(redirect(&EntityKind::Genre.url(&genre.id)))
}

pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(GenresModule::new(state))
}
