//! State shared by every request handler.

use axum::response::{IntoResponse, Redirect, Response};
use catalog_db::{DocumentStore, Repository};
use catalog_http::{AppError, Views};
use std::sync::Arc;
use tera::Context;

use crate::modules::authors::models::Author;
use crate::modules::bookinstances::models::BookInstance;
use crate::modules::books::models::Book;
use crate::modules::genres::models::Genre;

/// One repository per entity collection, all over the same store.
#[derive(Clone)]
pub struct Catalog {
    pub authors: Repository<Author>,
    pub books: Repository<Book>,
    pub genres: Repository<Genre>,
    pub instances: Repository<BookInstance>,
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            authors: Repository::new(Arc::clone(&store)),
            books: Repository::new(Arc::clone(&store)),
            genres: Repository::new(Arc::clone(&store)),
            instances: Repository::new(store),
        }
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub views: Arc<Views>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, views: Arc<Views>) -> Self {
        Self {
            catalog: Catalog::new(store),
            views,
        }
    }

    pub fn render(&self, template: &str, context: &Context) -> Result<Response, AppError> {
        Ok(self.views.render(template, context)?.into_response())
    }
}

/// Post/redirect/get target after a successful mutation.
pub fn redirect(url: &str) -> Response {
    Redirect::to(url).into_response()
}
