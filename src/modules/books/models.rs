use catalog_db::{DocId, Document, Record};
use catalog_http::form::FormData;
use catalog_http::validation::{body, ValidationErrors, Validator};
use serde::{Deserialize, Serialize};

use crate::modules::authors::models::{Author, AuthorView};
use crate::modules::genres::models::{Genre, GenreView};
use crate::utils::EntityKind;

/// A title in the catalog. `author` and `genre` are references that may dangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: DocId,
    pub summary: String,
    pub isbn: String,
    #[serde(default)]
    pub genre: Vec<DocId>,
}

impl Document for Book {
    const COLLECTION: &'static str = "books";
}

#[derive(Debug, Clone, Serialize)]
pub struct BookView {
    pub id: String,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    /// `None` when not populated or when the reference dangles.
    pub author: Option<AuthorView>,
    pub genre: Vec<GenreView>,
}

impl BookView {
    /// The book's own fields only.
    pub fn plain(record: &Record<Book>) -> Self {
        let book = &record.data;
        Self {
            id: record.id.to_string(),
            url: EntityKind::Book.url(&record.id),
            title: book.title.clone(),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            author: None,
            genre: Vec::new(),
        }
    }

    /// Joined with its author and whichever genres still exist.
    pub fn populated(
        record: &Record<Book>,
        author: Option<&Record<Author>>,
        genres: &[Record<Genre>],
    ) -> Self {
        Self {
            author: author.map(AuthorView::from),
            genre: genres.iter().map(GenreView::from).collect(),
            ..Self::plain(record)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<String>,
}

impl BookInput {
    pub fn from_form(form: &FormData) -> (Self, ValidationErrors) {
        let mut v = Validator::new(form);
        let input = Self {
            title: v.field(
                body("title")
                    .trim()
                    .not_empty("Title must not be empty.")
                    .escape(),
            ),
            author: v.field(
                body("author")
                    .trim()
                    .not_empty("Author must not be empty.")
                    .escape(),
            ),
            summary: v.field(
                body("summary")
                    .trim()
                    .not_empty("Summary must not be empty.")
                    .escape(),
            ),
            isbn: v.field(
                body("isbn")
                    .trim()
                    .not_empty("ISBN must not be empty.")
                    .escape(),
            ),
            // Multi-select: a single value or many, always a list.
            genre: v.list(body("genre").escape()),
        };
        (input, v.finish())
    }

    pub fn to_book(&self) -> Book {
        Book {
            title: self.title.clone(),
            author: DocId::from(self.author.as_str()),
            summary: self.summary.clone(),
            isbn: self.isbn.clone(),
            genre: self.genre.iter().map(|id| DocId::from(id.as_str())).collect(),
        }
    }
}

impl From<&Book> for BookInput {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.to_string(),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            genre: book.genre.iter().map(DocId::to_string).collect(),
        }
    }
}
