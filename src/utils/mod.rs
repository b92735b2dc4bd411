//! Canonical URLs and display formatting shared by the entity modules.

use catalog_db::DocId;
use catalog_http::router::CATALOG_PREFIX;
use chrono::NaiveDate;

/// The four catalog entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Author,
    Book,
    Genre,
    BookInstance,
}

impl EntityKind {
    /// Path segment used for a single entity.
    pub fn slug(self) -> &'static str {
        match self {
            EntityKind::Author => "author",
            EntityKind::Book => "book",
            EntityKind::Genre => "genre",
            EntityKind::BookInstance => "bookinstance",
        }
    }

    /// Canonical detail URL, e.g. `/catalog/author/<id>`.
    pub fn url(self, id: &DocId) -> String {
        format!("{}/{}/{}", CATALOG_PREFIX, self.slug(), id)
    }

    /// List page URL, e.g. `/catalog/authors`.
    pub fn list_url(self) -> String {
        format!("{}/{}s", CATALOG_PREFIX, self.slug())
    }
}

/// Medium date format used on pages, e.g. `Dec 16, 1775`.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

/// Value for an `<input type="date">`.
pub fn input_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
