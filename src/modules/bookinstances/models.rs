use catalog_db::{DocId, Document, Record};
use catalog_http::form::FormData;
use catalog_http::validation::{body, parse_iso8601, ValidationErrors, Validator};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::modules::books::models::{Book, BookView};
use crate::utils::{format_date, input_date, EntityKind};

const STATUS_MESSAGE: &str = "Status must be one of Available, Maintenance, Loaned, Reserved.";

/// Lending state of a physical copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    Available,
    #[default]
    Maintenance,
    Loaned,
    Reserved,
}

impl Status {
    /// Order used by the form's select box.
    pub const ALL: [Status; 4] = [
        Status::Maintenance,
        Status::Available,
        Status::Loaned,
        Status::Reserved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Available => "Available",
            Status::Maintenance => "Maintenance",
            Status::Loaned => "Loaned",
            Status::Reserved => "Reserved",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| format!("unknown status '{value}'"))
    }
}

fn is_status_or_empty(value: &str) -> bool {
    value.is_empty() || value.parse::<Status>().is_ok()
}

/// A physical copy of a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookInstance {
    pub book: DocId,
    pub imprint: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub due_back: Option<NaiveDate>,
}

impl Document for BookInstance {
    const COLLECTION: &'static str = "bookinstances";
}

#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceView {
    pub id: String,
    pub url: String,
    pub imprint: String,
    pub status: String,
    pub due_back: String,
    pub due_back_formatted: String,
    /// `None` when not populated or when the book is gone.
    pub book: Option<BookView>,
}

impl BookInstanceView {
    pub fn plain(record: &Record<BookInstance>) -> Self {
        let instance = &record.data;
        Self {
            id: record.id.to_string(),
            url: EntityKind::BookInstance.url(&record.id),
            imprint: instance.imprint.clone(),
            status: instance.status.to_string(),
            due_back: input_date(instance.due_back),
            due_back_formatted: format_date(instance.due_back),
            book: None,
        }
    }

    pub fn populated(record: &Record<BookInstance>, book: Option<&Record<Book>>) -> Self {
        Self {
            book: book.map(BookView::plain),
            ..Self::plain(record)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookInstanceInput {
    pub book: String,
    pub imprint: String,
    pub status: String,
    pub due_back: String,
}

impl BookInstanceInput {
    pub fn from_form(form: &FormData) -> (Self, ValidationErrors) {
        let mut v = Validator::new(form);
        let input = Self {
            book: v.field(
                body("book")
                    .trim()
                    .not_empty("Book must be specified")
                    .escape(),
            ),
            imprint: v.field(
                body("imprint")
                    .trim()
                    .not_empty("Imprint must be specified")
                    .escape(),
            ),
            status: v.field(body("status").escape().check(is_status_or_empty, STATUS_MESSAGE)),
            due_back: v.field(
                body("due_back")
                    .optional()
                    .iso8601("Invalid date")
                    .escape(),
            ),
        };
        (input, v.finish())
    }

    /// Empty status means `Maintenance`; empty due date means today.
    pub fn to_instance(&self) -> BookInstance {
        BookInstance {
            book: DocId::from(self.book.as_str()),
            imprint: self.imprint.clone(),
            status: self.status.parse().unwrap_or_default(),
            due_back: parse_iso8601(&self.due_back).or_else(|| Some(Utc::now().date_naive())),
        }
    }
}

impl From<&BookInstance> for BookInstanceInput {
    fn from(instance: &BookInstance) -> Self {
        Self {
            book: instance.book.to_string(),
            imprint: instance.imprint.clone(),
            status: instance.status.to_string(),
            due_back: input_date(instance.due_back),
        }
    }
}
