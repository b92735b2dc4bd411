use catalog_db::{Document, Record};
use catalog_http::form::FormData;
use catalog_http::validation::{body, ValidationErrors, Validator};
use serde::{Deserialize, Serialize};

use crate::utils::EntityKind;

/// A book category. Names are unique by convention only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub name: String,
}

impl Document for Genre {
    const COLLECTION: &'static str = "genres";
}

#[derive(Debug, Clone, Serialize)]
pub struct GenreView {
    pub id: String,
    pub url: String,
    pub name: String,
    /// Pre-selects the genre in the book form.
    pub checked: bool,
}

impl From<&Record<Genre>> for GenreView {
    fn from(record: &Record<Genre>) -> Self {
        Self {
            id: record.id.to_string(),
            url: EntityKind::Genre.url(&record.id),
            name: record.data.name.clone(),
            checked: false,
        }
    }
}

/// Genre checkboxes for the book form, ticking every id in `selected`.
pub fn genre_choices<S: AsRef<str>>(genres: &[Record<Genre>], selected: &[S]) -> Vec<GenreView> {
    genres
        .iter()
        .map(|record| {
            let mut view = GenreView::from(record);
            view.checked = selected.iter().any(|id| id.as_ref() == view.id);
            view
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenreInput {
    pub name: String,
}

impl GenreInput {
    pub fn from_form(form: &FormData) -> (Self, ValidationErrors) {
        let mut v = Validator::new(form);
        let input = Self {
            name: v.field(
                body("name")
                    .trim()
                    .not_empty("Genre name required")
                    .escape(),
            ),
        };
        (input, v.finish())
    }

    pub fn to_genre(&self) -> Genre {
        Genre {
            name: self.name.clone(),
        }
    }
}

impl From<&Genre> for GenreInput {
    fn from(genre: &Genre) -> Self {
        Self {
            name: genre.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_db::DocId;

    #[test]
    fn blank_name_is_rejected() {
        let (input, errors) = GenreInput::from_form(&FormData::from([("name", "   ")]));
        assert_eq!(errors.messages(), vec!["Genre name required"]);
        assert_eq!(input.name, "");
    }

    #[test]
    fn name_is_trimmed_and_escaped() {
        let (input, errors) = GenreInput::from_form(&FormData::from([("name", " Sci-Fi & Fantasy ")]));
        assert!(errors.is_empty());
        assert_eq!(input.to_genre().name, "Sci-Fi &amp; Fantasy");
    }

    #[test]
    fn choices_mark_selected_genres() {
        let genres = vec![
            Record::new(DocId::from("g1"), Genre { name: "Poetry".to_string() }),
            Record::new(DocId::from("g2"), Genre { name: "Drama".to_string() }),
        ];
        let choices = genre_choices(&genres, &["g2".to_string()]);
        assert!(!choices[0].checked);
        assert!(choices[1].checked);
        assert_eq!(choices[1].url, "/catalog/genre/g2");
    }
}
