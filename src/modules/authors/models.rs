use catalog_db::{Document, Record};
use catalog_http::form::FormData;
use catalog_http::validation::{body, parse_iso8601, ValidationErrors, Validator};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::{format_date, input_date, EntityKind};

/// A person who wrote one or more books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub first_name: String,
    pub family_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub date_of_death: Option<NaiveDate>,
}

impl Document for Author {
    const COLLECTION: &'static str = "authors";
}

impl Author {
    /// "family_name, first_name", or empty when either part is missing.
    pub fn name(&self) -> String {
        if self.first_name.is_empty() || self.family_name.is_empty() {
            return String::new();
        }
        format!("{}, {}", self.family_name, self.first_name)
    }

    pub fn lifespan(&self) -> String {
        format!(
            "{} - {}",
            format_date(self.date_of_birth),
            format_date(self.date_of_death)
        )
        .trim()
        .to_string()
    }
}

/// Author as rendered in pages.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorView {
    pub id: String,
    pub url: String,
    pub name: String,
    pub first_name: String,
    pub family_name: String,
    pub lifespan: String,
    pub date_of_birth: String,
    pub date_of_death: String,
}

impl From<&Record<Author>> for AuthorView {
    fn from(record: &Record<Author>) -> Self {
        let author = &record.data;
        Self {
            id: record.id.to_string(),
            url: EntityKind::Author.url(&record.id),
            name: author.name(),
            first_name: author.first_name.clone(),
            family_name: author.family_name.clone(),
            lifespan: author.lifespan(),
            date_of_birth: format_date(author.date_of_birth),
            date_of_death: format_date(author.date_of_death),
        }
    }
}

/// Sanitized form values, echoed back when the form is shown again.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthorInput {
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: String,
    pub date_of_death: String,
}

impl AuthorInput {
    pub fn from_form(form: &FormData) -> (Self, ValidationErrors) {
        let mut v = Validator::new(form);
        let input = Self {
            first_name: v.field(
                body("first_name")
                    .trim()
                    .not_empty("First name must be specified.")
                    .escape()
                    .alphanumeric("First name has non-alphanumeric characters."),
            ),
            family_name: v.field(
                body("family_name")
                    .trim()
                    .not_empty("Family name must be specified.")
                    .escape()
                    .alphanumeric("Family name has non-alphanumeric characters."),
            ),
            date_of_birth: v.field(
                body("date_of_birth")
                    .optional()
                    .iso8601("Invalid date of birth")
                    .escape(),
            ),
            date_of_death: v.field(
                body("date_of_death")
                    .optional()
                    .iso8601("Invalid date of death")
                    .escape(),
            ),
        };
        (input, v.finish())
    }

    /// Only meaningful once validation passed.
    pub fn to_author(&self) -> Author {
        Author {
            first_name: self.first_name.clone(),
            family_name: self.family_name.clone(),
            date_of_birth: parse_iso8601(&self.date_of_birth),
            date_of_death: parse_iso8601(&self.date_of_death),
        }
    }
}

impl From<&Author> for AuthorInput {
    fn from(author: &Author) -> Self {
        Self {
            first_name: author.first_name.clone(),
            family_name: author.family_name.clone(),
            date_of_birth: input_date(author.date_of_birth),
            date_of_death: input_date(author.date_of_death),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_db::DocId;

    #[test]
    fn valid_form_is_trimmed() {
        let form = FormData::from([
            ("first_name", "Jane "),
            ("family_name", " Austen"),
            ("date_of_birth", "1775-12-16"),
            ("date_of_death", ""),
        ]);
        let (input, errors) = AuthorInput::from_form(&form);
        assert!(errors.is_empty());

        let author = input.to_author();
        assert_eq!(author.first_name, "Jane");
        assert_eq!(author.family_name, "Austen");
        assert_eq!(author.date_of_birth, NaiveDate::from_ymd_opt(1775, 12, 16));
        assert_eq!(author.date_of_death, None);
    }

    #[test]
    fn bad_dates_and_names_are_reported_in_field_order() {
        let form = FormData::from([
            ("first_name", "J@ne"),
            ("family_name", "Austen"),
            ("date_of_birth", "sometime"),
            ("date_of_death", "1817-07-18"),
        ]);
        let (input, errors) = AuthorInput::from_form(&form);
        assert_eq!(
            errors.messages(),
            vec![
                "First name has non-alphanumeric characters.",
                "Invalid date of birth"
            ]
        );
        assert_eq!(input.date_of_birth, "sometime");
    }

    #[test]
    fn derived_name_and_lifespan() {
        let author = Author {
            first_name: "Jane".to_string(),
            family_name: "Austen".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1775, 12, 16),
            date_of_death: NaiveDate::from_ymd_opt(1817, 7, 18),
        };
        assert_eq!(author.name(), "Austen, Jane");
        assert_eq!(author.lifespan(), "Dec 16, 1775 - Jul 18, 1817");

        let view = AuthorView::from(&Record::new(DocId::from("a1"), author));
        assert_eq!(view.url, "/catalog/author/a1");

        let unnamed = Author {
            first_name: String::new(),
            family_name: "Austen".to_string(),
            date_of_birth: None,
            date_of_death: None,
        };
        assert_eq!(unnamed.name(), "");
        assert_eq!(unnamed.lifespan(), "-");
    }
}
