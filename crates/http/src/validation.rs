//! Declarative per-field rule chains for form input.
//!
//! A chain is a list of rules applied in order to one field. Sanitizers
//! rewrite the value; checks leave it alone and record a message when they
//! fail. Every rule in a chain runs, so one field can report several
//! messages. Errors from all fields of a request are collected in order.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::form::FormData;

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub msg: String,
    /// Sanitized value at the time the check ran.
    pub value: String,
}

/// Ordered list of failed checks for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.0.iter().map(|error| error.msg.as_str()).collect()
    }

    pub fn push(&mut self, field: &str, msg: impl Into<String>, value: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            msg: msg.into(),
            value: value.into(),
        });
    }
}

/// A single step of a chain.
#[derive(Clone, Copy)]
pub enum Rule {
    Sanitize(fn(&str) -> String),
    Check(fn(&str) -> bool, &'static str),
}

impl Rule {
    /// Apply the rule: the (possibly rewritten) value, or the failure message.
    pub fn apply(&self, value: &str) -> Result<String, &'static str> {
        match self {
            Rule::Sanitize(sanitize) => Ok(sanitize(value)),
            Rule::Check(check, message) => {
                if check(value) {
                    Ok(value.to_string())
                } else {
                    Err(*message)
                }
            }
        }
    }
}

/// Rules for one form field.
#[derive(Clone)]
pub struct Chain {
    field: &'static str,
    optional: bool,
    rules: Vec<Rule>,
}

/// Start a chain for `field` of the request body.
pub fn body(field: &'static str) -> Chain {
    Chain {
        field,
        optional: false,
        rules: Vec::new(),
    }
}

impl Chain {
    /// Skip the whole chain when the value is absent or empty.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn trim(self) -> Self {
        self.rule(Rule::Sanitize(trim))
    }

    pub fn escape(self) -> Self {
        self.rule(Rule::Sanitize(escape))
    }

    pub fn not_empty(self, message: &'static str) -> Self {
        self.rule(Rule::Check(is_not_empty, message))
    }

    pub fn alphanumeric(self, message: &'static str) -> Self {
        self.rule(Rule::Check(is_alphanumeric, message))
    }

    pub fn iso8601(self, message: &'static str) -> Self {
        self.rule(Rule::Check(is_iso8601, message))
    }

    pub fn check(self, check: fn(&str) -> bool, message: &'static str) -> Self {
        self.rule(Rule::Check(check, message))
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Run the chain over `raw`, recording failures; returns the sanitized value.
    pub fn run(&self, raw: Option<&str>, errors: &mut ValidationErrors) -> String {
        let raw = raw.unwrap_or_default();
        if self.optional && raw.is_empty() {
            return String::new();
        }

        let mut value = raw.to_string();
        for rule in &self.rules {
            match rule.apply(&value) {
                Ok(next) => value = next,
                Err(message) => errors.push(self.field, message, value.as_str()),
            }
        }
        value
    }
}

/// Runs chains against one submitted form and accumulates their errors.
pub struct Validator<'a> {
    form: &'a FormData,
    errors: ValidationErrors,
}

impl<'a> Validator<'a> {
    pub fn new(form: &'a FormData) -> Self {
        Self {
            form,
            errors: ValidationErrors::default(),
        }
    }

    /// Sanitized value of a single-valued field.
    pub fn field(&mut self, chain: Chain) -> String {
        chain.run(self.form.get(chain.field), &mut self.errors)
    }

    /// Sanitized values of a field that may be submitted several times.
    /// An absent field yields an empty list.
    pub fn list(&mut self, chain: Chain) -> Vec<String> {
        self.form
            .all(chain.field)
            .into_iter()
            .map(|raw| chain.run(Some(raw), &mut self.errors))
            .collect()
    }

    pub fn finish(self) -> ValidationErrors {
        self.errors
    }
}

fn trim(value: &str) -> String {
    value.trim().to_string()
}

/// Replace `& < > " ' /`, backslash and backtick with HTML entities.
pub fn escape(value: &str) -> String {
    html_escape::encode_safe(value)
        .replace('\\', "&#x5C;")
        .replace('`', "&#96;")
}

fn is_not_empty(value: &str) -> bool {
    !value.is_empty()
}

fn is_alphanumeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_iso8601(value: &str) -> bool {
    parse_iso8601(value).is_some()
}

/// Parse an ISO 8601 calendar date or date-time, keeping the date part.
/// Reduced precision (`2020`, `2020-05`) means the first day of the period.
/// Returns `None` for empty or malformed input.
pub fn parse_iso8601(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }
    if let Some(datetime) = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    {
        return Some(datetime.date());
    }
    parse_reduced(value)
}

fn parse_reduced(value: &str) -> Option<NaiveDate> {
    let digits = |part: &str, len: usize| part.len() == len && part.bytes().all(|b| b.is_ascii_digit());
    match value.split_once('-') {
        None if digits(value, 4) => NaiveDate::from_ymd_opt(value.parse().ok()?, 1, 1),
        Some((year, month)) if digits(year, 4) && digits(month, 2) => {
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_chain() -> Chain {
        body("first_name")
            .trim()
            .not_empty("First name must be specified.")
            .escape()
            .alphanumeric("First name has non-alphanumeric characters.")
    }

    #[test]
    fn trims_and_passes_valid_input() {
        let form = FormData::from([("first_name", "  Jane ")]);
        let mut validator = Validator::new(&form);
        let value = validator.field(name_chain());
        assert_eq!(value, "Jane");
        assert!(validator.finish().is_empty());
    }

    #[test]
    fn every_rule_in_a_chain_reports() {
        let form = FormData::default();
        let mut validator = Validator::new(&form);
        validator.field(name_chain());
        let errors = validator.finish();
        assert_eq!(
            errors.messages(),
            vec![
                "First name must be specified.",
                "First name has non-alphanumeric characters."
            ]
        );
        assert!(errors.iter().all(|error| error.field == "first_name"));
    }

    #[test]
    fn escape_runs_before_later_checks() {
        let form = FormData::from([("first_name", "Ann & Co")]);
        let mut validator = Validator::new(&form);
        let value = validator.field(name_chain());
        assert_eq!(value, "Ann &amp; Co");
        assert_eq!(
            validator.finish().messages(),
            vec!["First name has non-alphanumeric characters."]
        );
    }

    #[test]
    fn escape_covers_backslash_and_backtick() {
        assert_eq!(
            escape(r#"<a href='x'>"C:\dir" `cmd`</a>"#),
            "&lt;a href=&#x27;x&#x27;&gt;&quot;C:&#x5C;dir&quot; &#96;cmd&#96;&lt;&#x2F;a&gt;"
        );
    }

    #[test]
    fn optional_chain_skips_empty_values() {
        let chain = || body("due_back").optional().iso8601("Invalid date");
        let form = FormData::from([("due_back", "")]);
        let mut validator = Validator::new(&form);
        assert_eq!(validator.field(chain()), "");
        assert!(validator.finish().is_empty());

        let form = FormData::from([("due_back", "31/12/2020")]);
        let mut validator = Validator::new(&form);
        validator.field(chain());
        assert_eq!(validator.finish().messages(), vec!["Invalid date"]);
    }

    #[test]
    fn list_fields_default_to_empty() {
        let form = FormData::from([("title", "Emma")]);
        let mut validator = Validator::new(&form);
        assert!(validator.list(body("genre").escape()).is_empty());

        let form = FormData::from([("genre", "a"), ("genre", "<b>")]);
        let mut validator = Validator::new(&form);
        assert_eq!(
            validator.list(body("genre").escape()),
            vec!["a".to_string(), "&lt;b&gt;".to_string()]
        );
    }

    #[test]
    fn iso8601_accepts_dates_and_datetimes() {
        let expected = NaiveDate::from_ymd_opt(1775, 12, 16).unwrap();
        assert_eq!(parse_iso8601("1775-12-16"), Some(expected));
        assert_eq!(parse_iso8601("1775-12-16T10:30:00Z"), Some(expected));
        assert_eq!(parse_iso8601("1775-12-16T10:30"), Some(expected));
        assert_eq!(parse_iso8601("1775-13-01"), None);
        assert_eq!(parse_iso8601("1775"), NaiveDate::from_ymd_opt(1775, 1, 1));
        assert_eq!(parse_iso8601("1775-12"), NaiveDate::from_ymd_opt(1775, 12, 1));
        assert_eq!(parse_iso8601("1775-13"), None);
        assert_eq!(parse_iso8601("17751"), None);
        assert_eq!(parse_iso8601("yesterday"), None);
        assert_eq!(parse_iso8601(""), None);
    }

    #[test]
    fn rules_are_plain_functions() {
        let check = Rule::Check(is_not_empty, "required");
        assert_eq!(check.apply(""), Err("required"));
        assert_eq!(check.apply("x"), Ok("x".to_string()));
        assert_eq!(Rule::Sanitize(trim).apply(" x "), Ok("x".to_string()));
    }
}
