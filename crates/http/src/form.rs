//! URL-encoded form bodies that keep repeated keys.

use axum::{
    extract::{FromRequest, Request},
    Form,
};
use catalog_db::DocId;

use crate::error::AppError;

/// Submitted form fields in arrival order. Multi-selects arrive as repeated keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData(Vec<(String, String)>);

impl FormData {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// First value submitted for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == field)
            .map(|(_, value)| value.as_str())
    }

    /// Every value submitted for `field`, in order; empty when absent.
    pub fn all(&self, field: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(key, _)| key == field)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Identifier carried in a hidden field, e.g. the delete form's `authorid`.
    pub fn require_id(&self, field: &str) -> Result<DocId, AppError> {
        match self.get(field).map(str::trim) {
            Some(id) if !id.is_empty() => Ok(DocId::from(id)),
            _ => Err(AppError::bad_request(format!("Missing field '{field}'"))),
        }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for FormData {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        Ok(Self(pairs))
    }
}
