//! Error handling for the catalog HTTP layer.
//!
//! Controller operations return `Result<_, AppError>`; the `IntoResponse`
//! impl below is the one place that maps error kinds to a status code and
//! an HTML error page.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use catalog_db::StoreError;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Store(_) | AppError::Template(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::now_v7();
        let timestamp = Utc::now().to_rfc3339();
        let status = self.status();

        let message = match &self {
            AppError::NotFound { message } | AppError::BadRequest { message } => message.clone(),
            AppError::Template(e) => format!("{e}: {}", source_chain(e)),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                error = %message,
                "request failed"
            );
        } else {
            tracing::warn!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                error = %message,
                "request rejected"
            );
        }

        // Release builds do not leak backend details.
        let message = if cfg!(not(debug_assertions)) && status.is_server_error() {
            "An internal server error occurred".to_string()
        } else {
            message
        };

        (
            status,
            Html(error_page(status, &message, &error_id, &timestamp)),
        )
            .into_response()
    }
}

fn source_chain(error: &dyn std::error::Error) -> String {
    let mut parts = Vec::new();
    let mut source = error.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

fn error_page(status: StatusCode, message: &str, error_id: &Uuid, timestamp: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{code} {reason}</title></head>
<body>
  <h1>{message}</h1>
  <h2>{code} {reason}</h2>
  <p><a href="/catalog">Back to the catalog</a></p>
  <p><small>Reference {error_id} at {timestamp}</small></p>
</body>
</html>
"#,
        code = status.as_u16(),
        reason = reason,
        message = html_escape::encode_text(message),
        error_id = error_id,
        timestamp = timestamp,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn not_found_renders_html_page() {
        let response = AppError::not_found("Author not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()["content-type"],
            "text/html; charset=utf-8"
        );

        let body = body_text(response).await;
        assert!(body.contains("<h1>Author not found</h1>"));
        assert!(body.contains("404 Not Found"));
    }

    #[tokio::test]
    async fn messages_are_escaped() {
        let response = AppError::bad_request("<script>").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_text(response).await;
        assert!(body.contains("&lt;script&gt;"));
        assert!(!body.contains("<script>"));
    }

    #[test]
    fn test_internal_error_mapping() {
        let error = AppError::Internal(anyhow::anyhow!("Database connection failed"));
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_errors_are_server_errors() {
        let error: AppError = StoreError::InvalidField("x y".to_string()).into();
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
