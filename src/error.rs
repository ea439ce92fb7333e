//! Error types for the back-office API.
//!
//! Every failure a handler can produce is an [`AppError`]; the HTTP status
//! and the `{error, details?}` body are derived from the variant.

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::routes::ErrorResponse;

/// A single offending input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authorization required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("Missing or invalid fields")]
    Validation(Vec<FieldError>),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("File too large. Maximum size is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Request body too large")]
    BodyTooLarge,

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Current password is incorrect")]
    InvalidCredentials,

    #[error("Invalid email or password")]
    LoginFailed,

    #[error("Timed out during {0}")]
    Timeout(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::LoginFailed => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) | AppError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge { .. } | AppError::BodyTooLarge => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Names of the fields rejected by validation, empty for other variants.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            AppError::Validation(errors) => errors.iter().map(|e| e.field.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    fn to_body(&self) -> ErrorResponse {
        match self {
            AppError::Validation(errors) => ErrorResponse {
                error: self.to_string(),
                details: Some(
                    errors
                        .iter()
                        .map(|e| format!("{}: {}", e.field, e.message))
                        .collect::<Vec<_>>()
                        .join("; "),
                ),
            },
            // Driver messages stay in the logs.
            AppError::Database(_) | AppError::Io(_) => ErrorResponse {
                error: "Storage failure".to_string(),
                details: None,
            },
            AppError::Internal(_) => ErrorResponse {
                error: "Internal server error".to_string(),
                details: None,
            },
            _ => ErrorResponse {
                error: self.to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }
        (status, Json(self.to_body())).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::BodyTooLarge,
            StatusCode::UNSUPPORTED_MEDIA_TYPE => {
                AppError::UnsupportedMediaType("expected application/json".to_string())
            }
            _ => AppError::field("body", rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::field("query", rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::field("path", rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        tracing::debug!("Multipart rejected: {}", rejection.body_text());
        AppError::UnsupportedMediaType("expected multipart/form-data".to_string())
    }
}

/// Rewrites the plain-text 413 of the body limit layer into an error body.
pub async fn body_limit_as_json(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        AppError::BodyTooLarge.into_response()
    } else {
        response
    }
}

/// Runs a storage future under a deadline.
pub async fn bounded<T, E, F>(
    op: &'static str,
    limit: std::time::Duration,
    fut: F,
) -> Result<T>
where
    F: std::future::Future<Output = std::result::Result<T, E>>,
    E: Into<AppError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => match e.into() {
            AppError::Database(sqlx::Error::PoolTimedOut) => Err(AppError::Timeout(op)),
            other => Err(other),
        },
        Err(_) => Err(AppError::Timeout(op)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("no".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::PayloadTooLarge { limit: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::UnsupportedMediaType("text/plain".into()).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            AppError::Timeout("write").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_validation_body_lists_fields() {
        let err = AppError::Validation(vec![
            FieldError::new("title", "is required"),
            FieldError::new("file", "an image is required"),
        ]);
        assert_eq!(err.fields(), vec!["title", "file"]);
        let body = err.to_body();
        let details = body.details.unwrap();
        assert!(details.contains("title: is required"));
        assert!(details.contains("file: an image is required"));
    }

    #[test]
    fn test_storage_errors_hide_driver_message() {
        let err = AppError::Database(sqlx::Error::RowNotFound);
        let body = err.to_body();
        assert_eq!(body.error, "Storage failure");
        assert!(body.details.is_none());
    }

    #[tokio::test]
    async fn test_plain_payload_too_large_becomes_json() {
        let plain = (StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded").into_response();
        let res = body_limit_as_json(plain).await;
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");

        let ok = body_limit_as_json(StatusCode::NO_CONTENT.into_response()).await;
        assert_eq!(ok.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result: Result<()> = bounded("sleep", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<(), AppError>(())
        })
        .await;
        assert!(matches!(result, Err(AppError::Timeout("sleep"))));
    }

    #[tokio::test]
    async fn test_bounded_maps_pool_timeout() {
        let result: Result<()> = bounded("query", Duration::from_secs(1), async {
            Err::<(), sqlx::Error>(sqlx::Error::PoolTimedOut)
        })
        .await;
        assert!(matches!(result, Err(AppError::Timeout("query"))));
    }
}
