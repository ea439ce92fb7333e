//! HTTP handlers. Each one extracts, calls into [`crate::services`] and
//! shapes the response; rules live in the services.

pub mod activities;
pub mod auth;
pub mod contact;
pub mod content;
pub mod extract;
pub mod health;
pub mod profile;
pub mod stats;
pub mod upload;
pub mod users;

use axum::{
    extract::{multipart::MultipartError, Multipart},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::services::{FormInput, Outcome};
use crate::storage::UploadedFile;

pub const ACTIVITY_WARNING_HEADER: &str = "x-activity-warning";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// `?id=<id>` on update and delete.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<i64>,
}

impl IdQuery {
    pub fn require(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| AppError::field("id", "query parameter is required"))
    }
}

/// Serializes the value with `status`, carrying any warning in a header.
pub fn respond<T: Serialize>(status: StatusCode, outcome: Outcome<T>) -> Response {
    let mut response = (status, Json(outcome.value)).into_response();
    if let Some(value) = outcome
        .warning
        .and_then(|w| HeaderValue::from_str(&w).ok())
    {
        response
            .headers_mut()
            .insert(ACTIVITY_WARNING_HEADER, value);
    }
    response
}

/// Like [`respond`] for deletions, answering `{success: true}`.
pub fn respond_deleted(outcome: Outcome<()>) -> Response {
    respond(
        StatusCode::OK,
        Outcome {
            value: SuccessResponse { success: true },
            warning: outcome.warning,
        },
    )
}

fn multipart_error(err: MultipartError, limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit }
    } else {
        tracing::debug!("Multipart error: {}", err);
        AppError::field("body", err.body_text())
    }
}

/// Collects text fields and the `file` part of a multipart form.
/// An empty file input (no name, no bytes) counts as no file.
pub async fn read_form(mut multipart: Multipart, limit: usize) -> Result<FormInput> {
    let mut input = FormInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                input.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            None => {
                let value = field.text().await.map_err(|e| multipart_error(e, limit))?;
                input.fields.insert(name, value);
            }
        }
    }

    Ok(input)
}
