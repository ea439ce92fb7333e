/**
 * Upload Routes
 * Standalone image upload returning the public URL
 */
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AdminSession;
use crate::error::{AppError, Result};
use crate::routes::extract::FormData;
use crate::routes::read_form;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub size: usize,
    pub mime_type: String,
}

/// POST /admin/upload - store a standalone image and return its URL
pub async fn upload_image(
    State(state): State<AppState>,
    AdminSession(actor): AdminSession,
    FormData(multipart): FormData,
) -> Result<Json<UploadResponse>> {
    let input = read_form(multipart, state.uploads.max_bytes()).await?;
    let file = input
        .file
        .ok_or_else(|| AppError::field("file", "No file provided"))?;

    let stored = state.uploads.store(&file).await?;
    tracing::debug!(user_id = actor.id, url = %stored.url, "standalone upload");

    Ok(Json(UploadResponse {
        url: stored.url,
        filename: stored.file_name,
        size: stored.size,
        mime_type: file.content_type,
    }))
}
