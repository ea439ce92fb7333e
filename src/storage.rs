//! Upload storage for entity images.
//!
//! Files land in a public directory served under `/uploads/`. Names are
//! generated (`<millis>-<random>-<sanitized original>`) so concurrent
//! uploads never collide.

use chrono::Utc;
use rand::distr::{Alphanumeric, SampleString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{bounded, AppError, Result};

pub const PUBLIC_PREFIX: &str = "/uploads/";

/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub url: String,
    pub file_name: String,
    pub size: usize,
}

#[derive(Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_bytes: usize,
    timeout: Duration,
}

/// Keeps `[A-Za-z0-9.]`, replaces everything else with `_`, drops leading dots.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

impl UploadStore {
    pub fn new(root: PathBuf, max_bytes: usize, timeout: Duration) -> Self {
        Self {
            root,
            max_bytes,
            timeout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Create the uploads directory if needed.
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Upload store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Validates and writes `file`, returning its public URL.
    pub async fn store(&self, file: &UploadedFile) -> Result<StoredFile> {
        if file.bytes.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge {
                limit: self.max_bytes,
            });
        }
        if !file.content_type.starts_with("image/") {
            return Err(AppError::UnsupportedMediaType(file.content_type.clone()));
        }
        if file.bytes.is_empty() {
            return Err(AppError::field("file", "is empty"));
        }

        let file_name = format!(
            "{}-{}-{}",
            Utc::now().timestamp_millis(),
            Alphanumeric.sample_string(&mut rand::rng(), 8),
            sanitize_file_name(&file.file_name)
        );

        bounded("upload write", self.timeout, self.write(&file_name, &file.bytes)).await?;

        tracing::info!("Image uploaded: {} ({} bytes)", file_name, file.bytes.len());

        Ok(StoredFile {
            url: format!("{PUBLIC_PREFIX}{file_name}"),
            file_name,
            size: file.bytes.len(),
        })
    }

    async fn write(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.root).await?;

        let path = self.root.join(file_name);
        let temp_path = path.with_extension("part");
        let mut out = fs::File::create(&temp_path).await?;
        out.write_all(bytes).await?;
        out.sync_all().await?;
        fs::rename(&temp_path, &path).await
    }

    /// Deletes the file behind `url`. Never fails: problems are logged and
    /// the caller carries on.
    pub async fn remove(&self, url: &str) {
        let Some(file_name) = url.strip_prefix(PUBLIC_PREFIX) else {
            tracing::warn!("Not an upload URL, skipping removal: {}", url);
            return;
        };
        if !is_plain_file_name(file_name) {
            tracing::warn!("Refusing to remove suspicious upload path: {}", url);
            return;
        }

        let path = self.root.join(file_name);
        match tokio::time::timeout(self.timeout, fs::remove_file(&path)).await {
            Ok(Ok(())) => tracing::info!("Image deleted: {}", file_name),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Image already gone: {}", file_name)
            }
            Ok(Err(e)) => tracing::error!("Failed to delete image {}: {}", file_name, e),
            Err(_) => tracing::error!("Timed out deleting image {}", file_name),
        }
    }
}
