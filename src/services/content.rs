//! Generic CRUD for the image-bearing entities (services, slides, works).
//!
//! Every operation is driven by the row type's [`EntityDescriptor`]; blobs
//! are written before the row that references them and old blobs are only
//! removed once the new row is in place.
//!
//! [`EntityDescriptor`]: crate::entities::EntityDescriptor

use crate::auth::Identity;
use crate::db::models::{ActivityAction, Record};
use crate::error::{AppError, FieldError, Result};
use crate::services::{record_activity, FormInput, Outcome};
use crate::state::AppState;

fn not_found<R: Record>() -> AppError {
    AppError::NotFound(R::DESCRIPTOR.label.to_string())
}

pub async fn list<R: Record>(state: &AppState) -> Result<Vec<R>> {
    state.store.list::<R>().await
}

pub async fn get<R: Record>(state: &AppState, id: i64) -> Result<R> {
    state.store.find::<R>(id).await?.ok_or_else(not_found::<R>)
}

pub async fn create<R: Record>(
    state: &AppState,
    actor: &Identity,
    input: FormInput,
) -> Result<Outcome<R>> {
    let descriptor = R::DESCRIPTOR;

    let (fields, file) = match (descriptor.check(&input.fields), input.file) {
        (Ok(fields), Some(file)) => (fields, file),
        (Ok(_), None) => return Err(AppError::field("file", "an image is required")),
        (Err(mut errors), file) => {
            if file.is_none() {
                errors.push(FieldError::new("file", "an image is required"));
            }
            return Err(AppError::Validation(errors));
        }
    };

    let stored = state.uploads.store(&file).await?;

    let row: R = match state.store.insert(&fields, Some(stored.url.as_str())).await {
        Ok(row) => row,
        Err(e) => {
            state.uploads.remove(&stored.url).await;
            return Err(e);
        }
    };

    tracing::info!(entity = %descriptor.kind, id = row.id(), "{} created", descriptor.label);

    let warning = record_activity(
        state,
        actor,
        ActivityAction::Create,
        descriptor.kind,
        descriptor.describe(row.caption(), "created"),
        Some(row.id()),
    )
    .await;

    Ok(Outcome {
        value: row,
        warning,
    })
}

pub async fn update<R: Record>(
    state: &AppState,
    actor: &Identity,
    id: i64,
    input: FormInput,
) -> Result<Outcome<R>> {
    let descriptor = R::DESCRIPTOR;

    let existing = get::<R>(state, id).await?;
    let fields = descriptor.validate(&input.fields)?;

    let stored = match &input.file {
        Some(file) => Some(state.uploads.store(file).await?),
        None => None,
    };
    let new_url = stored.as_ref().map(|s| s.url.as_str());

    let row: R = match state.store.update(id, &fields, new_url).await {
        Ok(Some(row)) => row,
        // Deleted between load and write, or the write failed.
        other => {
            if let Some(url) = new_url {
                state.uploads.remove(url).await;
            }
            return Err(other.err().unwrap_or_else(not_found::<R>));
        }
    };

    if let (Some(old), Some(new)) = (existing.image(), new_url) {
        if old != new {
            state.uploads.remove(old).await;
        }
    }

    tracing::info!(entity = %descriptor.kind, id, "{} updated", descriptor.label);

    let warning = record_activity(
        state,
        actor,
        ActivityAction::Update,
        descriptor.kind,
        descriptor.describe(row.caption(), "updated"),
        Some(id),
    )
    .await;

    Ok(Outcome {
        value: row,
        warning,
    })
}

pub async fn delete<R: Record>(state: &AppState, actor: &Identity, id: i64) -> Result<Outcome<()>> {
    let descriptor = R::DESCRIPTOR;

    let existing = get::<R>(state, id).await?;

    if let Some(url) = existing.image() {
        state.uploads.remove(url).await;
    }

    if !state.store.delete::<R>(id).await? {
        return Err(not_found::<R>());
    }

    tracing::info!(entity = %descriptor.kind, id, "{} deleted", descriptor.label);

    let warning = record_activity(
        state,
        actor,
        ActivityAction::Delete,
        descriptor.kind,
        descriptor.describe(existing.caption(), "deleted"),
        Some(id),
    )
    .await;

    Ok(Outcome { value: (), warning })
}
