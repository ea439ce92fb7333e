//! Entity services: validation, upload orchestration, persistence and the
//! activity entry for each admin operation. Handlers stay thin wrappers.

pub mod contact;
pub mod content;
pub mod users;

use std::collections::HashMap;

use crate::auth::Identity;
use crate::db::models::{ActivityAction, NewActivity};
use crate::entities::EntityKind;
use crate::state::AppState;
use crate::storage::UploadedFile;

pub const ACTIVITY_WARNING: &str = "Change saved, but the activity log entry could not be recorded";

/// Result of a mutation plus an optional non-fatal warning.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub warning: Option<String>,
}

/// Text fields and the optional image of a submitted form.
#[derive(Debug, Default)]
pub struct FormInput {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

/// Appends an activity entry for `actor`. A failure never undoes the
/// mutation; it comes back as a warning for the response instead.
pub(crate) async fn record_activity(
    state: &AppState,
    actor: &Identity,
    action: ActivityAction,
    entity_type: EntityKind,
    description: String,
    related_entity_id: Option<i64>,
) -> Option<String> {
    let entry = NewActivity {
        user_id: actor.id,
        action,
        entity_type,
        description,
        related_entity_id,
    };

    match state.activity.record(entry).await {
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(
                user_id = actor.id,
                entity = %entity_type,
                "Failed to record activity: {}",
                e
            );
            Some(ACTIVITY_WARNING.to_string())
        }
    }
}
