/**
 * Activity Routes
 * Recent activity feed and manual entries
 */
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AdminSession;
use crate::db::models::{Activity, ActivityAction, ActivityEntry, NewActivity};
use crate::entities::EntityKind;
use crate::error::{AppError, Result};
use crate::routes::extract::{JsonBody, QueryParams};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    pub action: ActivityAction,
    pub entity_type: EntityKind,
    #[serde(default)]
    pub description: String,
    pub related_entity_id: Option<i64>,
}

/// GET /admin/activities?limit=N - newest entries first
pub async fn list_activities(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    QueryParams(query): QueryParams<FeedQuery>,
) -> Result<Json<Vec<ActivityEntry>>> {
    Ok(Json(state.activity.recent(query.limit).await?))
}

/// POST /admin/activities - manual entry attributed to the caller
pub async fn create_activity(
    State(state): State<AppState>,
    AdminSession(actor): AdminSession,
    JsonBody(payload): JsonBody<ActivityRequest>,
) -> Result<(StatusCode, Json<Activity>)> {
    let description = payload.description.trim();
    if description.is_empty() {
        return Err(AppError::field("description", "is required"));
    }

    let activity = state
        .activity
        .record(NewActivity {
            user_id: actor.id,
            action: payload.action,
            entity_type: payload.entity_type,
            description: description.to_string(),
            related_entity_id: payload.related_entity_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(activity)))
}
