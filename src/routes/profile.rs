/**
 * Profile Routes
 * The signed-in admin edits their own account
 */
use axum::{extract::State, http::StatusCode, response::Response};

use crate::auth::AdminSession;
use crate::error::Result;
use crate::routes::extract::JsonBody;
use crate::routes::respond;
use crate::services::users::{self, UpdateUser};
use crate::state::AppState;

/// PUT /admin/profile - the caller edits their own account
pub async fn update_profile(
    State(state): State<AppState>,
    AdminSession(actor): AdminSession,
    JsonBody(payload): JsonBody<UpdateUser>,
) -> Result<Response> {
    let outcome = users::update_profile(&state, &actor, payload).await?;
    Ok(respond(StatusCode::OK, outcome))
}
