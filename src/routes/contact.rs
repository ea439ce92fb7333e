/**
 * Contact Routes
 * Read and save the single contact record
 */
use axum::{extract::State, http::StatusCode, response::Response, Json};
use std::collections::HashMap;

use crate::auth::AdminSession;
use crate::db::models::Contact;
use crate::error::Result;
use crate::routes::extract::{JsonBody, QueryParams};
use crate::routes::{respond, IdQuery};
use crate::services::contact;
use crate::state::AppState;

/// JSON body with `null` for cleared optional links.
type ContactPayload = HashMap<String, Option<String>>;

fn flatten(payload: ContactPayload) -> HashMap<String, String> {
    payload
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
}

/// GET /admin/contact - the contact row, or `null` before the first save
pub async fn get_contact(State(state): State<AppState>) -> Result<Json<Option<Contact>>> {
    Ok(Json(contact::get(&state).await?))
}

/// POST /admin/contact - create or overwrite the singleton
pub async fn save_contact(
    State(state): State<AppState>,
    AdminSession(actor): AdminSession,
    JsonBody(payload): JsonBody<ContactPayload>,
) -> Result<Response> {
    let outcome = contact::save(&state, &actor, &flatten(payload)).await?;
    Ok(respond(StatusCode::OK, outcome))
}

/// PUT /admin/contact?id=<id>
pub async fn update_contact(
    State(state): State<AppState>,
    AdminSession(actor): AdminSession,
    QueryParams(query): QueryParams<IdQuery>,
    JsonBody(payload): JsonBody<ContactPayload>,
) -> Result<Response> {
    let id = query.require()?;
    let outcome = contact::update(&state, &actor, id, &flatten(payload)).await?;
    Ok(respond(StatusCode::OK, outcome))
}
