/**
 * User Routes
 * Admin account management
 */
use axum::{extract::State, http::StatusCode, response::Response, Json};

use crate::auth::AdminSession;
use crate::db::models::User;
use crate::error::Result;
use crate::routes::extract::{JsonBody, PathParam, QueryParams};
use crate::routes::{respond, respond_deleted, IdQuery};
use crate::services::users::{self, NewUser, UpdateUser};
use crate::state::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
) -> Result<Json<Vec<User>>> {
    Ok(Json(users::list(&state).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    PathParam(id): PathParam<i64>,
) -> Result<Json<User>> {
    Ok(Json(users::get(&state, id).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    AdminSession(actor): AdminSession,
    JsonBody(payload): JsonBody<NewUser>,
) -> Result<Response> {
    let outcome = users::create(&state, &actor, payload).await?;
    Ok(respond(StatusCode::CREATED, outcome))
}

pub async fn update_user(
    State(state): State<AppState>,
    AdminSession(actor): AdminSession,
    QueryParams(query): QueryParams<IdQuery>,
    JsonBody(payload): JsonBody<UpdateUser>,
) -> Result<Response> {
    let id = query.require()?;
    let outcome = users::update(&state, &actor, id, payload).await?;
    Ok(respond(StatusCode::OK, outcome))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminSession(actor): AdminSession,
    QueryParams(query): QueryParams<IdQuery>,
) -> Result<Response> {
    let id = query.require()?;
    let outcome = users::delete(&state, &actor, id).await?;
    Ok(respond_deleted(outcome))
}
