/**
 * Authentication Routes
 * Login issues a signed session token (returned in the body and as an
 * HttpOnly cookie); logout clears the cookie.
 */
use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{AdminSession, Identity, SESSION_COOKIE};
use crate::error::{AppError, Result};
use crate::routes::extract::JsonBody;
use crate::routes::SuccessResponse;
use crate::services::users;
use crate::state::AppState;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: Identity,
    pub token: String,
}

fn session_cookie(value: &str, max_age_secs: i64, secure: bool) -> Result<HeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE}={value}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Internal(format!("invalid session cookie: {e}")))
}

/// POST /admin/auth/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Response> {
    let user = users::authenticate(&state, &payload.email, &payload.password).await?;
    let identity = Identity::from(&user);
    let token = state.tokens.issue(&identity)?;

    let cookie = session_cookie(
        &token,
        state.tokens.ttl().num_seconds(),
        state.config.is_production(),
    )?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            user: identity,
            token,
        }),
    )
        .into_response())
}

/// POST /admin/auth/logout - always succeeds
pub async fn logout(State(state): State<AppState>) -> Result<Response> {
    let cookie = session_cookie("", 0, state.config.is_production())?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SuccessResponse { success: true }),
    )
        .into_response())
}

/// GET /admin/auth/session - who is signed in
pub async fn session(AdminSession(identity): AdminSession) -> Json<Identity> {
    Json(identity)
}
