//! Admin sessions.
//!
//! Handlers never look at headers themselves: they take an [`AdminSession`]
//! extractor, which asks the [`SessionResolver`] held in the app state for
//! the acting identity and rejects with 401 when there is none.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::models::User;
use crate::error::{AppError, Result};
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// The authenticated admin behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Resolves the acting admin for a request, if any.
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Option<Identity>;
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

/// HS256 session tokens carried as a bearer token or a `session` cookie.
#[derive(Clone)]
pub struct JwtSessions {
    secret: String,
    ttl: Duration,
}

impl JwtSessions {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, identity: &Identity) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.id.to_string(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("failed to sign session token: {e}")))
    }

    pub fn verify(&self, token: &str) -> std::result::Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

impl SessionResolver for JwtSessions {
    fn resolve(&self, headers: &HeaderMap) -> Option<Identity> {
        let token = extract_bearer_token(headers).or_else(|| extract_session_cookie(headers))?;
        match self.verify(&token) {
            Ok(claims) => Some(Identity {
                id: claims.sub.parse().ok()?,
                name: claims.name,
                email: claims.email,
            }),
            Err(e) => {
                tracing::debug!("Token verification failed: {}", e);
                None
            }
        }
    }
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
}

fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::to_string)
        })
        .filter(|t| !t.is_empty())
}

/// Extractor for handlers that need a signed-in admin whose account still exists.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Identity);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let claimed = state
            .sessions
            .resolve(&parts.headers)
            .ok_or(AppError::Unauthorized)?;

        // The account must still exist; name and email come from the row.
        match state.store.find::<User>(claimed.id).await? {
            Some(user) => Ok(AdminSession(Identity::from(&user))),
            None => {
                tracing::debug!(user_id = claimed.id, "Session user no longer exists");
                Err(AppError::Unauthorized)
            }
        }
    }
}

/// bcrypt is CPU-bound; keep it off the async executor.
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();
    tokio::task::spawn_blocking(move || verify(password, &password_hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::Internal(format!("password check task failed: {e}")))
}
