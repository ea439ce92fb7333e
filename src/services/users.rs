//! Admin accounts: password hashing, email uniqueness and the guards
//! around changing or deleting an account.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::{hash_password, verify_password, Identity};
use crate::config::{AdminPassword, AdminSeed};
use crate::db::models::{ActivityAction, Record, User};
use crate::entities::USER;
use crate::error::{AppError, FieldError, Result};
use crate::services::{record_activity, Outcome};
use crate::state::AppState;

pub const MIN_PASSWORD_LEN: usize = 8;

const EMAIL_TAKEN: &str = "Email is already in use";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

impl UpdateUser {
    fn new_password(&self) -> Option<&str> {
        self.new_password.as_deref().filter(|p| !p.is_empty())
    }

    fn current_password(&self) -> Option<&str> {
        self.current_password.as_deref().filter(|p| !p.is_empty())
    }
}

fn identity_fields(name: &str, email: &str) -> HashMap<String, String> {
    HashMap::from([
        ("name".to_string(), name.to_string()),
        ("email".to_string(), email.to_string()),
    ])
}

fn check_password(field: &str, password: &str, errors: &mut Vec<FieldError>) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            field,
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
}

/// Validated `(name, email)` or every field error found.
fn check_identity(
    name: &str,
    email: &str,
    errors: &mut Vec<FieldError>,
) -> Option<(String, String)> {
    match USER.check(&identity_fields(name, email)) {
        Ok(fields) => Some((
            fields.get("name").unwrap_or_default().to_string(),
            fields.get("email").unwrap_or_default().to_string(),
        )),
        Err(found) => {
            errors.extend(found);
            None
        }
    }
}

fn conflict_on_unique(err: AppError) -> AppError {
    match err {
        AppError::Database(sqlx::Error::Database(ref db)) if db.is_unique_violation() => {
            AppError::Conflict(EMAIL_TAKEN.to_string())
        }
        other => other,
    }
}

pub async fn list(state: &AppState) -> Result<Vec<User>> {
    state.store.list::<User>().await
}

pub async fn get(state: &AppState, id: i64) -> Result<User> {
    state
        .store
        .find::<User>(id)
        .await?
        .ok_or_else(|| AppError::NotFound(USER.label.to_string()))
}

pub async fn create(state: &AppState, actor: &Identity, input: NewUser) -> Result<Outcome<User>> {
    let mut errors = Vec::new();
    let identity = check_identity(&input.name, &input.email, &mut errors);
    check_password("password", &input.password, &mut errors);
    let (name, email) = match identity {
        Some(pair) if errors.is_empty() => pair,
        _ => return Err(AppError::Validation(errors)),
    };

    if state.store.email_taken(&email, None).await? {
        return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
    }

    let password_hash = hash_password(&input.password, state.config.bcrypt_cost).await?;
    let user = state
        .store
        .insert_user(&name, &email, &password_hash)
        .await
        .map_err(conflict_on_unique)?;

    tracing::info!(id = user.id, "User created: {}", user.email);

    let warning = record_activity(
        state,
        actor,
        ActivityAction::Create,
        USER.kind,
        USER.describe(user.caption(), "created"),
        Some(user.id),
    )
    .await;

    Ok(Outcome {
        value: user,
        warning,
    })
}

/// Changing the password requires the correct current one; a mismatch
/// leaves the account untouched.
pub async fn update(
    state: &AppState,
    actor: &Identity,
    id: i64,
    input: UpdateUser,
) -> Result<Outcome<User>> {
    let existing = get(state, id).await?;

    let mut errors = Vec::new();
    let identity = check_identity(&input.name, &input.email, &mut errors);
    if let Some(new_password) = input.new_password() {
        check_password("newPassword", new_password, &mut errors);
        if input.current_password().is_none() {
            errors.push(FieldError::new(
                "currentPassword",
                "is required to set a new password",
            ));
        }
    }
    let (name, email) = match identity {
        Some(pair) if errors.is_empty() => pair,
        _ => return Err(AppError::Validation(errors)),
    };

    if state.store.email_taken(&email, Some(id)).await? {
        return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
    }

    let password_hash = match (input.new_password(), input.current_password()) {
        (Some(new_password), Some(current)) => {
            if !verify_password(current, &existing.password_hash).await? {
                tracing::warn!(id, "Password change rejected: wrong current password");
                return Err(AppError::InvalidCredentials);
            }
            Some(hash_password(new_password, state.config.bcrypt_cost).await?)
        }
        _ => None,
    };

    let user = state
        .store
        .update_user(id, &name, &email, password_hash.as_deref())
        .await
        .map_err(conflict_on_unique)?
        .ok_or_else(|| AppError::NotFound(USER.label.to_string()))?;

    tracing::info!(id, password_changed = password_hash.is_some(), "User updated");

    let warning = record_activity(
        state,
        actor,
        ActivityAction::Update,
        USER.kind,
        USER.describe(user.caption(), "updated"),
        Some(id),
    )
    .await;

    Ok(Outcome {
        value: user,
        warning,
    })
}

/// The caller's own account. A new password must be repeated in
/// `confirmPassword`.
pub async fn update_profile(
    state: &AppState,
    actor: &Identity,
    input: UpdateUser,
) -> Result<Outcome<User>> {
    if let Some(new_password) = input.new_password() {
        if input.confirm_password.as_deref() != Some(new_password) {
            return Err(AppError::field("confirmPassword", "does not match the new password"));
        }
    }
    update(state, actor, actor.id, input).await
}

pub async fn delete(state: &AppState, actor: &Identity, id: i64) -> Result<Outcome<()>> {
    let existing = get(state, id).await?;

    if existing.id == actor.id {
        return Err(AppError::Forbidden(
            "You cannot delete your own account".to_string(),
        ));
    }

    if !state.store.delete::<User>(id).await? {
        return Err(AppError::NotFound(USER.label.to_string()));
    }

    tracing::info!(id, "User deleted: {}", existing.email);

    let warning = record_activity(
        state,
        actor,
        ActivityAction::Delete,
        USER.kind,
        USER.describe(existing.caption(), "deleted"),
        Some(id),
    )
    .await;

    Ok(Outcome { value: (), warning })
}

/// Login check. Unknown email and wrong password look the same to the caller.
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> Result<User> {
    let email = email.trim();
    let mut errors = Vec::new();
    if email.is_empty() {
        errors.push(FieldError::new("email", "is required"));
    }
    if password.is_empty() {
        errors.push(FieldError::new("password", "is required"));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let Some(user) = state.store.user_by_email(email).await? else {
        tracing::warn!("Login attempt for unknown email: {}", email);
        return Err(AppError::LoginFailed);
    };

    if !verify_password(password, &user.password_hash).await? {
        tracing::warn!("Failed login attempt for: {}", email);
        return Err(AppError::LoginFailed);
    }

    tracing::info!("Successful login: {}", user.email);
    Ok(user)
}

/// Creates the first admin from the environment when no account exists yet.
pub async fn ensure_admin(state: &AppState, seed: &AdminSeed) -> Result<Option<User>> {
    if state.store.count::<User>().await? > 0 {
        tracing::debug!("Users present, skipping admin bootstrap");
        return Ok(None);
    }

    let password_hash = match &seed.password {
        AdminPassword::Hashed(hash) => hash.clone(),
        AdminPassword::Plain(plain) => hash_password(plain, state.config.bcrypt_cost).await?,
    };

    let user = state
        .store
        .insert_user(&seed.name, &seed.email, &password_hash)
        .await
        .map_err(conflict_on_unique)?;

    tracing::info!("Bootstrapped admin account: {}", user.email);
    Ok(Some(user))
}
