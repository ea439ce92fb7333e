//! The contact singleton.

use std::collections::HashMap;

use crate::auth::Identity;
use crate::db::models::{ActivityAction, Contact};
use crate::entities::CONTACT;
use crate::error::{AppError, Result};
use crate::services::{record_activity, Outcome};
use crate::state::AppState;

pub async fn get(state: &AppState) -> Result<Option<Contact>> {
    state.store.contact().await
}

/// Creates the contact row on first use and overwrites it afterwards.
/// Concurrent first writers both succeed; the later one wins and is
/// logged as an update.
pub async fn save(
    state: &AppState,
    actor: &Identity,
    input: &HashMap<String, String>,
) -> Result<Outcome<Contact>> {
    let fields = CONTACT.validate(input)?;
    let contact = state.store.upsert_contact(&fields).await?;

    let (action, verb) = if contact.revision == 0 {
        (ActivityAction::Create, "created")
    } else {
        (ActivityAction::Update, "updated")
    };
    tracing::info!(id = contact.id, revision = contact.revision, "Contact {}", verb);

    let warning = record_activity(
        state,
        actor,
        action,
        CONTACT.kind,
        CONTACT.describe(None, verb),
        Some(contact.id),
    )
    .await;

    Ok(Outcome {
        value: contact,
        warning,
    })
}

/// Update addressed by id; only the existing singleton matches.
pub async fn update(
    state: &AppState,
    actor: &Identity,
    id: i64,
    input: &HashMap<String, String>,
) -> Result<Outcome<Contact>> {
    match state.store.contact().await? {
        Some(existing) if existing.id == id => save(state, actor, input).await,
        _ => Err(AppError::NotFound(CONTACT.label.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{seed_admin, test_state};

    fn payload(phone: &str) -> HashMap<String, String> {
        [
            ("phone", phone),
            ("whatsapp", "0555 111 22 33"),
            ("email", "info@tesisat.example"),
            ("address", "Kadıköy, İstanbul"),
            ("instagram", "@tesisat"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[tokio::test]
    async fn test_get_before_first_save_is_none() {
        let (state, _temp) = test_state().await;
        assert!(get(&state).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_save_updates_single_row() {
        let (state, _temp) = test_state().await;
        let (admin, _) = seed_admin(&state).await;
        let actor = Identity::from(&admin);

        let first = save(&state, &actor, &payload("0212 000 00 01")).await.unwrap().value;
        let second = save(&state, &actor, &payload("0212 000 00 02")).await.unwrap().value;

        assert_eq!(first.id, second.id);
        let current = get(&state).await.unwrap().unwrap();
        assert_eq!(current.phone, "0212 000 00 02");
        assert_eq!(current.instagram.as_deref(), Some("@tesisat"));

        let feed = state.activity.recent(None).await.unwrap();
        assert_eq!(feed[0].activity.action, ActivityAction::Update);
        assert_eq!(feed[1].activity.action, ActivityAction::Create);
    }

    #[tokio::test]
    async fn test_save_rejects_missing_fields_without_write() {
        let (state, _temp) = test_state().await;
        let (admin, _) = seed_admin(&state).await;

        let mut input = payload("1");
        input.remove("address");
        input.insert("email".into(), "nope".into());

        let err = save(&state, &Identity::from(&admin), &input).await.unwrap_err();
        assert_eq!(err.fields(), vec!["email", "address"]);
        assert!(get(&state).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_requires_matching_id() {
        let (state, _temp) = test_state().await;
        let (admin, _) = seed_admin(&state).await;
        let actor = Identity::from(&admin);

        let err = update(&state, &actor, 1, &payload("1")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let created = save(&state, &actor, &payload("1")).await.unwrap().value;
        let err = update(&state, &actor, created.id + 1, &payload("2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let updated = update(&state, &actor, created.id, &payload("3")).await.unwrap().value;
        assert_eq!(updated.phone, "3");
    }
}
