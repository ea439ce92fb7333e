//! Database Models - structs representing database tables (used by sqlx/serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow};

use crate::entities::{self, EntityDescriptor, EntityKind};

/// A row type managed through an [`EntityDescriptor`].
pub trait Record:
    for<'r> FromRow<'r, SqliteRow> + Serialize + Send + Sync + Unpin + 'static
{
    const DESCRIPTOR: &'static EntityDescriptor;

    fn id(&self) -> i64;

    /// Public URL of the backing upload, if the entity carries one.
    fn image(&self) -> Option<&str> {
        None
    }

    /// Value of the descriptor's caption field.
    fn caption(&self) -> Option<&str> {
        None
    }
}

/// Contact info shown in the site header and footer. At most one row exists.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    pub phone: String,
    pub whatsapp: String,
    pub email: String,
    pub address: String,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
    #[serde(skip)]
    pub revision: i64,
    pub updated_at: DateTime<Utc>,
}

impl Record for Contact {
    const DESCRIPTOR: &'static EntityDescriptor = &entities::CONTACT;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Service {
    const DESCRIPTOR: &'static EntityDescriptor = &entities::SERVICE;

    fn id(&self) -> i64 {
        self.id
    }

    fn image(&self) -> Option<&str> {
        Some(self.image.as_str())
    }

    fn caption(&self) -> Option<&str> {
        Some(self.title.as_str())
    }
}

/// Home page carousel entry
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Slide {
    const DESCRIPTOR: &'static EntityDescriptor = &entities::SLIDE;

    fn id(&self) -> i64 {
        self.id
    }

    fn image(&self) -> Option<&str> {
        Some(self.image.as_str())
    }

    fn caption(&self) -> Option<&str> {
        Some(self.title.as_str())
    }
}

/// Gallery entry; just a timestamped image.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub id: i64,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Work {
    const DESCRIPTOR: &'static EntityDescriptor = &entities::WORK;

    fn id(&self) -> i64 {
        self.id
    }

    fn image(&self) -> Option<&str> {
        Some(self.image.as_str())
    }
}

/// Admin account. The hash never leaves the server.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for User {
    const DESCRIPTOR: &'static EntityDescriptor = &entities::USER;

    fn id(&self) -> i64 {
        self.id
    }

    fn caption(&self) -> Option<&str> {
        Some(self.email.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ActivityAction {
    Create,
    Update,
    Delete,
}

/// Audit log entry
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub user_id: i64,
    pub action: ActivityAction,
    pub entity_type: EntityKind,
    pub description: String,
    pub related_entity_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// New activity for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    pub user_id: i64,
    pub action: ActivityAction,
    pub entity_type: EntityKind,
    pub description: String,
    pub related_entity_id: Option<i64>,
}

/// Activity joined with the acting user, for the dashboard feed.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub activity: Activity,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Dashboard counters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_users: i64,
    pub total_services: i64,
    pub total_sliders: i64,
    pub total_works: i64,
}
