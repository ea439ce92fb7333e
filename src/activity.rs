//! Append-only audit trail of admin mutations.

use chrono::Utc;
use sqlx::SqlitePool;
use std::time::Duration;

use crate::db::models::{Activity, ActivityEntry, NewActivity};
use crate::error::{bounded, Result};

pub const DEFAULT_FEED_LIMIT: i64 = 10;
pub const MAX_FEED_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct ActivityLog {
    pool: SqlitePool,
    timeout: Duration,
}

impl ActivityLog {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub async fn record(&self, entry: NewActivity) -> Result<Activity> {
        bounded(
            "record activity",
            self.timeout,
            sqlx::query_as::<_, Activity>(
                r#"
                INSERT INTO activities
                    (user_id, action, entity_type, description, related_entity_id, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                RETURNING *
                "#,
            )
            .bind(entry.user_id)
            .bind(entry.action)
            .bind(entry.entity_type)
            .bind(&entry.description)
            .bind(entry.related_entity_id)
            .bind(Utc::now())
            .fetch_one(&self.pool),
        )
        .await
    }

    /// Most recent entries with the acting user's name and email. Entries
    /// whose user has since been deleted keep empty user columns.
    pub async fn recent(&self, limit: Option<i64>) -> Result<Vec<ActivityEntry>> {
        let limit = limit
            .unwrap_or(DEFAULT_FEED_LIMIT)
            .clamp(1, MAX_FEED_LIMIT);

        bounded(
            "list activities",
            self.timeout,
            sqlx::query_as::<_, ActivityEntry>(
                r#"
                SELECT a.*, u.name AS user_name, u.email AS user_email
                FROM activities a
                LEFT JOIN users u ON u.id = a.user_id
                ORDER BY a.created_at DESC, a.id DESC
                LIMIT ?
                "#,
            )
            .bind(limit)
            .fetch_all(&self.pool),
        )
        .await
    }
}
