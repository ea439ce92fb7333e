//! Persistent store: descriptor-driven CRUD over the content tables, plus
//! the user and contact queries that don't fit the generic shape.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::time::Duration;

use super::models::{Contact, Record, Stats, User};
use crate::entities::{ValidFields, CONTACT};
use crate::error::{bounded, Result};

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    timeout: Duration,
}

impl Store {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// All rows, newest first.
    pub async fn list<R: Record>(&self) -> Result<Vec<R>> {
        let sql = format!(
            "SELECT * FROM {} ORDER BY created_at DESC, id DESC",
            R::DESCRIPTOR.table
        );
        bounded(
            "list",
            self.timeout,
            sqlx::query_as::<_, R>(&sql).fetch_all(&self.pool),
        )
        .await
    }

    pub async fn find<R: Record>(&self, id: i64) -> Result<Option<R>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", R::DESCRIPTOR.table);
        bounded(
            "find",
            self.timeout,
            sqlx::query_as::<_, R>(&sql).bind(id).fetch_optional(&self.pool),
        )
        .await
    }

    pub async fn insert<R: Record>(&self, fields: &ValidFields, image: Option<&str>) -> Result<R> {
        let now = Utc::now();
        let mut qb = QueryBuilder::<Sqlite>::new("INSERT INTO ");
        qb.push(R::DESCRIPTOR.table).push(" (");
        for (name, _) in fields.iter() {
            qb.push(*name).push(", ");
        }
        if image.is_some() {
            qb.push("image, ");
        }
        qb.push("created_at, updated_at) VALUES (");

        let mut values = qb.separated(", ");
        for (_, value) in fields.iter() {
            values.push_bind(value.clone());
        }
        if let Some(url) = image {
            values.push_bind(url.to_string());
        }
        values.push_bind(now);
        values.push_bind(now);
        values.push_unseparated(") RETURNING *");

        let row = bounded(
            "insert",
            self.timeout,
            qb.build_query_as::<R>().fetch_one(&self.pool),
        )
        .await?;

        tracing::debug!(table = R::DESCRIPTOR.table, id = row.id(), "inserted row");
        Ok(row)
    }

    /// Overwrites the given fields; the image column is only touched when a
    /// new URL is supplied. `None` when the row no longer exists.
    pub async fn update<R: Record>(
        &self,
        id: i64,
        fields: &ValidFields,
        image: Option<&str>,
    ) -> Result<Option<R>> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE ");
        qb.push(R::DESCRIPTOR.table).push(" SET ");

        let mut set = qb.separated(", ");
        for (name, value) in fields.iter() {
            set.push(format!("{name} = "));
            set.push_bind_unseparated(value.clone());
        }
        if let Some(url) = image {
            set.push("image = ");
            set.push_bind_unseparated(url.to_string());
        }
        set.push("updated_at = ");
        set.push_bind_unseparated(Utc::now());

        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        bounded(
            "update",
            self.timeout,
            qb.build_query_as::<R>().fetch_optional(&self.pool),
        )
        .await
    }

    /// `false` when there was nothing to delete.
    pub async fn delete<R: Record>(&self, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", R::DESCRIPTOR.table);
        let result = bounded(
            "delete",
            self.timeout,
            sqlx::query(&sql).bind(id).execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count<R: Record>(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", R::DESCRIPTOR.table);
        let (count,): (i64,) = bounded(
            "count",
            self.timeout,
            sqlx::query_as(&sql).fetch_one(&self.pool),
        )
        .await?;
        Ok(count)
    }

    pub async fn stats(&self) -> Result<Stats> {
        use super::models::{Service, Slide, Work};

        Ok(Stats {
            total_users: self.count::<User>().await?,
            total_services: self.count::<Service>().await?,
            total_sliders: self.count::<Slide>().await?,
            total_works: self.count::<Work>().await?,
        })
    }

    // ------------------------------------------------------------------
    // Contact
    // ------------------------------------------------------------------

    pub async fn contact(&self) -> Result<Option<Contact>> {
        bounded(
            "find contact",
            self.timeout,
            sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE singleton = 1")
                .fetch_optional(&self.pool),
        )
        .await
    }

    /// Creates the singleton row or overwrites it in one statement.
    /// The returned row has `revision == 0` when it was just created.
    pub async fn upsert_contact(&self, fields: &ValidFields) -> Result<Contact> {
        let mut qb = QueryBuilder::<Sqlite>::new("INSERT INTO ");
        qb.push(CONTACT.table).push(" (singleton, ");
        for (name, _) in fields.iter() {
            qb.push(*name).push(", ");
        }
        qb.push("updated_at) VALUES (1, ");

        let mut values = qb.separated(", ");
        for (_, value) in fields.iter() {
            values.push_bind(value.clone());
        }
        values.push_bind(Utc::now());

        qb.push(") ON CONFLICT(singleton) DO UPDATE SET ");
        for (name, _) in fields.iter() {
            qb.push(format!("{name} = excluded.{name}, "));
        }
        qb.push("revision = revision + 1, updated_at = excluded.updated_at RETURNING *");

        bounded(
            "upsert contact",
            self.timeout,
            qb.build_query_as::<Contact>().fetch_one(&self.pool),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        bounded(
            "find user",
            self.timeout,
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ? COLLATE NOCASE")
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await
    }

    /// Whether another account already uses `email`.
    pub async fn email_taken(&self, email: &str, except_id: Option<i64>) -> Result<bool> {
        let (count,): (i64,) = bounded(
            "check email",
            self.timeout,
            sqlx::query_as(
                "SELECT COUNT(*) FROM users WHERE email = ? COLLATE NOCASE AND id != ?",
            )
            .bind(email)
            .bind(except_id.unwrap_or(-1))
            .fetch_one(&self.pool),
        )
        .await?;
        Ok(count > 0)
    }

    pub async fn insert_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let now = Utc::now();
        bounded(
            "insert user",
            self.timeout,
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (name, email, password_hash, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                RETURNING *
                "#,
            )
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool),
        )
        .await
    }

    pub async fn update_user(
        &self,
        id: i64,
        name: &str,
        email: &str,
        password_hash: Option<&str>,
    ) -> Result<Option<User>> {
        bounded(
            "update user",
            self.timeout,
            sqlx::query_as::<_, User>(
                r#"
                UPDATE users
                SET name = ?, email = ?, password_hash = COALESCE(?, password_hash), updated_at = ?
                WHERE id = ?
                RETURNING *
                "#,
            )
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Service, Work};
    use crate::entities::SERVICE;
    use std::collections::HashMap;

    async fn test_store() -> Store {
        Store::new(crate::db::test_pool().await, Duration::from_secs(5))
    }

    fn service_fields(title: &str) -> ValidFields {
        let input: HashMap<String, String> = [
            ("title", title),
            ("description", "Kombi bakımı ve onarımı"),
            ("icon", "fa-fire-alt"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        SERVICE.validate(&input).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = test_store().await;
        let created: Service = store
            .insert(&service_fields("Kombi"), Some("/uploads/a.jpg"))
            .await
            .unwrap();
        assert_eq!(created.title, "Kombi");
        assert_eq!(created.image, "/uploads/a.jpg");

        let found: Service = store.find(created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = test_store().await;
        let first: Service = store
            .insert(&service_fields("Birinci"), Some("/uploads/1.jpg"))
            .await
            .unwrap();
        let second: Service = store
            .insert(&service_fields("İkinci"), Some("/uploads/2.jpg"))
            .await
            .unwrap();

        let all: Vec<Service> = store.list().await.unwrap();
        assert_eq!(
            all.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
    }

    #[tokio::test]
    async fn test_update_keeps_image_without_new_url() {
        let store = test_store().await;
        let created: Service = store
            .insert(&service_fields("Eski"), Some("/uploads/old.jpg"))
            .await
            .unwrap();

        let updated: Service = store
            .update(created.id, &service_fields("Yeni"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Yeni");
        assert_eq!(updated.image, "/uploads/old.jpg");
        assert!(updated.updated_at >= created.updated_at);

        let replaced: Service = store
            .update(created.id, &service_fields("Yeni"), Some("/uploads/new.jpg"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.image, "/uploads/new.jpg");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_row() {
        let store = test_store().await;
        let missing: Option<Work> = store
            .update(42, &crate::entities::WORK.validate(&HashMap::new()).unwrap(), None)
            .await
            .unwrap();
        assert!(missing.is_none());
        assert!(!store.delete::<Work>(42).await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_contact_keeps_single_row() {
        let store = test_store().await;
        let mut input: HashMap<String, String> = [
            ("phone", "111"),
            ("whatsapp", "222"),
            ("email", "a@example.com"),
            ("address", "Ankara"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let first = store
            .upsert_contact(&CONTACT.validate(&input).unwrap())
            .await
            .unwrap();
        assert_eq!(first.revision, 0);

        input.insert("phone".into(), "333".into());
        let second = store
            .upsert_contact(&CONTACT.validate(&input).unwrap())
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.revision, 1);
        assert_eq!(second.phone, "333");

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contacts")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_email_taken_ignores_own_row_and_case() {
        let store = test_store().await;
        let user = store
            .insert_user("Ali", "ali@example.com", "hash")
            .await
            .unwrap();

        assert!(store.email_taken("ALI@example.com", None).await.unwrap());
        assert!(!store.email_taken("ali@example.com", Some(user.id)).await.unwrap());
        assert!(!store.email_taken("veli@example.com", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_user_keeps_hash_when_not_given() {
        let store = test_store().await;
        let user = store.insert_user("Ali", "ali@example.com", "h1").await.unwrap();

        let renamed = store
            .update_user(user.id, "Ali Veli", "ali@example.com", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.password_hash, "h1");

        let rehashed = store
            .update_user(user.id, "Ali Veli", "ali@example.com", Some("h2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rehashed.password_hash, "h2");
    }

    #[tokio::test]
    async fn test_stats_counts_rows() {
        let store = test_store().await;
        store.insert_user("Ali", "ali@example.com", "h").await.unwrap();
        let _: Service = store
            .insert(&service_fields("Kombi"), Some("/uploads/k.jpg"))
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.total_services, 1);
        assert_eq!(stats.total_sliders, 0);
        assert_eq!(stats.total_works, 0);
    }
}
