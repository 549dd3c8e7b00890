use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;

/// Usernames exempt from auto-blocking. They are still scanned and
/// classified; the orchestrator just skips the block step for them.
#[derive(Clone)]
pub struct AllowlistRepository {
    pool: SqlitePool,
}

impl AllowlistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn add(&self, username: &str, note: Option<&str>) -> Result<bool> {
        let affected = sqlx::query(
            r#"INSERT OR REPLACE INTO allowlist (username, note) VALUES (?1, ?2)"#,
        )
        .bind(normalize_username(username))
        .bind(note)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    pub async fn remove(&self, username: &str) -> Result<bool> {
        let affected = sqlx::query(r#"DELETE FROM allowlist WHERE username = ?1"#)
            .bind(normalize_username(username))
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    pub async fn contains(&self, username: &str) -> Result<bool> {
        let row: Option<(String,)> =
            sqlx::query_as(r#"SELECT username FROM allowlist WHERE username = ?1"#)
                .bind(normalize_username(username))
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    pub async fn list(&self) -> Result<Vec<AllowlistRow>> {
        let rows = sqlx::query_as::<_, AllowlistRow>(
            r#"SELECT username, note, added_at FROM allowlist ORDER BY added_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Snapshot loaded once per scan; the orchestrator does membership
    /// checks against this set, not against the database.
    pub async fn all_usernames(&self) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(r#"SELECT username FROM allowlist"#)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

/// Handles are stored without the leading `@` and case-folded, matching how
/// usernames come out of profile hrefs.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_lowercase()
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AllowlistRow {
    pub username: String,
    pub note: Option<String>,
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_repo() -> AllowlistRepository {
        // in-memory sqlite: a second connection would see an empty db
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("memory pool");
        crate::db::ensure_schema(&pool).await.expect("schema");
        AllowlistRepository::new(pool)
    }

    #[tokio::test]
    async fn add_contains_remove_round_trip() {
        let repo = memory_repo().await;

        assert!(repo.add("SomeUser", Some("a friend")).await.unwrap());
        assert!(repo.contains("someuser").await.unwrap());
        assert!(repo.contains("@SOMEUSER").await.unwrap());

        let rows = repo.list().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username, "someuser");
        assert_eq!(rows[0].note.as_deref(), Some("a friend"));

        assert!(repo.remove("@someUser").await.unwrap());
        assert!(!repo.contains("someuser").await.unwrap());
        assert!(!repo.remove("someuser").await.unwrap());
    }

    #[tokio::test]
    async fn all_usernames_returns_normalized_set() {
        let repo = memory_repo().await;
        repo.add("@Alpha", None).await.unwrap();
        repo.add("beta", None).await.unwrap();

        let names = repo.all_usernames().await.unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains("alpha"));
        assert!(names.contains("beta"));
    }

    #[test]
    fn normalize_strips_handle_decoration() {
        assert_eq!(normalize_username("@User_Name"), "user_name");
        assert_eq!(normalize_username("  plain  "), "plain");
    }
}
