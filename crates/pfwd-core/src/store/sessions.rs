//! Session maps keyed by session id.

use anyhow::Result;
use sqlx::Row;

use super::db::Store;
use crate::session::Session;

impl Store {
    /// Load a session; an unknown id yields an empty session.
    pub async fn load_session(&self, session_id: &str) -> Result<Session> {
        let rows = sqlx::query(
            r#"
            SELECT key, value
            FROM sessions
            WHERE session_id = ?1
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Session::from_entries(rows.into_iter().map(|row| {
            let key: String = row.get("key");
            let value: String = row.get("value");
            (key, value)
        })))
    }

    /// Replace the stored session with `session`'s contents.
    pub async fn save_session(&self, session_id: &str, session: &Session) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(r#"DELETE FROM sessions WHERE session_id = ?1"#)
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        for (key, value) in session.entries() {
            sqlx::query(
                r#"
                INSERT INTO sessions (session_id, key, value)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(session_id)
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Drop a stored session. Returns the number of entries removed.
    pub async fn clear_session(&self, session_id: &str) -> Result<u64> {
        let r = sqlx::query(r#"DELETE FROM sessions WHERE session_id = ?1"#)
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }
}
