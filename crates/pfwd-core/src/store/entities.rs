//! Entity rows: direct primary-key lookup and upsert.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use sqlx::Row;

use super::db::{unix_timestamp, Store};
use crate::entity::Entity;

impl Store {
    /// Fetch one entity by primary key, bypassing any cache.
    pub async fn fetch_entity(&self, id: &str) -> Result<Option<Entity>> {
        let row = sqlx::query(
            r#"
            SELECT id, attributes_json
            FROM entities
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: String = row.get("id");
        let attributes_json: String = row.get("attributes_json");
        let attributes: Map<String, Value> = serde_json::from_str(&attributes_json)
            .with_context(|| format!("entity {id} has malformed attributes"))?;

        Ok(Some(Entity::new(id, attributes)))
    }

    /// Insert an entity or replace its attributes.
    pub async fn upsert_entity(&self, id: &str, attributes: &Map<String, Value>) -> Result<()> {
        let now = unix_timestamp();
        let attributes_json = serde_json::to_string(attributes)?;
        sqlx::query(
            r#"
            INSERT INTO entities (id, attributes_json, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(id) DO UPDATE SET
                attributes_json = excluded.attributes_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(attributes_json)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
