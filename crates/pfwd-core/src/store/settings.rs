//! Per-entity setting values.

use anyhow::{Context, Result};
use sqlx::Row;
use std::collections::HashMap;

use super::db::{unix_timestamp, Store};
use crate::settings::SettingValue;

impl Store {
    /// All values stored for an entity.
    pub async fn entity_settings(&self, entity_id: &str) -> Result<HashMap<String, SettingValue>> {
        let rows = sqlx::query(
            r#"
            SELECT key, value_json
            FROM entity_settings
            WHERE entity_id = ?1
            "#,
        )
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            let key: String = row.get("key");
            let value_json: String = row.get("value_json");
            let value: SettingValue = serde_json::from_str(&value_json)
                .with_context(|| format!("setting {key} of entity {entity_id} is malformed"))?;
            out.insert(key, value);
        }
        Ok(out)
    }

    pub async fn entity_setting(&self, entity_id: &str, key: &str) -> Result<Option<SettingValue>> {
        let row = sqlx::query(
            r#"
            SELECT value_json
            FROM entity_settings
            WHERE entity_id = ?1 AND key = ?2
            "#,
        )
        .bind(entity_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let value_json: String = row.get("value_json");
            serde_json::from_str::<SettingValue>(&value_json)
                .with_context(|| format!("setting {key} of entity {entity_id} is malformed"))
        })
        .transpose()
    }

    /// Write one value; last write wins.
    pub async fn set_entity_setting(
        &self,
        entity_id: &str,
        key: &str,
        value: &SettingValue,
    ) -> Result<()> {
        let now = unix_timestamp();
        let value_json = serde_json::to_string(value)?;
        sqlx::query(
            r#"
            INSERT INTO entity_settings (entity_id, key, value_json, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(entity_id, key) DO UPDATE SET
                value_json = excluded.value_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(entity_id)
        .bind(key)
        .bind(value_json)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
