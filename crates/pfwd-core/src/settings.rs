//! Settings schema and its per-entity synchronisation.
//!
//! The global schema is built from the config file's `[defaults]`; per-entity
//! values live in the store. Both scopes share one shape, only `current`
//! differs.

use serde::{Deserialize, Serialize};

use crate::config::GlobalDefaults;
use crate::store::Store;

pub const KEY_ENABLED: &str = "enabled";
pub const KEY_REQUEST_URL: &str = "requestUrl";
pub const KEY_AUTHENTICATION_BEARER: &str = "authenticationBearer";
pub const KEY_PARAM_NAME: &str = "paramName";

/// Name the settings are reported under.
pub const COMPONENT_NAME: &str = "ExternalApiRequest";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown setting `{0}`")]
    UnknownKey(String),
    #[error("invalid value `{value}` for boolean setting `{key}`")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    Boolean,
    String,
}

/// A stored or default setting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Text(String),
}

impl SettingValue {
    /// Blank text counts as unset; booleans are always set.
    pub fn is_empty(&self) -> bool {
        match self {
            SettingValue::Bool(_) => false,
            SettingValue::Text(s) => s.trim().is_empty(),
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            SettingValue::Bool(b) => *b,
            SettingValue::Text(s) => matches!(s.trim(), "1" | "true" | "on" | "yes" | "Y"),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            SettingValue::Bool(b) => b.to_string(),
            SettingValue::Text(s) => s.clone(),
        }
    }
}

impl SettingKind {
    /// Parse a raw (e.g. command-line) value for a setting of this kind.
    pub fn parse(self, key: &str, raw: &str) -> Result<SettingValue, SettingsError> {
        match self {
            SettingKind::String => Ok(SettingValue::Text(raw.to_string())),
            SettingKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" | "y" => Ok(SettingValue::Bool(true)),
                "0" | "false" | "off" | "no" | "n" | "" => Ok(SettingValue::Bool(false)),
                _ => Err(SettingsError::InvalidValue {
                    key: key.to_string(),
                    value: raw.to_string(),
                }),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: SettingKind,
    pub label: String,
    pub default: SettingValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<SettingValue>,
}

impl SettingEntry {
    /// `current` if set, else `default`.
    pub fn value(&self) -> &SettingValue {
        self.current.as_ref().unwrap_or(&self.default)
    }
}

/// Ordered setting entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsSchema {
    pub entries: Vec<SettingEntry>,
}

impl SettingsSchema {
    /// Plugin-wide schema: built-in labels and defaults, `current` from config.
    pub fn global(defaults: &GlobalDefaults) -> Self {
        let builtin = GlobalDefaults::default();
        let entry = |key: &str, kind, label: &str, default, current| SettingEntry {
            key: key.to_string(),
            kind,
            label: label.to_string(),
            default,
            current: Some(current),
        };
        Self {
            entries: vec![
                entry(
                    KEY_ENABLED,
                    SettingKind::Boolean,
                    "Enable plugin for survey",
                    SettingValue::Bool(builtin.enabled),
                    SettingValue::Bool(defaults.enabled),
                ),
                entry(
                    KEY_REQUEST_URL,
                    SettingKind::String,
                    "External API request URL",
                    SettingValue::Text(builtin.request_url),
                    SettingValue::Text(defaults.request_url.clone()),
                ),
                entry(
                    KEY_AUTHENTICATION_BEARER,
                    SettingKind::String,
                    "External API request authentication Bearer header value",
                    SettingValue::Text(builtin.authentication_bearer),
                    SettingValue::Text(defaults.authentication_bearer.clone()),
                ),
                entry(
                    KEY_PARAM_NAME,
                    SettingKind::String,
                    "an input URL parameter to be injected to API request",
                    SettingValue::Text(builtin.param_name),
                    SettingValue::Text(defaults.param_name.clone()),
                ),
            ],
        }
    }

    pub fn get(&self, key: &str) -> Option<&SettingEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    /// Parse `key`'s raw value according to its declared kind.
    pub fn parse_value(&self, key: &str, raw: &str) -> Result<SettingValue, SettingsError> {
        let entry = self
            .get(key)
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
        entry.kind.parse(key, raw)
    }
}

/// Settings reported for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySettings {
    pub name: String,
    pub entity_id: String,
    pub settings: SettingsSchema,
}

/// The values the page flow needs, resolved for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardSettings {
    pub enabled: bool,
    pub request_url: String,
    pub authentication_bearer: String,
    pub param_name: String,
}

/// Reads and writes per-entity settings against the global schema.
#[derive(Clone)]
pub struct SettingsSync {
    store: Store,
    global: SettingsSchema,
}

impl SettingsSync {
    pub fn new(store: Store, defaults: &GlobalDefaults) -> Self {
        Self {
            store,
            global: SettingsSchema::global(defaults),
        }
    }

    pub fn global(&self) -> &SettingsSchema {
        &self.global
    }

    /// Global schema with each entity-stored, non-empty value as `current`.
    /// Keys the entity never stored carry no `current`.
    pub async fn on_settings_requested(&self, entity_id: &str) -> anyhow::Result<EntitySettings> {
        let stored = self.store.entity_settings(entity_id).await?;
        let entries = self
            .global
            .entries
            .iter()
            .map(|g| {
                let mut e = g.clone();
                e.current = stored
                    .get(&g.key)
                    .filter(|v| !v.is_empty())
                    .cloned();
                e
            })
            .collect();
        Ok(EntitySettings {
            name: COMPONENT_NAME.to_string(),
            entity_id: entity_id.to_string(),
            settings: SettingsSchema { entries },
        })
    }

    /// Persist every submitted pair, one write per key.
    pub async fn on_settings_submitted(
        &self,
        entity_id: &str,
        values: &[(String, SettingValue)],
    ) -> anyhow::Result<()> {
        for (key, value) in values {
            self.store.set_entity_setting(entity_id, key, value).await?;
        }
        tracing::debug!(entity_id, count = values.len(), "stored entity settings");
        Ok(())
    }

    /// Seed every setting from the global schema when `paramName` is unset.
    /// Returns true if it wrote. Safe to repeat.
    pub async fn ensure_defaults(&self, entity_id: &str) -> anyhow::Result<bool> {
        let param_name = self.store.entity_setting(entity_id, KEY_PARAM_NAME).await?;
        if param_name.is_some_and(|v| !v.is_empty()) {
            return Ok(false);
        }
        tracing::trace!(entity_id, "no param name, loading defaults");
        let values: Vec<(String, SettingValue)> = self
            .global
            .entries
            .iter()
            .map(|e| (e.key.clone(), e.value().clone()))
            .collect();
        self.on_settings_submitted(entity_id, &values).await?;
        Ok(true)
    }

    /// Report settings, then bootstrap defaults if needed.
    pub async fn load_settings(&self, entity_id: &str) -> anyhow::Result<(EntitySettings, bool)> {
        let reported = self.on_settings_requested(entity_id).await?;
        let bootstrapped = self.ensure_defaults(entity_id).await?;
        Ok((reported, bootstrapped))
    }

    /// Entity value per key, global value only for keys the entity never stored.
    /// A stored blank value is kept as is.
    pub async fn effective(&self, entity_id: &str) -> anyhow::Result<ForwardSettings> {
        let stored = self.store.entity_settings(entity_id).await?;
        let value = |key: &str| -> SettingValue {
            stored
                .get(key)
                .or_else(|| self.global.get(key).map(SettingEntry::value))
                .cloned()
                .unwrap_or(SettingValue::Text(String::new()))
        };
        Ok(ForwardSettings {
            enabled: value(KEY_ENABLED).as_bool(),
            request_url: value(KEY_REQUEST_URL).as_text(),
            authentication_bearer: value(KEY_AUTHENTICATION_BEARER).as_text(),
            param_name: value(KEY_PARAM_NAME).as_text().trim().to_string(),
        })
    }
}
