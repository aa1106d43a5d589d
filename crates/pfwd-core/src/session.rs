//! Session state and the cached forwarding-parameter value.
//!
//! A `Session` is a plain string map owned by one user session. The forwarder
//! reads and writes it during a request; the caller persists it afterwards
//! (see `Store::save_session`) only if it changed.

use std::collections::BTreeMap;

use crate::entity::Entity;
use crate::request::QueryParams;

/// Purpose tag of the cached forwarding-parameter value.
pub const PARAM_VALUE_PURPOSE: &str = "paramValue";

/// Key/value session storage with explicit invalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    values: BTreeMap<String, String>,
    dirty: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a session from persisted entries. The result is not dirty.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            values: entries.into_iter().collect(),
            dirty: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if self.values.get(&key) != Some(&value) {
            self.values.insert(key, value);
            self.dirty = true;
        }
    }

    /// Remove a key; returns the dropped value, if any.
    pub fn invalidate(&mut self, key: &str) -> Option<String> {
        let old = self.values.remove(key);
        if old.is_some() {
            self.dirty = true;
        }
        old
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True once any write or invalidation changed the contents.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

/// Session key of a cached value: `(namespace, entity id, purpose)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamCacheKey {
    pub namespace: String,
    pub entity_id: String,
    pub purpose: String,
}

impl ParamCacheKey {
    pub fn param_value(namespace: &str, entity_id: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            entity_id: entity_id.to_string(),
            purpose: PARAM_VALUE_PURPOSE.to_string(),
        }
    }

    /// String form used inside the session: "namespace::entity::purpose".
    pub fn to_string_key(&self) -> String {
        format!("{}::{}::{}", self.namespace, self.entity_id, self.purpose)
    }
}

/// Resolves the forwarding parameter's value for one request.
#[derive(Debug, Clone)]
pub struct SessionParamCache {
    namespace: String,
    reset_param: String,
}

impl SessionParamCache {
    pub fn new(namespace: impl Into<String>, reset_param: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            reset_param: reset_param.into(),
        }
    }

    pub fn key_for(&self, entity: &Entity) -> ParamCacheKey {
        ParamCacheKey::param_value(&self.namespace, &entity.id)
    }

    /// Value to forward: fresh query value (cached for later), else the
    /// cached one, else None. The reset flag drops the cache first.
    pub fn value(
        &self,
        session: &mut Session,
        entity: &Entity,
        param_name: &str,
        query: &QueryParams,
    ) -> Option<String> {
        let param_name = param_name.trim();
        if param_name.is_empty() {
            return None;
        }
        tracing::trace!(param_name, "looking up parameter value");

        let key = self.key_for(entity).to_string_key();
        if query.contains(&self.reset_param) && session.invalidate(&key).is_some() {
            tracing::debug!(key = %key, "reset flag present, dropped cached value");
        }

        if let Some(fresh) = query.non_empty(param_name) {
            session.set(key, fresh);
            return Some(fresh.to_string());
        }

        session
            .get(&key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}
