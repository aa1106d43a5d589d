//! Entity (survey) resolution.
//!
//! The identifier comes from the event payload under one of several accepted
//! names; the record itself is read straight from the `entities` table by
//! primary key so that no caching layer can re-enter the forwarder.

use serde_json::{Map, Value};

use crate::events::EventPayload;
use crate::store::Store;

/// Resolved record: opaque id plus the attribute map of its row, verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub attributes: Map<String, Value>,
}

impl Entity {
    pub fn new(id: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// First non-empty identifier among `names`, tried in order.
pub fn entity_id_from<'a>(payload: &'a EventPayload, names: &[String]) -> Option<&'a str> {
    names.iter().find_map(|name| {
        payload
            .get(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .inspect(|id| tracing::trace!(name = %name, id = %id, "found entity id"))
    })
}

/// Looks entities up by primary key in the backing store.
#[derive(Clone)]
pub struct EntityResolver {
    store: Store,
}

impl EntityResolver {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// `None` when nothing matches or the store fails; both mean "nothing to do".
    pub async fn resolve(&self, id: &str) -> Option<Entity> {
        match self.store.fetch_entity(id).await {
            Ok(Some(entity)) => Some(entity),
            Ok(None) => {
                tracing::info!(id, "entity not found");
                None
            }
            Err(e) => {
                tracing::warn!(id, "entity lookup failed: {:#}", e);
                None
            }
        }
    }

    /// Pick the identifier out of `payload` and resolve it.
    pub async fn resolve_from(&self, payload: &EventPayload, names: &[String]) -> Option<Entity> {
        let Some(id) = entity_id_from(payload, names) else {
            tracing::info!("entity id not found in event payload");
            return None;
        };
        self.resolve(id).await
    }
}
