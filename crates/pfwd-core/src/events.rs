//! Typed events the forwarder subscribes to.

use std::collections::HashMap;

use crate::request::QueryParams;
use crate::settings::{EntitySettings, SettingValue};

/// Named string parameters carried by an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPayload {
    params: HashMap<String, String>,
}

impl EventPayload {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A survey page is about to render.
    PageRequested,
    /// The admin UI asks for the settings of an entity.
    SettingsRequested,
    /// The admin UI submitted new settings for an entity.
    SettingsSubmitted,
}

#[derive(Debug, Clone)]
pub enum Event {
    PageRequested {
        payload: EventPayload,
        query: QueryParams,
    },
    SettingsRequested {
        payload: EventPayload,
    },
    SettingsSubmitted {
        entity_id: String,
        values: Vec<(String, SettingValue)>,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::PageRequested { .. } => EventKind::PageRequested,
            Event::SettingsRequested { .. } => EventKind::SettingsRequested,
            Event::SettingsSubmitted { .. } => EventKind::SettingsSubmitted,
        }
    }
}

/// What handling an event produced.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Page(crate::forwarder::PageOutcome),
    /// `None` when no entity could be resolved.
    Settings(Option<EntitySettings>),
    SettingsStored,
}
