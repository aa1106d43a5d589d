//! Request-scoped configuration slots read by the page renderer.

use serde_json::Value;
use std::collections::BTreeMap;

/// Slot the forward result is published under.
pub const FORWARD_RESULT_SLOT: &str = "ExternalApiPluginData";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContext {
    config: BTreeMap<String, Value>,
}

impl PageContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_config(&mut self, key: impl Into<String>, value: Value) {
        self.config.insert(key.into(), value);
    }

    pub fn config(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// Publish the forward result; `None` becomes JSON `null`.
    pub fn publish_forward_result(&mut self, result: Option<Value>) {
        self.set_config(FORWARD_RESULT_SLOT, result.unwrap_or(Value::Null));
    }

    /// Published forward result, `None` when absent or null.
    pub fn forward_result(&self) -> Option<&Value> {
        self.config(FORWARD_RESULT_SLOT).filter(|v| !v.is_null())
    }
}
