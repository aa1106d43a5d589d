//! CLI command handlers, one file per command group.

mod entity;
mod page;
mod session;
mod settings;

pub use entity::{run_entity_add, run_entity_show};
pub use page::run_page;
pub use session::run_session_clear;
pub use settings::{run_settings_set, run_settings_show};

use anyhow::Result;
use pfwd_core::config::PfwdConfig;
use pfwd_core::events::EventPayload;

/// Payload naming the entity under the first accepted id parameter.
fn entity_payload(cfg: &PfwdConfig, entity_id: &str) -> Result<EventPayload> {
    let name = cfg.primary_entity_id_param()?;
    Ok(EventPayload::from_pairs([(name, entity_id)]))
}
