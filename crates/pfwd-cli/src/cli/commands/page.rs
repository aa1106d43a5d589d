//! `pfwd page <entity-id>` – run the page flow once.

use anyhow::Result;
use pfwd_core::config::PfwdConfig;
use pfwd_core::events::{Event, EventOutcome};
use pfwd_core::forwarder::ParameterForwarder;
use pfwd_core::page::{PageContext, FORWARD_RESULT_SLOT};
use pfwd_core::request::QueryParams;
use pfwd_core::store::Store;
use serde_json::Value;

use super::entity_payload;

pub async fn run_page(
    store: &Store,
    pf: &ParameterForwarder,
    cfg: &PfwdConfig,
    entity_id: &str,
    query: &str,
    session_id: &str,
) -> Result<()> {
    let mut session = store.load_session(session_id).await?;
    let mut page = PageContext::new();
    let event = Event::PageRequested {
        payload: entity_payload(cfg, entity_id)?,
        query: QueryParams::parse(query),
    };

    let outcome = pf.dispatch(event, &mut session, &mut page).await?;
    if let EventOutcome::Page(outcome) = &outcome {
        tracing::info!(stage = ?outcome.stage, entity_id, "page flow done");
    }

    if session.is_dirty() {
        store.save_session(session_id, &session).await?;
    }

    let published = page.config(FORWARD_RESULT_SLOT).cloned().unwrap_or(Value::Null);
    println!("{}", serde_json::to_string_pretty(&published)?);
    Ok(())
}
