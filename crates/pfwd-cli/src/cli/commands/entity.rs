//! `pfwd entity add|show` – entities the forwarder resolves.

use anyhow::Result;
use pfwd_core::store::Store;
use serde_json::{Map, Value};

use crate::cli::split_pair;

pub async fn run_entity_add(store: &Store, id: &str, attrs: &[String]) -> Result<()> {
    let mut attributes = Map::new();
    for raw in attrs {
        let (key, value) = split_pair(raw)?;
        attributes.insert(key.to_string(), Value::String(value.to_string()));
    }
    store.upsert_entity(id, &attributes).await?;
    println!("Stored entity {id} ({} attribute(s))", attributes.len());
    Ok(())
}

pub async fn run_entity_show(store: &Store, id: &str) -> Result<()> {
    match store.fetch_entity(id).await? {
        Some(entity) => println!("{}", serde_json::to_string_pretty(&entity.attributes)?),
        None => println!("No entity {id} in store."),
    }
    Ok(())
}
