//! `pfwd settings show|set` – per-entity settings.

use anyhow::Result;
use pfwd_core::config::PfwdConfig;
use pfwd_core::forwarder::ParameterForwarder;
use pfwd_core::settings::SettingValue;

use super::entity_payload;
use crate::cli::split_pair;

pub async fn run_settings_show(
    pf: &ParameterForwarder,
    cfg: &PfwdConfig,
    entity_id: &str,
) -> Result<()> {
    match pf.before_settings(&entity_payload(cfg, entity_id)?).await? {
        Some(settings) => println!("{}", serde_json::to_string_pretty(&settings)?),
        None => println!("No entity {entity_id} in store."),
    }
    Ok(())
}

pub async fn run_settings_set(
    pf: &ParameterForwarder,
    entity_id: &str,
    raw: &[String],
) -> Result<()> {
    let schema = pf.settings().global();
    let values = raw
        .iter()
        .map(|pair| -> Result<(String, SettingValue)> {
            let (key, value) = split_pair(pair)?;
            Ok((key.to_string(), schema.parse_value(key, value)?))
        })
        .collect::<Result<Vec<(String, SettingValue)>>>()?;

    pf.new_settings(entity_id, &values).await?;
    println!("Stored {} setting(s) for entity {entity_id}", values.len());
    Ok(())
}
