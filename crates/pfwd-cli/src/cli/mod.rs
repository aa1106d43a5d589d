//! CLI for the pfwd survey parameter forwarder.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pfwd_core::config;
use pfwd_core::forwarder::ParameterForwarder;
use pfwd_core::store::Store;

use commands::{
    run_entity_add, run_entity_show, run_page, run_session_clear, run_settings_set,
    run_settings_show,
};

/// Session id used when `--session` is not given.
pub const DEFAULT_SESSION: &str = "default";

/// Top-level CLI for pfwd.
#[derive(Debug, Parser)]
#[command(name = "pfwd")]
#[command(about = "pfwd: forward a survey URL parameter to an external API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the page flow for an entity and print the published result.
    Page {
        /// Entity (survey) identifier.
        entity_id: String,
        /// Raw query string of the page request, e.g. "username=alice".
        #[arg(long, default_value = "")]
        query: String,
        /// Session the cached parameter value belongs to.
        #[arg(long, default_value = DEFAULT_SESSION)]
        session: String,
    },

    /// Show or change per-entity settings.
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Manage entities in the store.
    #[command(subcommand)]
    Entity(EntityCommand),

    /// Manage stored sessions.
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print the merged settings schema of an entity as JSON.
    Show {
        /// Entity identifier.
        entity_id: String,
    },
    /// Store one or more settings for an entity.
    Set {
        /// Entity identifier.
        entity_id: String,
        /// Values as KEY=VALUE (e.g. paramName=username).
        #[arg(required = true, value_name = "KEY=VALUE")]
        values: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum EntityCommand {
    /// Insert an entity or replace its attributes.
    Add {
        /// Entity identifier.
        id: String,
        /// Attribute as KEY=VALUE; repeatable.
        #[arg(long = "attr", value_name = "KEY=VALUE")]
        attrs: Vec<String>,
    },
    /// Print an entity's attributes as JSON.
    Show {
        /// Entity identifier.
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Drop every cached value of a session.
    Clear {
        /// Session identifier.
        id: String,
    },
}

/// Split "KEY=VALUE"; the value may itself contain '='.
pub(crate) fn split_pair(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim(), v)),
        _ => anyhow::bail!("expected KEY=VALUE, got `{raw}`"),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let store = Store::open_default().await?;
        let pf = ParameterForwarder::with_curl(store.clone(), &cfg);

        match cli.command {
            CliCommand::Page {
                entity_id,
                query,
                session,
            } => run_page(&store, &pf, &cfg, &entity_id, &query, &session).await?,
            CliCommand::Settings(SettingsCommand::Show { entity_id }) => {
                run_settings_show(&pf, &cfg, &entity_id).await?
            }
            CliCommand::Settings(SettingsCommand::Set { entity_id, values }) => {
                run_settings_set(&pf, &entity_id, &values).await?
            }
            CliCommand::Entity(EntityCommand::Add { id, attrs }) => {
                run_entity_add(&store, &id, &attrs).await?
            }
            CliCommand::Entity(EntityCommand::Show { id }) => run_entity_show(&store, &id).await?,
            CliCommand::Session(SessionCommand::Clear { id }) => {
                run_session_clear(&store, &id).await?
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
