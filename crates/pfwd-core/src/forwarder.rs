//! The parameter forwarder: entity → settings → cached value → outbound call.
//!
//! Every step is best-effort. A missing entity, parameter name or value, a
//! store error or a transport failure all end in "no result" and the page
//! renders without forwarded data.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PfwdConfig;
use crate::entity::EntityResolver;
use crate::events::{Event, EventKind, EventOutcome, EventPayload};
use crate::forward::{CurlForwarder, Forward, ForwardRequest};
use crate::page::PageContext;
use crate::request::QueryParams;
use crate::session::{Session, SessionParamCache};
use crate::settings::{EntitySettings, SettingValue, SettingsSync};
use crate::store::Store;

/// Furthest point a page request reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    EntityResolved,
    SettingsLoaded,
    DefaultsBootstrapped,
    ParamResolved,
    Forwarded,
    Done,
}

/// Result of one page request.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome {
    pub stage: Stage,
    pub entity_id: Option<String>,
    pub result: Option<Value>,
}

impl PageOutcome {
    fn stopped(stage: Stage, entity_id: Option<&str>) -> Self {
        Self {
            stage,
            entity_id: entity_id.map(str::to_string),
            result: None,
        }
    }
}

pub struct ParameterForwarder {
    resolver: EntityResolver,
    settings: SettingsSync,
    cache: SessionParamCache,
    entity_id_params: Vec<String>,
    forwarder: Arc<dyn Forward>,
}

impl ParameterForwarder {
    pub fn new(store: Store, cfg: &PfwdConfig, forwarder: Arc<dyn Forward>) -> Self {
        Self {
            resolver: EntityResolver::new(store.clone()),
            settings: SettingsSync::new(store, &cfg.defaults),
            cache: SessionParamCache::new(&cfg.session_namespace, &cfg.reset_param),
            entity_id_params: cfg.entity_id_params.clone(),
            forwarder,
        }
    }

    /// Forwarder backed by libcurl, with the config's optional timeouts.
    pub fn with_curl(store: Store, cfg: &PfwdConfig) -> Self {
        let curl = CurlForwarder::new(
            cfg.connect_timeout_secs.map(Duration::from_secs),
            cfg.timeout_secs.map(Duration::from_secs),
        );
        Self::new(store, cfg, Arc::new(curl))
    }

    /// Events this component handles.
    pub fn subscriptions() -> &'static [EventKind] {
        &[
            EventKind::SettingsRequested,
            EventKind::SettingsSubmitted,
            EventKind::PageRequested,
        ]
    }

    pub fn settings(&self) -> &SettingsSync {
        &self.settings
    }

    /// Route an event to its handler.
    pub async fn dispatch(
        &self,
        event: Event,
        session: &mut Session,
        page: &mut PageContext,
    ) -> anyhow::Result<EventOutcome> {
        tracing::trace!(kind = ?event.kind(), "dispatching event");
        match event {
            Event::PageRequested { payload, query } => Ok(EventOutcome::Page(
                self.before_page(&payload, &query, session, page).await,
            )),
            Event::SettingsRequested { payload } => Ok(EventOutcome::Settings(
                self.before_settings(&payload).await?,
            )),
            Event::SettingsSubmitted { entity_id, values } => {
                self.new_settings(&entity_id, &values).await?;
                Ok(EventOutcome::SettingsStored)
            }
        }
    }

    /// Page flow. Always publishes into `page`, `null` when nothing came back.
    pub async fn before_page(
        &self,
        payload: &EventPayload,
        query: &QueryParams,
        session: &mut Session,
        page: &mut PageContext,
    ) -> PageOutcome {
        let outcome = self.page_flow(payload, query, session).await;
        tracing::debug!(stage = ?outcome.stage, has_result = outcome.result.is_some(), "page flow finished");
        page.publish_forward_result(outcome.result.clone());
        outcome
    }

    async fn page_flow(
        &self,
        payload: &EventPayload,
        query: &QueryParams,
        session: &mut Session,
    ) -> PageOutcome {
        let Some(entity) = self
            .resolver
            .resolve_from(payload, &self.entity_id_params)
            .await
        else {
            tracing::info!("missing entity, nothing to forward");
            return PageOutcome::stopped(Stage::Idle, None);
        };
        let id = Some(entity.id.as_str());

        let stage = match self.settings.load_settings(&entity.id).await {
            Ok((_, true)) => Stage::DefaultsBootstrapped,
            Ok((_, false)) => Stage::SettingsLoaded,
            Err(e) => {
                tracing::warn!(entity_id = %entity.id, "loading settings failed: {:#}", e);
                return PageOutcome::stopped(Stage::EntityResolved, id);
            }
        };
        let eff = match self.settings.effective(&entity.id).await {
            Ok(eff) => eff,
            Err(e) => {
                tracing::warn!(entity_id = %entity.id, "reading settings failed: {:#}", e);
                return PageOutcome::stopped(Stage::EntityResolved, id);
            }
        };
        tracing::debug!(
            entity_id = %entity.id,
            enabled = eff.enabled,
            param_name = %eff.param_name,
            "using entity settings for request"
        );
        if eff.param_name.is_empty() {
            tracing::info!(entity_id = %entity.id, "missing param name, nothing to forward");
            return PageOutcome::stopped(stage, id);
        }

        let Some(value) = self.cache.value(session, &entity, &eff.param_name, query) else {
            tracing::info!(entity_id = %entity.id, "missing param value, nothing to forward");
            return PageOutcome::stopped(stage, id);
        };

        if eff.request_url.trim().is_empty() {
            tracing::info!(entity_id = %entity.id, "missing request URL, nothing to forward");
            return PageOutcome::stopped(Stage::ParamResolved, id);
        }

        let request = ForwardRequest {
            url: eff.request_url,
            bearer_token: eff.authentication_bearer,
            param_name: eff.param_name,
            value,
        };
        let forwarder = Arc::clone(&self.forwarder);
        let joined = tokio::task::spawn_blocking(move || forwarder.forward(&request)).await;
        let result = match joined {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!(entity_id = %entity.id, "forward failed: {:#}", e);
                return PageOutcome::stopped(Stage::Forwarded, id);
            }
            Err(e) => {
                tracing::warn!(entity_id = %entity.id, "forward task failed: {}", e);
                return PageOutcome::stopped(Stage::Forwarded, id);
            }
        };

        PageOutcome {
            stage: Stage::Done,
            entity_id: Some(entity.id),
            result,
        }
    }

    /// Settings for the admin UI; seeds defaults on first view.
    pub async fn before_settings(
        &self,
        payload: &EventPayload,
    ) -> anyhow::Result<Option<EntitySettings>> {
        let Some(entity) = self
            .resolver
            .resolve_from(payload, &self.entity_id_params)
            .await
        else {
            tracing::trace!("entity not set, skipping settings");
            return Ok(None);
        };
        let (reported, bootstrapped) = self.settings.load_settings(&entity.id).await?;
        if bootstrapped {
            return Ok(Some(self.settings.on_settings_requested(&entity.id).await?));
        }
        Ok(Some(reported))
    }

    pub async fn new_settings(
        &self,
        entity_id: &str,
        values: &[(String, SettingValue)],
    ) -> anyhow::Result<()> {
        self.settings.on_settings_submitted(entity_id, values).await
    }
}
