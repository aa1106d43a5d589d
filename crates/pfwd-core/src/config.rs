use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Plugin-wide setting values (the `[defaults]` section in config.toml).
///
/// These are the global scope of the settings schema: every entity inherits
/// them until it stores its own values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalDefaults {
    pub enabled: bool,
    pub request_url: String,
    pub authentication_bearer: String,
    pub param_name: String,
}

impl Default for GlobalDefaults {
    fn default() -> Self {
        Self {
            enabled: false,
            request_url: "https://api.example.com/get-smth".to_string(),
            authentication_bearer: "my-auth-bearer-token".to_string(),
            param_name: "username".to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/pfwd/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PfwdConfig {
    /// Prefix of every session key written by the forwarder.
    pub session_namespace: String,
    /// Query parameter whose presence drops the cached parameter value.
    pub reset_param: String,
    /// Event payload names tried, in order, to find the entity identifier.
    pub entity_id_params: Vec<String>,
    /// Optional curl connect timeout in seconds (None = libcurl default).
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Optional overall request timeout in seconds (None = no timeout).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub defaults: GlobalDefaults,
}

impl Default for PfwdConfig {
    fn default() -> Self {
        Self {
            session_namespace: "ExternalApiRequest".to_string(),
            reset_param: "newtest".to_string(),
            entity_id_params: vec![
                "surveyId".to_string(),
                "survey".to_string(),
                "surveyid".to_string(),
            ],
            connect_timeout_secs: None,
            timeout_secs: None,
            defaults: GlobalDefaults::default(),
        }
    }
}

impl PfwdConfig {
    /// Reject settings the forwarder cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.entity_id_params.iter().any(|n| !n.trim().is_empty()) {
            anyhow::bail!("config: entity_id_params must name at least one parameter");
        }
        Ok(())
    }

    /// Payload name an entity id is published under (the first accepted one).
    pub fn primary_entity_id_param(&self) -> Result<&str> {
        self.entity_id_params
            .iter()
            .map(|n| n.trim())
            .find(|n| !n.is_empty())
            .ok_or_else(|| anyhow::anyhow!("config: entity_id_params is empty"))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pfwd")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PfwdConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PfwdConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: PfwdConfig = toml::from_str(&data)?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = PfwdConfig::default();
        assert_eq!(cfg.session_namespace, "ExternalApiRequest");
        assert_eq!(cfg.reset_param, "newtest");
        assert_eq!(cfg.entity_id_params, ["surveyId", "survey", "surveyid"]);
        assert!(cfg.connect_timeout_secs.is_none());
        assert!(cfg.timeout_secs.is_none());
        assert!(!cfg.defaults.enabled);
        assert_eq!(cfg.defaults.param_name, "username");
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = PfwdConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: PfwdConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.session_namespace, cfg.session_namespace);
        assert_eq!(parsed.entity_id_params, cfg.entity_id_params);
        assert_eq!(parsed.defaults, cfg.defaults);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            session_namespace = "fwd"
            reset_param = "reset"
            entity_id_params = ["sid"]
            timeout_secs = 10

            [defaults]
            enabled = true
            request_url = "https://api.example.com/lookup"
            authentication_bearer = "secret"
            param_name = "token"
        "#;
        let cfg: PfwdConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.session_namespace, "fwd");
        assert_eq!(cfg.reset_param, "reset");
        assert_eq!(cfg.entity_id_params, ["sid"]);
        assert_eq!(cfg.timeout_secs, Some(10));
        assert!(cfg.connect_timeout_secs.is_none());
        assert!(cfg.defaults.enabled);
        assert_eq!(cfg.defaults.request_url, "https://api.example.com/lookup");
        assert_eq!(cfg.defaults.param_name, "token");
    }

    #[test]
    fn empty_entity_id_params_is_rejected() {
        let toml = r#"
            session_namespace = "ExternalApiRequest"
            reset_param = "newtest"
            entity_id_params = []
        "#;
        let cfg: PfwdConfig = toml::from_str(toml).unwrap();
        assert!(cfg.validate().is_err());
        assert!(cfg.primary_entity_id_param().is_err());

        let blank = PfwdConfig {
            entity_id_params: vec!["  ".to_string()],
            ..PfwdConfig::default()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn primary_entity_id_param_is_first_non_blank() {
        let cfg = PfwdConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.primary_entity_id_param().unwrap(), "surveyId");

        let cfg = PfwdConfig {
            entity_id_params: vec!["".to_string(), "sid".to_string()],
            ..PfwdConfig::default()
        };
        assert_eq!(cfg.primary_entity_id_param().unwrap(), "sid");
    }

    #[test]
    fn config_toml_missing_defaults_section_uses_builtin() {
        let toml = r#"
            session_namespace = "ExternalApiRequest"
            reset_param = "newtest"
            entity_id_params = ["surveyId"]
        "#;
        let cfg: PfwdConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.defaults, GlobalDefaults::default());
    }
}
