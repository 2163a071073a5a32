use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::resolver::DEFAULT_DOMAIN;

/// Where relation data, leadership and status come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Juju hook tools (`relation-get`, `status-set`, ...) on `$PATH`.
    HookTools,
    /// A JSON snapshot on disk, see [`crate::backend::file`].
    File,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WorkloadConfig {
    /// Name of the container running squid.
    pub container: String,
    /// Path of squid.conf inside the container.
    pub config_path: String,
    pub stop_timeout_secs: i64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            container: "squid".into(),
            config_path: "/etc/squid/squid.conf".into(),
            stop_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub app_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
    pub model_name: String,
    pub domain: String,
    /// Operator-level `logformat combined` value. Cache settings from the
    /// upstream relation take precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_format: Option<String>,
    pub backend: BackendKind,
    pub relation_data_path: PathBuf,
    pub state_path: PathBuf,
    pub workload: WorkloadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "squid-ingress-cache".into(),
            unit_name: None,
            model_name: "default".into(),
            domain: DEFAULT_DOMAIN.into(),
            log_format: None,
            backend: BackendKind::HookTools,
            relation_data_path: "relations.json".into(),
            state_path: ".squid-ingress-cache.state.json".into(),
            workload: WorkloadConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mut config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("squid-ingress-cache.toml"))
            .merge(Json::file("squid-ingress-cache.json"))
            .merge(Env::prefixed("SQUID_").split("__"))
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        // Identity handed to us by the Juju agent
        if let Ok(unit) = std::env::var("JUJU_UNIT_NAME") {
            if std::env::var("SQUID_APP_NAME").is_err() {
                if let Some((app, _)) = unit.split_once('/') {
                    config.app_name = app.to_string();
                }
            }
            config.unit_name = Some(unit);
        }
        if let Ok(model) = std::env::var("JUJU_MODEL_NAME") {
            if std::env::var("SQUID_MODEL_NAME").is_err() {
                config.model_name = model;
            }
        }

        if config.app_name.is_empty() {
            anyhow::bail!("app_name must not be empty");
        }

        Ok(config)
    }
}
