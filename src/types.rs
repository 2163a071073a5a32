//! Data structures shared by the resolver, the renderer and the reconciler.
//!
//! Everything in here is recomputed on each event. Nothing is persisted
//! except through [`crate::state`].

use std::collections::BTreeMap;
use std::fmt;

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::relation::{SERVICE_HOSTNAME, SERVICE_NAME, SERVICE_PORT};

/// Port squid listens on when no upstream dictates one.
pub const DEFAULT_SERVICE_PORT: u16 = 3128;

/// The payload advertised on the `ingress` relation.
///
/// `service_name` always carries this application's name so the ingress
/// controller routes to us rather than to whoever sits behind us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressSpec {
    pub service_hostname: String,
    pub service_name: String,
    pub service_port: u16,
    /// Optional ingress knobs keyed by their relation name (`limit-rps`, ...).
    pub extra: BTreeMap<String, String>,
}

impl IngressSpec {
    pub fn default_for(app_name: &str) -> Self {
        Self {
            service_hostname: app_name.to_string(),
            service_name: app_name.to_string(),
            service_port: DEFAULT_SERVICE_PORT,
            extra: BTreeMap::new(),
        }
    }

    /// Build from a complete relation subset. Returns `None` when the port
    /// is not a valid TCP port.
    pub fn from_relation_data(mut data: BTreeMap<String, String>, app_name: &str) -> Option<Self> {
        let service_port = data.remove(SERVICE_PORT)?.trim().parse().ok()?;
        let service_hostname = data.remove(SERVICE_HOSTNAME)?;
        data.remove(SERVICE_NAME);
        Some(Self {
            service_hostname,
            service_name: app_name.to_string(),
            service_port,
            extra: data,
        })
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }

    /// Flat hyphenated key/value form written to the relation data bag.
    pub fn to_relation_data(&self) -> BTreeMap<String, String> {
        let mut data = self.extra.clone();
        data.insert(SERVICE_HOSTNAME.into(), self.service_hostname.clone());
        data.insert(SERVICE_NAME.into(), self.service_name.clone());
        data.insert(SERVICE_PORT.into(), self.service_port.to_string());
        data
    }
}

/// One squid `refresh_pattern` rule.
///
/// `min`, `percent` and `max` take any JSON number, clients publish both
/// `20` and `20.0`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RefreshPattern {
    pub regex: String,
    #[serde(default, alias = "case-sensitive")]
    pub case_sensitive: bool,
    pub min: Number,
    pub percent: Number,
    pub max: Number,
    #[serde(default)]
    pub options: Vec<String>,
}

impl RefreshPattern {
    /// Decode rules one by one, skipping the ones that do not parse.
    pub fn from_values(values: Vec<Value>) -> Vec<Self> {
        values
            .into_iter()
            .enumerate()
            .filter_map(|(i, value)| match serde_json::from_value(value) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("Skipping refresh pattern #{}: {}", i, e);
                    None
                }
            })
            .collect()
    }
}

fn lenient_refresh_patterns<'de, D>(deserializer: D) -> Result<Vec<RefreshPattern>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Value>::deserialize(deserializer).map(RefreshPattern::from_values)
}

/// Extra squid settings published by a cache-aware upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheSettings {
    #[serde(
        default,
        rename = "refresh-patterns",
        alias = "refresh_patterns",
        deserialize_with = "lenient_refresh_patterns"
    )]
    pub refresh_patterns: Vec<RefreshPattern>,
    #[serde(
        default,
        rename = "log-format",
        alias = "log_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub log_format: Option<String>,
}

impl CacheSettings {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.refresh_patterns.is_empty() && self.log_format.is_none()
    }
}

/// Resolved input for [`crate::render::render`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    pub port: Option<u16>,
    pub peers: Vec<String>,
    pub refresh_patterns: Vec<RefreshPattern>,
    pub log_format: Option<String>,
}

/// Workload status reported back to the host runtime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Status {
    Active,
    Blocked(String),
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Blocked(_) => "blocked",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Status::Active => "",
            Status::Blocked(msg) => msg,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Active => write!(f, "active"),
            Status::Blocked(msg) => write!(f, "blocked: {}", msg),
        }
    }
}
