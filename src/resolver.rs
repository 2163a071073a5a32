//! Turns relation snapshots into the ingress payload and the squid render
//! context.

use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::relation::{
    read_subset, RelationView, CACHE_SETTINGS, OPTIONAL_INGRESS_FIELDS, REFRESH_PATTERNS,
    REQUIRED_INGRESS_FIELDS, SERVICE_NAME,
};
use crate::types::{CacheSettings, IngressSpec, RefreshPattern, RenderContext};

pub const DEFAULT_DOMAIN: &str = "svc.cluster.local";

/// The upstream relation squid is configured from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamSource {
    None,
    /// A client publishing ingress settings directly on `ingress-proxy`.
    Proxy(RelationView),
    /// A cache-aware client on `ingress-cache`.
    Cache(RelationView),
}

impl UpstreamSource {
    pub fn view(&self) -> Option<&RelationView> {
        match self {
            UpstreamSource::None => None,
            UpstreamSource::Proxy(view) | UpstreamSource::Cache(view) => Some(view),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, UpstreamSource::None)
    }
}

fn ingress_subset(relation: &RelationView, app_name: &str) -> Option<IngressSpec> {
    let data = read_subset(
        Some(relation),
        &REQUIRED_INGRESS_FIELDS,
        &OPTIONAL_INGRESS_FIELDS,
    )?;
    let spec = IngressSpec::from_relation_data(data, app_name);
    if spec.is_none() {
        warn!(
            "Relation {} from {} has an invalid service-port",
            relation.relation_name, relation.remote_app_name
        );
    }
    spec
}

/// Pick the upstream, `ingress-proxy` first, then `ingress-cache`.
///
/// A relation only qualifies once it carries a complete ingress subset.
pub fn select_upstream(
    proxy: Option<RelationView>,
    cache: Option<RelationView>,
    app_name: &str,
) -> UpstreamSource {
    if let Some(view) = proxy.filter(|v| ingress_subset(v, app_name).is_some()) {
        return UpstreamSource::Proxy(view);
    }
    if let Some(view) = cache.filter(|v| ingress_subset(v, app_name).is_some()) {
        return UpstreamSource::Cache(view);
    }
    UpstreamSource::None
}

/// First complete candidate wins; without one the static default applies.
pub fn resolve_ingress_spec(candidates: &[RelationView], app_name: &str) -> IngressSpec {
    candidates
        .iter()
        .find_map(|relation| ingress_subset(relation, app_name))
        .unwrap_or_else(|| IngressSpec::default_for(app_name))
}

fn decode<T: DeserializeOwned>(relation: &RelationView, key: &str) -> Option<T> {
    let raw = read_subset(Some(relation), &[key], &[])?.remove(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(
                "Ignoring malformed {} from {}: {}",
                key, relation.remote_app_name, e
            );
            None
        }
    }
}

/// Extra squid settings carried by the upstream. Absent or undecodable data
/// yields the empty value.
pub fn resolve_cache_settings(source: &UpstreamSource) -> CacheSettings {
    match source {
        UpstreamSource::None => CacheSettings::default(),
        UpstreamSource::Proxy(view) => decode(view, CACHE_SETTINGS).unwrap_or_default(),
        UpstreamSource::Cache(view) => CacheSettings {
            refresh_patterns: decode::<Vec<Value>>(view, REFRESH_PATTERNS)
                .map(RefreshPattern::from_values)
                .unwrap_or_default(),
            log_format: None,
        },
    }
}

/// Cluster-local addresses of the upstream units, in relation order.
pub fn resolve_peers(
    relation: &RelationView,
    service_name: &str,
    model_name: &str,
    domain: &str,
) -> Vec<String> {
    relation
        .peer_units
        .iter()
        .map(|unit| {
            format!(
                "{}.{}-endpoints.{}.{}",
                unit.replace('/', "-"),
                service_name,
                model_name,
                domain
            )
        })
        .collect()
}

/// Peers for whatever upstream was selected, named after the upstream's own
/// `service-name`.
pub fn upstream_peers(source: &UpstreamSource, model_name: &str, domain: &str) -> Vec<String> {
    match source.view() {
        Some(view) => {
            let service_name = view
                .get(SERVICE_NAME)
                .unwrap_or(view.remote_app_name.as_str());
            resolve_peers(view, service_name, model_name, domain)
        }
        None => Vec::new(),
    }
}

/// Merge the ingress spec, cache settings and operator config into a render
/// context. A log format from cache settings overrides the configured one.
pub fn build_render_context(
    spec: &IngressSpec,
    settings: CacheSettings,
    peers: Vec<String>,
    configured_log_format: Option<&str>,
) -> RenderContext {
    RenderContext {
        port: Some(spec.service_port),
        peers,
        refresh_patterns: settings.refresh_patterns,
        log_format: settings
            .log_format
            .or_else(|| configured_log_format.map(str::to_string))
            .filter(|f| !f.is_empty()),
    }
}
