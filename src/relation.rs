//! Relation data as seen from this unit.
//!
//! A [`RelationView`] is a snapshot of the application data bag published by
//! the remote side of one relation, together with the remote units present
//! at the time it was read. Views are rebuilt on every hook invocation and
//! are never kept across events.

use std::collections::BTreeMap;

pub const SERVICE_HOSTNAME: &str = "service-hostname";
pub const SERVICE_NAME: &str = "service-name";
pub const SERVICE_PORT: &str = "service-port";

/// Fields that must all be set before an upstream is usable.
pub const REQUIRED_INGRESS_FIELDS: [&str; 3] = [SERVICE_HOSTNAME, SERVICE_NAME, SERVICE_PORT];

/// Ingress knobs passed through to the ingress controller when present.
pub const OPTIONAL_INGRESS_FIELDS: [&str; 8] = [
    "limit-rps",
    "limit-whitelist",
    "max-body-size",
    "retry-errors",
    "service-namespace",
    "session-cookie-max-age",
    "tls-secret-name",
    "path-routes",
];

pub const CACHE_SETTINGS: &str = "cache-settings";
pub const REFRESH_PATTERNS: &str = "refresh-patterns";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationView {
    pub relation_name: String,
    pub remote_app_name: String,
    pub fields: BTreeMap<String, String>,
    /// Remote units in the order the host runtime listed them.
    pub peer_units: Vec<String>,
}

impl RelationView {
    #[cfg(test)]
    pub fn new(relation_name: impl Into<String>, remote_app_name: impl Into<String>) -> Self {
        Self {
            relation_name: relation_name.into(),
            remote_app_name: remote_app_name.into(),
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    #[cfg(test)]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.peer_units.push(unit.into());
        self
    }

    /// Value of `key`, treating an empty string as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Extract `required` and `optional` keys from a relation.
///
/// Returns `None` unless the relation exists and every required key holds a
/// non-empty value. Optional keys are copied when set.
pub fn read_subset(
    relation: Option<&RelationView>,
    required: &[&str],
    optional: &[&str],
) -> Option<BTreeMap<String, String>> {
    let relation = relation?;
    let mut data = BTreeMap::new();
    for key in required {
        let value = relation.get(key)?;
        data.insert(key.to_string(), value.to_string());
    }
    for key in optional {
        if let Some(value) = relation.get(key) {
            data.insert(key.to_string(), value.to_string());
        }
    }
    Some(data)
}
