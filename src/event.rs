//! Hook events delivered by the host runtime and how each one is handled.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Relation endpoints this operator takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Provided to the ingress controller in front of squid.
    Ingress,
    /// Required side for plain proxy clients.
    IngressProxy,
    /// Required side for cache-aware clients.
    IngressCache,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [
        Endpoint::Ingress,
        Endpoint::IngressProxy,
        Endpoint::IngressCache,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Ingress => "ingress",
            Endpoint::IngressProxy => "ingress-proxy",
            Endpoint::IngressCache => "ingress-cache",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = EventParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| EventParseError::UnknownEndpoint(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventParseError {
    #[error("unknown hook: {0}")]
    UnknownHook(String),
    #[error("unknown relation endpoint: {0}")]
    UnknownEndpoint(String),
    #[error("no hook name in environment or arguments")]
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// The workload container can be managed (`<container>-pebble-ready`).
    WorkloadReady,
    RelationChanged(Endpoint),
    RelationBroken(Endpoint),
    ConfigChanged,
    LeaderElected,
    UpdateStatus,
    Install,
    Start,
    UpgradeCharm,
}

/// What the reconciler does for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Record that the workload is ready, then reconcile.
    MarkWorkloadReady,
    Reconcile,
    /// Evaluate and report status without touching the workload.
    Assess,
}

impl EventKind {
    pub fn entry(&self) -> Entry {
        match self {
            EventKind::WorkloadReady => Entry::MarkWorkloadReady,
            EventKind::RelationChanged(_)
            | EventKind::RelationBroken(_)
            | EventKind::ConfigChanged
            | EventKind::LeaderElected
            | EventKind::Install
            | EventKind::Start
            | EventKind::UpgradeCharm => Entry::Reconcile,
            EventKind::UpdateStatus => Entry::Assess,
        }
    }

    /// Endpoint whose relation is going away during this event.
    pub fn departing(&self) -> Option<Endpoint> {
        match self {
            EventKind::RelationBroken(endpoint) => Some(*endpoint),
            _ => None,
        }
    }

    /// Read the hook name the way the Juju agent hands it over.
    ///
    /// `container` is the workload container whose ready hook counts as
    /// [`EventKind::WorkloadReady`].
    pub fn from_env(container: &str) -> Result<Self, EventParseError> {
        let hook = std::env::var("JUJU_DISPATCH_PATH")
            .ok()
            .map(|p| p.rsplit('/').next().unwrap_or_default().to_string())
            .or_else(|| std::env::var("JUJU_HOOK_NAME").ok())
            .or_else(|| std::env::args().nth(1))
            .or_else(|| {
                std::env::args()
                    .next()
                    .and_then(|a| a.rsplit('/').next().map(str::to_string))
            })
            .filter(|h| !h.is_empty())
            .ok_or(EventParseError::Missing)?;
        Self::parse_hook(&hook, container)
    }

    pub fn parse_hook(hook: &str, container: &str) -> Result<Self, EventParseError> {
        match hook {
            "config-changed" => return Ok(EventKind::ConfigChanged),
            "leader-elected" => return Ok(EventKind::LeaderElected),
            "update-status" => return Ok(EventKind::UpdateStatus),
            "install" => return Ok(EventKind::Install),
            "start" => return Ok(EventKind::Start),
            "upgrade-charm" => return Ok(EventKind::UpgradeCharm),
            _ => {}
        }
        if hook.strip_suffix("-pebble-ready") == Some(container) {
            return Ok(EventKind::WorkloadReady);
        }
        if let Some(endpoint) = hook.strip_suffix("-relation-broken") {
            return Ok(EventKind::RelationBroken(endpoint.parse()?));
        }
        for suffix in RELATION_SUFFIXES {
            if let Some(endpoint) = hook.strip_suffix(suffix) {
                return Ok(EventKind::RelationChanged(endpoint.parse()?));
            }
        }
        Err(EventParseError::UnknownHook(hook.to_string()))
    }
}

const RELATION_SUFFIXES: [&str; 4] = [
    "-relation-created",
    "-relation-joined",
    "-relation-changed",
    "-relation-departed",
];
