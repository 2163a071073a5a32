//! Model backend reading a JSON snapshot from disk.
//!
//! Handy outside a Juju agent (local runs, integration rigs). The document
//! looks like:
//!
//! ```json
//! {
//!   "leader": true,
//!   "relations": {
//!     "ingress-proxy": {
//!       "app": "mywebsite",
//!       "units": ["mywebsite/0"],
//!       "data": {"service-hostname": "example.com", "service-port": 80}
//!     },
//!     "ingress": {"app": "nginx-ingress-integrator", "local": {}}
//!   }
//! }
//! ```
//!
//! Non-string scalars in `data` are stringified on read. Local app data and
//! status writes are saved back to the same file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{BackendError, ModelBackend};
use crate::event::Endpoint;
use crate::relation::RelationView;
use crate::types::Status;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct RelationEntry {
    app: String,
    #[serde(default)]
    units: Vec<String>,
    #[serde(default)]
    data: BTreeMap<String, Value>,
    #[serde(default)]
    local: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct Snapshot {
    #[serde(default)]
    leader: bool,
    #[serde(default)]
    relations: BTreeMap<String, RelationEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<Status>,
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub struct FileBackend {
    path: PathBuf,
    snapshot: RwLock<Snapshot>,
}

impl FileBackend {
    /// Open the snapshot at `path`. A missing file behaves as an empty model.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No relation snapshot at {}", path.display());
                Snapshot::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            snapshot: RwLock::new(snapshot),
        })
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), BackendError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl ModelBackend for FileBackend {
    async fn relation(&self, endpoint: Endpoint) -> Result<Option<RelationView>, BackendError> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot
            .relations
            .get(endpoint.as_str())
            .map(|entry| RelationView {
                relation_name: endpoint.as_str().to_string(),
                remote_app_name: entry.app.clone(),
                fields: entry
                    .data
                    .iter()
                    .filter_map(|(k, v)| stringify(v).map(|v| (k.clone(), v)))
                    .collect(),
                peer_units: entry.units.clone(),
            }))
    }

    async fn local_app_data(
        &self,
        endpoint: Endpoint,
    ) -> Result<BTreeMap<String, String>, BackendError> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .relations
            .get(endpoint.as_str())
            .map(|entry| entry.local.clone())
            .ok_or(BackendError::RelationNotFound(endpoint))
    }

    async fn set_local_app_data(
        &self,
        endpoint: Endpoint,
        data: &BTreeMap<String, String>,
    ) -> Result<(), BackendError> {
        let mut snapshot = self.snapshot.write().await;
        let entry = snapshot
            .relations
            .get_mut(endpoint.as_str())
            .ok_or(BackendError::RelationNotFound(endpoint))?;
        entry.local = data.clone();
        self.persist(&snapshot).await
    }

    async fn is_leader(&self) -> Result<bool, BackendError> {
        Ok(self.snapshot.read().await.leader)
    }

    async fn set_status(&self, status: &Status) -> Result<(), BackendError> {
        let mut snapshot = self.snapshot.write().await;
        snapshot.status = Some(status.clone());
        self.persist(&snapshot).await
    }
}
