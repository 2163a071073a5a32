//! Reconcile state that has to survive between hook invocations.

use std::path::Path;

use anyhow::Context;
use log::warn;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReconcileState {
    /// Set once the workload container reported ready. Starts false.
    #[serde(default)]
    pub workload_ready: bool,
    /// SHA-256 of the last squid.conf handed to the workload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_digest: Option<String>,
}

impl ReconcileState {
    /// Load from `path`. A missing or unreadable file starts fresh.
    pub async fn load(path: &Path) -> Self {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!("Discarding corrupt state file {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!("Could not read state file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub async fn save(&self, path: &Path) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    pub fn mark_workload_ready(&mut self) {
        self.workload_ready = true;
    }
}

/// Hex encoded SHA-256 of a rendered config.
pub fn config_digest(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
