//! Access to the host runtime's model: relation data, leadership and status.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::event::Endpoint;
use crate::relation::RelationView;
use crate::types::Status;

pub mod file;
pub mod hook_tools;
pub use file::FileBackend;
pub use hook_tools::HookTools;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no {0} relation")]
    RelationNotFound(Endpoint),
    #[error("{tool} exited with {status}: {stderr}")]
    Command {
        tool: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Snapshot of the remote application's data on `endpoint`, if related.
    async fn relation(&self, endpoint: Endpoint) -> Result<Option<RelationView>, BackendError>;

    /// Data this application currently publishes on `endpoint`.
    async fn local_app_data(
        &self,
        endpoint: Endpoint,
    ) -> Result<BTreeMap<String, String>, BackendError>;

    /// Replace the data this application publishes on `endpoint`. Only the
    /// leader may call this.
    async fn set_local_app_data(
        &self,
        endpoint: Endpoint,
        data: &BTreeMap<String, String>,
    ) -> Result<(), BackendError>;

    async fn is_leader(&self) -> Result<bool, BackendError>;

    async fn set_status(&self, status: &Status) -> Result<(), BackendError>;
}
