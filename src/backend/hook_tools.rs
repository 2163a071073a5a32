//! Model backend driving the Juju hook tools available inside a hook
//! context.

use std::collections::BTreeMap;

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use tokio::process::Command;

use super::{BackendError, ModelBackend};
use crate::event::Endpoint;
use crate::relation::RelationView;
use crate::types::Status;

#[derive(Debug, Clone)]
pub struct HookTools {
    app_name: String,
}

impl HookTools {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    async fn run(tool: &'static str, args: &[&str]) -> Result<String, BackendError> {
        debug!("Running {} {:?}", tool, args);
        let output = Command::new(tool).args(args).output().await?;
        if !output.status.success() {
            return Err(BackendError::Command {
                tool,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn run_json<T: DeserializeOwned>(
        tool: &'static str,
        args: &[&str],
    ) -> Result<T, BackendError> {
        let stdout = Self::run(tool, args).await?;
        Ok(serde_json::from_str(stdout.trim())?)
    }

    /// First relation id on `endpoint`, e.g. `ingress-proxy:3`.
    async fn relation_id(&self, endpoint: Endpoint) -> Result<Option<String>, BackendError> {
        let ids: Option<Vec<String>> =
            Self::run_json("relation-ids", &[endpoint.as_str(), "--format=json"]).await?;
        Ok(ids.unwrap_or_default().into_iter().next())
    }

    async fn app_data(
        &self,
        rel_id: &str,
        app: &str,
    ) -> Result<BTreeMap<String, String>, BackendError> {
        let data: Option<BTreeMap<String, String>> = Self::run_json(
            "relation-get",
            &["-r", rel_id, "--app", "--format=json", "-", app],
        )
        .await?;
        Ok(data.unwrap_or_default())
    }
}

/// `relation-set` arguments turning `current` into `desired`, clearing keys
/// that are no longer published.
fn relation_set_args(
    current: &BTreeMap<String, String>,
    desired: &BTreeMap<String, String>,
) -> Vec<String> {
    let cleared = current
        .keys()
        .filter(|k| !desired.contains_key(*k))
        .map(|k| format!("{}=", k));
    desired
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .chain(cleared)
        .collect()
}

#[async_trait]
impl ModelBackend for HookTools {
    async fn relation(&self, endpoint: Endpoint) -> Result<Option<RelationView>, BackendError> {
        let Some(rel_id) = self.relation_id(endpoint).await? else {
            return Ok(None);
        };
        let units: Option<Vec<String>> =
            Self::run_json("relation-list", &["-r", rel_id.as_str(), "--format=json"]).await?;
        let app = Self::run("relation-list", &["-r", rel_id.as_str(), "--app"])
            .await?
            .trim()
            .to_string();
        if app.is_empty() {
            return Ok(None);
        }
        let fields = self.app_data(&rel_id, &app).await?;
        Ok(Some(RelationView {
            relation_name: endpoint.as_str().to_string(),
            remote_app_name: app,
            fields,
            peer_units: units.unwrap_or_default(),
        }))
    }

    async fn local_app_data(
        &self,
        endpoint: Endpoint,
    ) -> Result<BTreeMap<String, String>, BackendError> {
        let rel_id = self
            .relation_id(endpoint)
            .await?
            .ok_or(BackendError::RelationNotFound(endpoint))?;
        self.app_data(&rel_id, &self.app_name).await
    }

    async fn set_local_app_data(
        &self,
        endpoint: Endpoint,
        data: &BTreeMap<String, String>,
    ) -> Result<(), BackendError> {
        let rel_id = self
            .relation_id(endpoint)
            .await?
            .ok_or(BackendError::RelationNotFound(endpoint))?;
        let current = self.app_data(&rel_id, &self.app_name).await?;
        let pairs = relation_set_args(&current, data);
        let mut args = vec!["-r", rel_id.as_str(), "--app"];
        args.extend(pairs.iter().map(String::as_str));
        Self::run("relation-set", &args).await?;
        Ok(())
    }

    async fn is_leader(&self) -> Result<bool, BackendError> {
        Self::run_json("is-leader", &["--format=json"]).await
    }

    async fn set_status(&self, status: &Status) -> Result<(), BackendError> {
        Self::run("status-set", &[status.name(), status.message()]).await?;
        Ok(())
    }
}
