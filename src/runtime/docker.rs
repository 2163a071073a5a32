use super::{WorkloadError, WorkloadRuntime};
use crate::config::WorkloadConfig;
use async_trait::async_trait;
use bollard::container::{
    DownloadFromContainerOptions, InspectContainerOptions, RestartContainerOptions,
    StartContainerOptions, UploadToContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::Docker;
use futures_util::stream::StreamExt;
use log::{debug, info};
use std::io::Read;
use std::path::Path;

pub struct DockerRuntime {
    docker: Docker,
    workload: WorkloadConfig,
}

fn is_not_found(err: &DockerError) -> bool {
    matches!(
        err,
        DockerError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

/// Single-file tar archive as expected by the Docker archive API.
fn archive_file(name: &str, content: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut header = tar::Header::new_gnu();
    header.set_path(name)?;
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();

    let mut ar = tar::Builder::new(Vec::new());
    ar.append(&header, content)?;
    ar.into_inner()
}

/// Content of the first regular file in a tar archive.
fn extract_first(archive: &[u8]) -> std::io::Result<Option<String>> {
    let mut ar = tar::Archive::new(archive);
    for entry in ar.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type().is_file() {
            let mut content = String::new();
            entry.read_to_string(&mut content)?;
            return Ok(Some(content));
        }
    }
    Ok(None)
}

fn split_path(path: &str) -> Result<(String, String), WorkloadError> {
    let path = Path::new(path);
    match (path.parent(), path.file_name()) {
        (Some(dir), Some(name)) => Ok((
            dir.to_string_lossy().into_owned(),
            name.to_string_lossy().into_owned(),
        )),
        _ => Err(WorkloadError::Archive(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("not a file path: {}", path.display()),
        ))),
    }
}

impl DockerRuntime {
    pub fn connect(workload: WorkloadConfig) -> Result<Self, WorkloadError> {
        // Unix socket on Linux, honours DOCKER_HOST.
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker, workload })
    }

    fn container(&self) -> &str {
        &self.workload.container
    }
}

#[async_trait]
impl WorkloadRuntime for DockerRuntime {
    async fn is_ready(&self) -> Result<bool, WorkloadError> {
        match self
            .docker
            .inspect_container(self.container(), None::<InspectContainerOptions>)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_service(&self) -> Result<(), WorkloadError> {
        let detail = self
            .docker
            .inspect_container(self.container(), None::<InspectContainerOptions>)
            .await?;
        let running = detail
            .state
            .and_then(|s| s.running)
            .unwrap_or(false);
        if !running {
            info!("Starting container {}", self.container());
            self.docker
                .start_container(self.container(), None::<StartContainerOptions<String>>)
                .await?;
        }
        Ok(())
    }

    async fn pull_config(&self, path: &str) -> Result<Option<String>, WorkloadError> {
        let opts = DownloadFromContainerOptions {
            path: path.to_string(),
        };
        let stream = self
            .docker
            .download_from_container(self.container(), Some(opts));
        futures_util::pin_mut!(stream);

        let mut archive = Vec::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => archive.extend_from_slice(&bytes),
                Err(e) if is_not_found(&e) => {
                    debug!("{} does not exist in {}", path, self.container());
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(extract_first(&archive)?)
    }

    async fn push_config(&self, path: &str, content: &str) -> Result<(), WorkloadError> {
        let (dir, name) = split_path(path)?;
        let archive = archive_file(&name, content.as_bytes())?;
        let opts = UploadToContainerOptions {
            path: dir,
            ..Default::default()
        };
        self.docker
            .upload_to_container(self.container(), Some(opts), archive.into())
            .await?;
        Ok(())
    }

    async fn restart(&self) -> Result<(), WorkloadError> {
        info!("Restarting container {}", self.container());
        let opts = RestartContainerOptions {
            t: self.workload.stop_timeout_secs as isize,
        };
        self.docker
            .restart_container(self.container(), Some(opts))
            .await?;
        Ok(())
    }
}
