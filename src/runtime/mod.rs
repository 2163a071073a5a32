use async_trait::async_trait;
use thiserror::Error;

pub mod docker;
pub use docker::DockerRuntime;

#[derive(Debug, Error)]
pub enum WorkloadError {
    /// The runtime cannot perform this operation here (test harnesses,
    /// restricted sandboxes). Callers log and carry on.
    #[error("{0} is not supported by this runtime")]
    NotSupported(&'static str),
    #[error("docker error: {0}")]
    Docker(#[from] bollard::errors::Error),
    #[error("archive error: {0}")]
    Archive(#[from] std::io::Error),
}

/// Control surface of the container running squid.
#[async_trait]
pub trait WorkloadRuntime: Send + Sync {
    /// Whether the container can be managed right now.
    async fn is_ready(&self) -> Result<bool, WorkloadError>;

    /// Make sure the squid service is defined and started.
    async fn ensure_service(&self) -> Result<(), WorkloadError>;

    /// Current content of `path`, `None` if the file does not exist.
    async fn pull_config(&self, path: &str) -> Result<Option<String>, WorkloadError>;

    async fn push_config(&self, path: &str, content: &str) -> Result<(), WorkloadError>;

    async fn restart(&self) -> Result<(), WorkloadError>;
}
