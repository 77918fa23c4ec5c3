use thiserror::Error;

/// Failures while provisioning a throwaway store for integration tests.
#[derive(Debug, Error)]
pub enum TestInfraError {
    /// Docker could not start the container or report its mapped port.
    #[error("failed to provision test container: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    /// The container is up but the Redis server inside rejected a command.
    #[error("test Redis server rejected a command: {0}")]
    Redis(#[from] redis::RedisError),
}

pub type Result<T> = std::result::Result<T, TestInfraError>;
