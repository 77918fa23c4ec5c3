use snip_storage::{RedisOptions, RedisRepository, StorageError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(2);

/// Connects to Redis, retrying while it is unreachable.
///
/// Gives up with the last error once `ready_timeout` has elapsed. Errors
/// other than unavailability (e.g. a malformed URL) are returned at once.
pub async fn connect_when_ready(
    redis_url: &str,
    options: RedisOptions,
    ready_timeout: Duration,
) -> Result<RedisRepository, StorageError> {
    let deadline = Instant::now() + ready_timeout;
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt = 1u32;

    loop {
        match RedisRepository::connect(redis_url, options.clone()).await {
            Ok(repository) => {
                info!(attempt, "store is ready");
                return Ok(repository);
            }
            Err(e) if e.is_unavailable() && Instant::now() + backoff < deadline => {
                warn!(attempt, error = %e, retry_in = ?backoff, "store not ready");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
