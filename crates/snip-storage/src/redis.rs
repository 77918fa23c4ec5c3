use async_trait::async_trait;
use redis::AsyncCommands;
use sha2::{Digest, Sha256};
use snip_core::error::{Result, StorageError};
use snip_core::repository::{InsertOutcome, ReadRepository, Repository, UrlRecord};
use snip_core::ShortCode;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// Writes the forward record and the reverse index entry in one step.
///
/// KEYS[1] = forward key, KEYS[2] = reverse key,
/// ARGV[1] = serialized record, ARGV[2] = short code.
/// Replies `{1, code}` when inserted, `{0, ''}` when the code is taken and
/// `{2, existing}` when the URL already has a code.
const INSERT_MAPPING_SCRIPT: &str = r#"
local existing = redis.call('GET', KEYS[2])
if existing then
  return {2, existing}
end
if redis.call('EXISTS', KEYS[1]) == 1 then
  return {0, ''}
end
redis.call('SET', KEYS[1], ARGV[1])
redis.call('SET', KEYS[2], ARGV[2])
return {1, ARGV[2]}
"#;

/// Connection options for [`RedisRepository`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct RedisOptions {
    /// Upper bound for connecting and for every individual command.
    #[builder(default = DEFAULT_COMMAND_TIMEOUT)]
    pub command_timeout: Duration,
    /// Optional key namespace, e.g. `"snip"` yields `snip:url:<code>`.
    #[builder(default, setter(into))]
    pub namespace: String,
}

impl Default for RedisOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Redis implementation of the repository contract.
///
/// Layout: `url:<code>` holds the JSON record, `rev:<sha256(long_url)>`
/// holds the code assigned to a long URL.
#[derive(Debug, Clone)]
pub struct RedisRepository {
    conn: redis::aio::MultiplexedConnection,
    prefix: String,
    command_timeout: Duration,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> StorageError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        StorageError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        StorageError::Unavailable(message)
    } else {
        StorageError::Operation(message)
    }
}

/// Hex-encoded SHA-256 of a long URL, used as the reverse index key suffix.
pub fn url_fingerprint(long_url: &str) -> String {
    hex::encode(Sha256::digest(long_url.as_bytes()))
}

impl RedisRepository {
    /// Wraps an established connection without checking it.
    pub fn new(conn: redis::aio::MultiplexedConnection, options: RedisOptions) -> Self {
        let prefix = if options.namespace.is_empty() {
            String::new()
        } else {
            format!("{}:", options.namespace)
        };

        Self {
            conn,
            prefix,
            command_timeout: options.command_timeout,
        }
    }

    /// Connects to `redis_url` and verifies the server answers `PING`.
    ///
    /// Fails fast with [`StorageError::Unavailable`] or
    /// [`StorageError::Timeout`] when the server is not ready.
    pub async fn connect(redis_url: &str, options: RedisOptions) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StorageError::Operation(format!("invalid redis url: {e}")))?;

        let conn = match tokio::time::timeout(
            options.command_timeout,
            client.get_multiplexed_async_connection(),
        )
        .await
        {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                return Err(StorageError::Unavailable(format!(
                    "failed to connect to Redis: {e}"
                )))
            }
            Err(_) => {
                return Err(StorageError::Timeout(format!(
                    "no connection to Redis within {:?}",
                    options.command_timeout
                )))
            }
        };

        let repository = Self::new(conn, options);
        repository.ping().await?;
        debug!("connected to Redis");
        Ok(repository)
    }

    fn forward_key(&self, code: &ShortCode) -> String {
        format!("{}url:{}", self.prefix, code.as_str())
    }

    fn reverse_key(&self, long_url: &str) -> String {
        format!("{}rev:{}", self.prefix, url_fingerprint(long_url))
    }

    /// Runs one command under the configured timeout.
    async fn run<T, F>(&self, operation: &str, command: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.command_timeout, command).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(operation, error = %e, "Redis command failed");
                Err(map_redis_error(operation, e))
            }
            Err(_) => {
                warn!(operation, timeout = ?self.command_timeout, "Redis command timed out");
                Err(StorageError::Timeout(format!(
                    "{operation}: no reply within {:?}",
                    self.command_timeout
                )))
            }
        }
    }

    fn serialize(record: &UrlRecord) -> Result<String> {
        serde_json::to_string(record)
            .map_err(|e| StorageError::Serialization(format!("failed to serialize record: {e}")))
    }
}

#[async_trait]
impl ReadRepository for RedisRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let key = self.forward_key(code);
        trace!(code = %code, "fetching URL record from Redis");

        let mut conn = self.conn.clone();
        let raw = self
            .run("GET", conn.get::<_, Option<String>>(&key))
            .await?;

        raw.map(|json| {
            serde_json::from_str::<UrlRecord>(&json).map_err(|e| {
                StorageError::InvalidData(format!("invalid record at key '{key}': {e}"))
            })
        })
        .transpose()
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        let key = self.forward_key(code);
        let mut conn = self.conn.clone();
        self.run("EXISTS", conn.exists::<_, bool>(&key)).await
    }

    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<ShortCode>> {
        let key = self.reverse_key(long_url);
        let mut conn = self.conn.clone();
        let code = self
            .run("GET", conn.get::<_, Option<String>>(&key))
            .await?;
        Ok(code.map(ShortCode::new_unchecked))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let cmd = redis::cmd("PING");
        let _: String = self.run("PING", cmd.query_async(&mut conn)).await?;
        Ok(())
    }
}

#[async_trait]
impl Repository for RedisRepository {
    async fn put_if_absent(&self, record: &UrlRecord) -> Result<bool> {
        let key = self.forward_key(&record.code);
        let json = Self::serialize(record)?;

        let mut conn = self.conn.clone();
        let inserted = self
            .run("SETNX", conn.set_nx::<_, _, bool>(&key, json))
            .await?;

        debug!(code = %record.code, inserted, "conditional insert");
        Ok(inserted)
    }

    async fn insert_mapping(&self, record: &UrlRecord) -> Result<InsertOutcome> {
        let forward = self.forward_key(&record.code);
        let reverse = self.reverse_key(&record.long_url);
        let json = Self::serialize(record)?;

        let script = redis::Script::new(INSERT_MAPPING_SCRIPT);
        let mut invocation = script.prepare_invoke();
        invocation
            .key(&forward)
            .key(&reverse)
            .arg(&json)
            .arg(record.code.as_str());

        let mut conn = self.conn.clone();
        let (status, code): (i64, String) = self
            .run("EVALSHA", invocation.invoke_async(&mut conn))
            .await?;

        let outcome = match status {
            1 => InsertOutcome::Inserted,
            0 => InsertOutcome::CodeTaken,
            2 => InsertOutcome::UrlMapped(ShortCode::new_unchecked(code)),
            other => {
                return Err(StorageError::InvalidData(format!(
                    "unexpected insert script status {other}"
                )))
            }
        };

        debug!(code = %record.code, ?outcome, "insert mapping");
        Ok(outcome)
    }
}
