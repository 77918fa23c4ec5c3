use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "SNIP_LISTEN_ADDR";
pub const PUBLIC_BASE_URL_ENV: &str = "SNIP_PUBLIC_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "SNIP_STORAGE_BACKEND";
pub const REDIS_URL_ENV: &str = "SNIP_REDIS_URL";
pub const REDIS_NAMESPACE_ENV: &str = "SNIP_REDIS_NAMESPACE";
pub const CODE_LENGTH_ENV: &str = "SNIP_CODE_LENGTH";
pub const MAX_ATTEMPTS_ENV: &str = "SNIP_MAX_ATTEMPTS";
pub const STORE_TIMEOUT_MS_ENV: &str = "SNIP_STORE_TIMEOUT_MS";
pub const STORE_READY_TIMEOUT_SECS_ENV: &str = "SNIP_STORE_READY_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "SNIP_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "snip-gateway")]
pub struct Cli {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Origin prepended to codes when building short URLs.
    #[arg(long, env = PUBLIC_BASE_URL_ENV, default_value = DEFAULT_PUBLIC_BASE_URL)]
    pub public_base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = REDIS_URL_ENV, default_value = DEFAULT_REDIS_URL)]
    pub redis_url: String,

    #[arg(long, env = REDIS_NAMESPACE_ENV, default_value = "")]
    pub redis_namespace: String,

    #[arg(
        long,
        env = CODE_LENGTH_ENV,
        default_value_t = snip_generator::random::DEFAULT_CODE_LENGTH
    )]
    pub code_length: usize,

    /// Collisions tolerated per request before giving up.
    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = snip_generator::DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    #[arg(long, env = STORE_TIMEOUT_MS_ENV, default_value_t = 2000)]
    pub store_timeout_ms: u64,

    /// How long startup waits for the store before failing.
    #[arg(long, env = STORE_READY_TIMEOUT_SECS_ENV, default_value_t = 10)]
    pub store_ready_timeout_secs: u64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn store_ready_timeout(&self) -> Duration {
        Duration::from_secs(self.store_ready_timeout_secs)
    }
}
