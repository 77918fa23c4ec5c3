use crate::error::Result;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A stored URL record in the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// The short code this record is stored under.
    pub code: ShortCode,
    /// The original URL that was shortened.
    pub long_url: String,
    /// When the mapping was created.
    pub created_at: Timestamp,
}

impl UrlRecord {
    /// Creates a record stamped with the current time.
    pub fn new(code: ShortCode, long_url: impl Into<String>) -> Self {
        Self {
            code,
            long_url: long_url.into(),
            created_at: Timestamp::now(),
        }
    }
}

/// Result of an atomic forward + reverse index insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Both the forward record and the reverse index entry were written.
    Inserted,
    /// The short code is already taken. Nothing was written.
    CodeTaken,
    /// The long URL is already mapped to the contained code. Nothing was written.
    UrlMapped(ShortCode),
}

/// A read-only view of a repository.
///
/// This trait provides only the read operations from [`Repository`],
/// allowing read paths such as redirects to hold read-only access.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the URL record for a given short code.
    /// Returns `None` if the code does not exist.
    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>>;

    /// Checks whether a short code already exists in the repository.
    async fn exists(&self, code: &ShortCode) -> Result<bool>;

    /// Looks up the code previously assigned to `long_url` through the reverse index.
    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<ShortCode>>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts `record` under `record.code` unless the code is taken.
    ///
    /// Returns `false` without overwriting when the code already exists.
    /// The reverse index is left untouched.
    async fn put_if_absent(&self, record: &UrlRecord) -> Result<bool>;

    /// Atomically writes the forward record and the reverse index entry.
    ///
    /// Either both entries are written ([`InsertOutcome::Inserted`]) or
    /// neither is.
    async fn insert_mapping(&self, record: &UrlRecord) -> Result<InsertOutcome>;
}
