use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use snip_core::error::Result;
use snip_core::repository::{InsertOutcome, ReadRepository, Repository, UrlRecord};
use snip_core::ShortCode;

/// In-memory implementation of the Repository trait using DashMap.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking.
///
/// Conditional writes go through the entry API, which holds the shard lock
/// for the duration of the check-and-insert. [`Repository::insert_mapping`]
/// always locks the reverse index entry before the forward entry.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: DashMap<String, UrlRecord>,
    reverse: DashMap<String, ShortCode>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
            reverse: DashMap::with_capacity(capacity),
        }
    }

    /// Number of stored records, aliases included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        Ok(self
            .records
            .get(code.as_str())
            .map(|entry| entry.value().clone()))
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.records.contains_key(code.as_str()))
    }

    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<ShortCode>> {
        Ok(self.reverse.get(long_url).map(|entry| entry.value().clone()))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn put_if_absent(&self, record: &UrlRecord) -> Result<bool> {
        match self.records.entry(record.code.as_str().to_owned()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(true)
            }
        }
    }

    async fn insert_mapping(&self, record: &UrlRecord) -> Result<InsertOutcome> {
        let reverse = match self.reverse.entry(record.long_url.clone()) {
            Entry::Occupied(existing) => {
                return Ok(InsertOutcome::UrlMapped(existing.get().clone()));
            }
            Entry::Vacant(slot) => slot,
        };

        match self.records.entry(record.code.as_str().to_owned()) {
            Entry::Occupied(_) => Ok(InsertOutcome::CodeTaken),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                reverse.insert(record.code.clone());
                Ok(InsertOutcome::Inserted)
            }
        }
    }
}
