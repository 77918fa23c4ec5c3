pub mod memory;
pub mod redis;

pub use self::redis::{RedisOptions, RedisRepository};
pub use memory::InMemoryRepository;
pub use snip_core::repository::{InsertOutcome, ReadRepository, Repository, UrlRecord};
pub use snip_core::StorageError;
