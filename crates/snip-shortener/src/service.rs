use crate::validate::validate_url;
use async_trait::async_trait;
use snip_core::{
    InsertOutcome, ReadRepository, Repository, ShortCode, ShortenParams, Shortener,
    ShortenerError, UrlRecord,
};
use snip_generator::{generate_within, AttemptBudget, Generator, DEFAULT_MAX_ATTEMPTS};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `Repository` and a `Generator` to handle:
/// - URL validation
/// - Idempotent re-shortening through the reverse index
/// - Custom aliases
/// - Bounded retries when generated codes collide
///
/// Storage failures are never retried here; they propagate to the caller.
#[derive(Debug)]
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
    max_attempts: u32,
}

impl<R, G> Clone for ShortenerService<R, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
            max_attempts: self.max_attempts,
        }
    }
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    /// Creates a new `ShortenerService` that draws at most
    /// [`DEFAULT_MAX_ATTEMPTS`] candidates per request, counting both
    /// existence collisions and lost insert races.
    pub fn new(repository: R, generator: G) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Overrides the collision budget. Values below 1 are raised to 1.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    async fn shorten_with_alias(
        &self,
        alias: ShortCode,
        long_url: &str,
    ) -> Result<ShortCode, ShortenerError> {
        let record = UrlRecord::new(alias.clone(), long_url);
        if !self.repository.put_if_absent(&record).await? {
            debug!(code = %alias, "custom alias already taken");
            return Err(ShortenerError::AliasConflict(alias.to_string()));
        }

        info!(code = %alias, url = %long_url, "created custom alias");
        Ok(alias)
    }

    async fn shorten_generated(&self, long_url: &str) -> Result<ShortCode, ShortenerError> {
        if let Some(existing) = self.repository.find_by_long_url(long_url).await? {
            trace!(code = %existing, "long url already shortened");
            return Ok(existing);
        }

        let repository = &self.repository;
        let mut budget = AttemptBudget::new(self.max_attempts);
        loop {
            let candidate = generate_within(&*self.generator, &mut budget, |code| async move {
                repository.exists(&code).await
            })
            .await?;

            let record = UrlRecord::new(candidate.clone(), long_url);
            match self.repository.insert_mapping(&record).await? {
                InsertOutcome::Inserted => {
                    info!(code = %candidate, url = %long_url, "created short code");
                    return Ok(candidate);
                }
                InsertOutcome::UrlMapped(existing) => {
                    debug!(code = %existing, "concurrent request shortened the same url");
                    return Ok(existing);
                }
                InsertOutcome::CodeTaken => {
                    warn!(
                        code = %candidate,
                        attempt = budget.used(),
                        "short code taken by concurrent insert, retrying"
                    );
                }
            }
        }
    }
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode, ShortenerError> {
        let long_url = validate_url(&params.long_url)?;

        match params.custom_alias {
            Some(alias) => self.shorten_with_alias(alias, long_url).await,
            None => self.shorten_generated(long_url).await,
        }
    }

    async fn resolve(&self, code: &ShortCode) -> Result<String, ShortenerError> {
        trace!(code = %code, "resolving short code");

        match self.repository.get(code).await? {
            Some(record) => {
                debug!(code = %code, url = %record.long_url, "resolved short code");
                Ok(record.long_url)
            }
            None => {
                trace!(code = %code, "short code not found");
                Err(ShortenerError::CodeNotFound(code.to_string()))
            }
        }
    }

    async fn ready(&self) -> Result<(), ShortenerError> {
        self.repository.ping().await.map_err(ShortenerError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use snip_core::StorageError;
    use snip_generator::RandomGenerator;
    use snip_storage::InMemoryRepository;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Barrier;

    /// Hands out a fixed list of codes in order.
    struct Scripted(Mutex<VecDeque<&'static str>>);

    impl Scripted {
        fn new(codes: &[&'static str]) -> Self {
            Self(Mutex::new(codes.iter().copied().collect()))
        }
    }

    impl Generator for Scripted {
        type Output = ShortCode;

        fn generate(&self) -> ShortCode {
            let mut codes = self.0.lock().unwrap();
            let next = if codes.len() > 1 {
                codes.pop_front().unwrap()
            } else {
                codes[0]
            };
            ShortCode::new_unchecked(next)
        }
    }

    /// Answers every existence check with "free", so conflicts only show up
    /// at insert time, as they do when another request wins the race.
    #[derive(Default)]
    struct StaleExists(InMemoryRepository);

    #[async_trait]
    impl ReadRepository for StaleExists {
        async fn get(&self, code: &ShortCode) -> snip_core::error::Result<Option<UrlRecord>> {
            self.0.get(code).await
        }

        async fn exists(&self, _code: &ShortCode) -> snip_core::error::Result<bool> {
            Ok(false)
        }

        async fn find_by_long_url(
            &self,
            long_url: &str,
        ) -> snip_core::error::Result<Option<ShortCode>> {
            self.0.find_by_long_url(long_url).await
        }

        async fn ping(&self) -> snip_core::error::Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl Repository for StaleExists {
        async fn put_if_absent(&self, record: &UrlRecord) -> snip_core::error::Result<bool> {
            self.0.put_if_absent(record).await
        }

        async fn insert_mapping(
            &self,
            record: &UrlRecord,
        ) -> snip_core::error::Result<InsertOutcome> {
            self.0.insert_mapping(record).await
        }
    }

    /// A store whose connection is gone. Counts write attempts.
    #[derive(Default)]
    struct Unreachable {
        writes: AtomicUsize,
    }

    fn down() -> StorageError {
        StorageError::Unavailable("connection refused".to_string())
    }

    #[async_trait]
    impl ReadRepository for Unreachable {
        async fn get(&self, _code: &ShortCode) -> snip_core::error::Result<Option<UrlRecord>> {
            Err(down())
        }

        async fn exists(&self, _code: &ShortCode) -> snip_core::error::Result<bool> {
            Err(down())
        }

        async fn find_by_long_url(
            &self,
            _long_url: &str,
        ) -> snip_core::error::Result<Option<ShortCode>> {
            Err(down())
        }

        async fn ping(&self) -> snip_core::error::Result<()> {
            Err(down())
        }
    }

    #[async_trait]
    impl Repository for Unreachable {
        async fn put_if_absent(&self, _record: &UrlRecord) -> snip_core::error::Result<bool> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(down())
        }

        async fn insert_mapping(
            &self,
            _record: &UrlRecord,
        ) -> snip_core::error::Result<InsertOutcome> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(down())
        }
    }

    /// Every other existence check reports a collision, and every insert
    /// loses to a concurrent writer.
    #[derive(Default)]
    struct Contended {
        exists_calls: AtomicUsize,
        inserts: AtomicUsize,
    }

    #[async_trait]
    impl ReadRepository for Contended {
        async fn get(&self, _code: &ShortCode) -> snip_core::error::Result<Option<UrlRecord>> {
            Ok(None)
        }

        async fn exists(&self, _code: &ShortCode) -> snip_core::error::Result<bool> {
            let call = self.exists_calls.fetch_add(1, Ordering::SeqCst);
            Ok(call % 2 == 0)
        }

        async fn find_by_long_url(
            &self,
            _long_url: &str,
        ) -> snip_core::error::Result<Option<ShortCode>> {
            Ok(None)
        }

        async fn ping(&self) -> snip_core::error::Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl Repository for Contended {
        async fn put_if_absent(&self, _record: &UrlRecord) -> snip_core::error::Result<bool> {
            Ok(false)
        }

        async fn insert_mapping(
            &self,
            _record: &UrlRecord,
        ) -> snip_core::error::Result<InsertOutcome> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Ok(InsertOutcome::CodeTaken)
        }
    }

    fn test_service() -> ShortenerService<InMemoryRepository, RandomGenerator> {
        ShortenerService::new(InMemoryRepository::new(), RandomGenerator::default())
    }

    #[tokio::test]
    async fn shorten_then_resolve_round_trips() {
        let service = test_service();

        let code = service
            .shorten(ShortenParams::new("https://example.com/a/b?x=1"))
            .await
            .unwrap();
        assert_eq!(code.as_str().len(), 6);
        assert!(service.repository().exists(&code).await.unwrap());

        let url = service.resolve(&code).await.unwrap();
        assert_eq!(url, "https://example.com/a/b?x=1");
    }

    #[tokio::test]
    async fn shorten_is_idempotent() {
        let service = test_service();

        let first = service
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap();
        let second = service
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(service.repository().len(), 1);
    }

    #[tokio::test]
    async fn distinct_urls_get_distinct_codes() {
        let service = test_service();

        let a = service
            .shorten(ShortenParams::new("https://example.com/a"))
            .await
            .unwrap();
        let b = service
            .shorten(ShortenParams::new("https://example.com/b"))
            .await
            .unwrap();

        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn resolve_unknown_code() {
        let service = test_service();

        let err = service
            .resolve(&ShortCode::new("zzzzzz").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::CodeNotFound(code) if code == "zzzzzz"));
    }

    #[tokio::test]
    async fn shorten_with_invalid_url_fails_without_writing() {
        let service = test_service();

        let err = service
            .shorten(ShortenParams::new("not-a-valid-url"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidUrl(_)));
        assert!(service.repository().is_empty());
    }

    #[tokio::test]
    async fn shorten_with_custom_alias() {
        let service = test_service();

        let alias = ShortCode::custom_alias("my-alias").unwrap();
        let code = service
            .shorten(ShortenParams::new("https://example.com").with_alias(alias))
            .await
            .unwrap();

        assert_eq!(code.as_str(), "my-alias");
        assert_eq!(
            service.resolve(&code).await.unwrap(),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn shorten_with_duplicate_alias_fails() {
        let service = test_service();
        let alias = ShortCode::custom_alias("my-alias").unwrap();

        service
            .shorten(ShortenParams::new("https://example1.com").with_alias(alias.clone()))
            .await
            .unwrap();
        let err = service
            .shorten(ShortenParams::new("https://example2.com").with_alias(alias.clone()))
            .await
            .unwrap_err();

        assert!(matches!(err, ShortenerError::AliasConflict(_)));
        assert_eq!(
            service.resolve(&alias).await.unwrap(),
            "https://example1.com"
        );
    }

    #[tokio::test]
    async fn alias_does_not_replace_generated_code() {
        let service = test_service();

        let generated = service
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap();
        service
            .shorten(
                ShortenParams::new("https://example.com")
                    .with_alias(ShortCode::custom_alias("vanity").unwrap()),
            )
            .await
            .unwrap();

        let again = service
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap();
        assert_eq!(again, generated);
    }

    #[tokio::test]
    async fn colliding_candidates_are_skipped() {
        let repo = InMemoryRepository::new();
        repo.put_if_absent(&UrlRecord::new(
            ShortCode::new_unchecked("aaaaaa"),
            "https://taken.com",
        ))
        .await
        .unwrap();

        let service = ShortenerService::new(repo, Scripted::new(&["aaaaaa", "bbbbbb"]));
        let code = service
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap();

        assert_eq!(code.as_str(), "bbbbbb");
        assert_eq!(
            service
                .resolve(&ShortCode::new_unchecked("aaaaaa"))
                .await
                .unwrap(),
            "https://taken.com"
        );
    }

    #[tokio::test]
    async fn lost_insert_race_retries_with_new_code() {
        let repo = StaleExists::default();
        repo.0
            .put_if_absent(&UrlRecord::new(
                ShortCode::new_unchecked("aaaaaa"),
                "https://taken.com",
            ))
            .await
            .unwrap();

        let service = ShortenerService::new(repo, Scripted::new(&["aaaaaa", "cccccc"]));
        let code = service
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap();

        assert_eq!(code.as_str(), "cccccc");
    }

    #[tokio::test]
    async fn generation_exhausted_after_bounded_attempts() {
        let repo = InMemoryRepository::new();
        repo.put_if_absent(&UrlRecord::new(
            ShortCode::new_unchecked("aaaaaa"),
            "https://taken.com",
        ))
        .await
        .unwrap();

        let service =
            ShortenerService::new(repo, Scripted::new(&["aaaaaa"])).with_max_attempts(3);
        let err = service
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::GenerationExhausted { attempts: 3 }
        ));
        assert_eq!(service.repository().len(), 1);
    }

    #[tokio::test]
    async fn collisions_and_lost_races_share_one_budget() {
        let service = ShortenerService::new(Contended::default(), RandomGenerator::default());

        let err = service
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::GenerationExhausted {
                attempts: DEFAULT_MAX_ATTEMPTS
            }
        ));
        let repo = service.repository();
        assert_eq!(
            repo.exists_calls.load(Ordering::SeqCst),
            DEFAULT_MAX_ATTEMPTS as usize
        );
        assert_eq!(
            repo.inserts.load(Ordering::SeqCst),
            DEFAULT_MAX_ATTEMPTS as usize / 2
        );
    }

    #[tokio::test]
    async fn storage_unavailable_propagates_without_writes() {
        let service = ShortenerService::new(Unreachable::default(), RandomGenerator::default());

        let err = service
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::StorageUnavailable(_)));
        assert_eq!(service.repository().writes.load(Ordering::SeqCst), 0);

        let err = service
            .resolve(&ShortCode::new("abc123").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::StorageUnavailable(_)));

        let err = service.ready().await.unwrap_err();
        assert!(matches!(err, ShortenerError::StorageUnavailable(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_shortening_of_one_url_yields_one_record() {
        const TASKS: usize = 32;
        let service = Arc::new(test_service());
        let barrier = Arc::new(Barrier::new(TASKS));
        let mut handles = vec![];

        for _ in 0..TASKS {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                service
                    .shorten(ShortenParams::new("https://example.com/shared"))
                    .await
                    .unwrap()
            }));
        }

        let mut codes = vec![];
        for handle in handles {
            codes.push(handle.await.unwrap());
        }

        assert!(codes.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(service.repository().len(), 1);
        assert_eq!(
            service
                .repository()
                .find_by_long_url("https://example.com/shared")
                .await
                .unwrap(),
            Some(codes[0].clone())
        );
    }
}
