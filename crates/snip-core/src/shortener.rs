use crate::shortcode::ShortCode;
use async_trait::async_trait;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub long_url: String,
    /// Optional custom alias for the shortened URL.
    pub custom_alias: Option<ShortCode>,
}

impl ShortenParams {
    /// Parameters for a generated code.
    pub fn new(long_url: impl Into<String>) -> Self {
        Self {
            long_url: long_url.into(),
            custom_alias: None,
        }
    }

    /// Requests `alias` instead of a generated code.
    pub fn with_alias(mut self, alias: ShortCode) -> Self {
        self.custom_alias = Some(alias);
        self
    }
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates a shortened URL and returns its short code.
    ///
    /// Shortening the same URL again without an alias returns the same code.
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode>;

    /// Resolves a short code to its original URL.
    ///
    /// Fails with [`ShortenerError::CodeNotFound`](crate::ShortenerError::CodeNotFound)
    /// when the code was never issued.
    async fn resolve(&self, code: &ShortCode) -> Result<String>;

    /// Checks that the underlying store is reachable.
    async fn ready(&self) -> Result<()>;
}
