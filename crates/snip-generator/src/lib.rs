//! Short code generation.
//!
//! [`Generator`] produces candidate codes; [`generate_unique`] pairs a
//! generator with an existence check against the store and bounds the
//! number of collisions it tolerates.

pub mod error;
pub mod random;

pub use error::GeneratorError;
pub use random::{RandomGenerator, RandomGeneratorSettings};

use snip_core::{ShortCode, ShortenerError, StorageError};
use std::future::Future;
use tracing::{trace, warn};

/// How many colliding candidates are tolerated before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<ShortCode>;

    /// Produces a fresh candidate code. Uniqueness is not guaranteed.
    fn generate(&self) -> Self::Output;
}

/// Candidate budget shared by every collision within one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptBudget {
    max: u32,
    used: u32,
}

impl AttemptBudget {
    pub fn new(max: u32) -> Self {
        Self { max, used: 0 }
    }

    /// Candidates drawn so far.
    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn is_spent(&self) -> bool {
        self.used >= self.max
    }

    fn take(&mut self) -> Option<u32> {
        if self.is_spent() {
            return None;
        }
        self.used += 1;
        Some(self.used)
    }

    pub fn exhausted(&self) -> ShortenerError {
        ShortenerError::GenerationExhausted {
            attempts: self.used,
        }
    }
}

/// Draws candidates from `generator` until `exists` reports one as free.
///
/// Fails with [`ShortenerError::GenerationExhausted`] after `max_attempts`
/// collisions. Errors from `exists` are returned immediately without retry.
pub async fn generate_unique<G, F, Fut>(
    generator: &G,
    max_attempts: u32,
    exists: F,
) -> Result<ShortCode, ShortenerError>
where
    G: Generator,
    F: FnMut(ShortCode) -> Fut,
    Fut: Future<Output = Result<bool, StorageError>>,
{
    let mut budget = AttemptBudget::new(max_attempts);
    generate_within(generator, &mut budget, exists).await
}

/// Like [`generate_unique`], but charges every candidate to `budget`.
///
/// Callers that can still lose a candidate after the existence check (e.g.
/// to a concurrent insert) pass the same budget back in, so a request never
/// draws more than the budget allows in total.
pub async fn generate_within<G, F, Fut>(
    generator: &G,
    budget: &mut AttemptBudget,
    mut exists: F,
) -> Result<ShortCode, ShortenerError>
where
    G: Generator,
    F: FnMut(ShortCode) -> Fut,
    Fut: Future<Output = Result<bool, StorageError>>,
{
    while let Some(attempt) = budget.take() {
        let candidate: ShortCode = generator.generate().into();
        if !exists(candidate.clone()).await? {
            trace!(code = %candidate, attempt, "generated free short code");
            return Ok(candidate);
        }
        warn!(code = %candidate, attempt, "generated short code collides, retrying");
    }

    Err(budget.exhausted())
}
