//! Core types and traits for the snip URL shortener.
//!
//! This crate provides the shared vocabulary used by the generator, the
//! storage backends, the shortening service and the HTTP gateway.

pub mod base62;
pub mod error;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use base62::ShortCodeBase62;
pub use error::{ShortenerError, StorageError};
pub use repository::{InsertOutcome, ReadRepository, Repository, UrlRecord};
pub use shortcode::ShortCode;
pub use shortener::{ShortenParams, Shortener};
