//! URL shortener service implementation.
//!
//! This crate wires a [`Repository`](snip_core::Repository) and a
//! [`Generator`](snip_generator::Generator) into the
//! [`Shortener`](snip_core::Shortener) contract. Core types are re-exported
//! from `snip_core`.

pub mod service;
pub mod validate;

pub use service::ShortenerService;
pub use snip_core::{ShortCode, ShortenParams, Shortener, ShortenerError};
